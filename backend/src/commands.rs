//! Text protocol spoken over the websocket.
//!
//! Requests are `VERB` or `VERB:payload` with a JSON payload. Every request
//! yields zero or more `KIND:json` response lines.

use editmesh_core::geometry::{Point3, ViewState};
use editmesh_core::manipulator::{SpinHandle, TargetValue};
use editmesh_core::mesh::primitives::Primitive;
use editmesh_core::mesh::{EdgeId, EditMesh, ElemRef, FaceId, SelectMode, VertId};
use editmesh_core::operators::{CursorEvent, OperatorError, OperatorKind, PropertyValue};
use editmesh_core::scene::EditObject;
use editmesh_core::EditSession;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Format an error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

#[derive(Debug, Deserialize)]
struct AddPrimitiveCmd {
    #[serde(default = "default_name")]
    name: String,
    primitive: Primitive,
}

fn default_name() -> String {
    "Mesh".to_string()
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum ElemKind {
    Vert,
    Edge,
    Face,
}

#[derive(Debug, Deserialize)]
struct SelectCmd {
    kind: ElemKind,
    index: u32,
    #[serde(default)]
    extend: bool,
}

impl SelectCmd {
    fn elem(&self) -> ElemRef {
        match self.kind {
            ElemKind::Vert => ElemRef::Vert(VertId(self.index)),
            ElemKind::Edge => ElemRef::Edge(EdgeId(self.index)),
            ElemKind::Face => ElemRef::Face(FaceId(self.index)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OperatorCmd {
    idname: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
    mval: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct RedoCmd {
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Deserialize)]
struct GizmoSetCmd {
    handle: SpinHandle,
    value: TargetValue,
    /// Ends the drag after this value.
    #[serde(default)]
    release: bool,
}

fn mesh_update(session: &EditSession) -> String {
    let json = serde_json::to_string(&session.tessellate()).unwrap_or("null".into());
    format!("MESH_UPDATE:{}", json)
}

fn gizmo_update(session: &EditSession) -> String {
    let json = json!({
        "groups": session.gizmos.groups,
        "draw": session.draw_gizmos(),
    });
    format!("GIZMO_UPDATE:{}", json)
}

fn parse<'a, T: Deserialize<'a>>(payload: &'a str) -> Result<T, String> {
    serde_json::from_str(payload).map_err(|e| format_error("BAD_PAYLOAD", &e.to_string(), "error"))
}

fn operator_error(err: &OperatorError) -> String {
    format_error("OPERATOR_ERROR", &err.to_string(), "error")
}

/// Run one request against the session and collect the responses.
pub fn handle_command(session: &mut EditSession, text: &str) -> Vec<String> {
    let (verb, payload) = text.split_once(':').unwrap_or((text, ""));
    let mut out = match dispatch(session, verb, payload) {
        Ok(()) => vec![mesh_update(session), gizmo_update(session)],
        Err(msg) => vec![msg],
    };

    if !session.reports.is_empty() {
        let json = serde_json::to_string(&session.reports.items).unwrap_or("[]".into());
        out.push(format!("REPORT_UPDATE:{}", json));
        session.reports.clear();
    }
    out
}

fn dispatch(session: &mut EditSession, verb: &str, payload: &str) -> Result<(), String> {
    match verb {
        "ADD_PRIMITIVE" => {
            let cmd: AddPrimitiveCmd = parse(payload)?;
            let mut mesh = cmd
                .primitive
                .build()
                .map_err(|e| format_error("PRIMITIVE_FAILED", &e.to_string(), "error"))?;
            mesh.select_all();
            info!("Added primitive {:?} as '{}'", cmd.primitive, cmd.name);
            session.set_object(EditObject::new(&cmd.name, EditMesh::new(mesh, SelectMode::Vertex)));
            Ok(())
        }
        "SELECT_MODE" => {
            let mode: SelectMode = parse(&format!("\"{}\"", payload))?;
            session
                .modify_mesh(|em| {
                    // Promote what the old mode selected before switching.
                    em.mesh.select_flush(em.select_mode);
                    em.select_mode = mode;
                    Ok(())
                })
                .map_err(|e| operator_error(&e))
        }
        "SELECT_ALL" => session
            .modify_mesh(|em| {
                em.mesh.select_all();
                Ok(())
            })
            .map_err(|e| operator_error(&e)),
        "DESELECT_ALL" => session
            .modify_mesh(|em| {
                em.mesh.deselect_all();
                Ok(())
            })
            .map_err(|e| operator_error(&e)),
        "SELECT" => {
            let cmd: SelectCmd = parse(payload)?;
            let elem = cmd.elem();
            session
                .modify_mesh(|em| {
                    if !cmd.extend {
                        em.mesh.deselect_all();
                    }
                    em.mesh.elem_select_set(elem, true)?;
                    em.mesh.select_history_store(elem);
                    Ok(())
                })
                .map_err(|e| operator_error(&e))
        }
        "SET_VIEW" => {
            let view: ViewState = parse(payload)?;
            session.context.view = Some(view);
            session.refresh_gizmos().map_err(|e| operator_error(&e))
        }
        "SET_CURSOR" => {
            let co: [f64; 3] = parse(payload)?;
            session.context.cursor = Point3::from(co);
            Ok(())
        }
        "OPERATOR" => {
            let cmd: OperatorCmd = parse(payload)?;
            let kind = OperatorKind::from_idname(&cmd.idname).map_err(|e| operator_error(&e))?;
            let mut props = kind.properties();
            props.apply(&cmd.properties).map_err(|e| operator_error(&e))?;
            let event = cmd.mval.map(|mval| CursorEvent { mval });

            let status = session
                .invoke(kind, props, event.as_ref())
                .map_err(|e| operator_error(&e))?;
            info!("Operator {} -> {:?}", kind, status);
            Ok(())
        }
        "REDO" => {
            let cmd: RedoCmd = parse(payload)?;
            session
                .redo_with(&cmd.properties)
                .map(|status| info!("Redo -> {:?}", status))
                .map_err(|e| operator_error(&e))
        }
        "GIZMO_SET" => {
            let cmd: GizmoSetCmd = parse(payload)?;
            session
                .gizmo_set(cmd.handle, &cmd.value)
                .map_err(|e| operator_error(&e))?;
            if cmd.release {
                session.gizmo_release(cmd.handle).map_err(|e| operator_error(&e))?;
            }
            Ok(())
        }
        "REFRESH" => session.refresh_gizmos().map_err(|e| operator_error(&e)),
        _ => {
            warn!("Unknown command: {}", verb);
            Err(format_error("UNKNOWN_COMMAND", &format!("Unknown command: {}", verb), "warning"))
        }
    }
}
