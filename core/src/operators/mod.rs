//! Edit-mesh operators: the command surface of the extrude and spin tools.
//!
//! Every operator has an `exec` path driven purely by its properties and,
//! for the interactive ones, an `invoke` path that fills unset properties
//! from the context (3D cursor, view axes, mouse position) first. Failures
//! are written to [`Reports`] and turn into [`OperatorStatus::Cancelled`].

pub mod extrude;
pub mod history;
pub mod properties;
pub mod snap;
pub mod spin;

#[cfg(test)]
mod tests_spin;

pub use history::{OperatorHistory, OperatorRecord};
pub use properties::{OperatorProperties, PropertyDef, PropertyValue};

use crate::bridge::BridgeError;
use crate::mesh::MeshError;
use crate::report::Reports;
use crate::scene::{EditContext, EditObject};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    #[error("No mesh in edit mode")]
    NoEditMesh,

    #[error("Operator requires a 3D view")]
    NoView,

    #[error("Operator requires a mouse event")]
    NoEvent,

    #[error("Invalid/unset axis")]
    InvalidAxis,

    #[error("You have to select a string of connected vertices too")]
    NotConnectedVertexString,

    #[error("Not a valid selection for extrude")]
    InvalidExtrudeSelection,

    #[error("Operator '{0}' cannot be repeated")]
    NotRepeatable(&'static str),

    #[error("No operator to redo")]
    NothingToRedo,

    #[error("No manipulator is attached")]
    NoManipulator,

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown property: {0}")]
    MissingProperty(String),

    #[error("Property '{name}' expects a {expected} value")]
    PropertyType { name: String, expected: &'static str },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<MeshError> for OperatorError {
    fn from(err: MeshError) -> Self {
        OperatorError::Bridge(BridgeError::Mesh(err))
    }
}

pub type OperatorResult<T> = Result<T, OperatorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorStatus {
    Finished,
    Cancelled,
}

/// Mouse position in region pixels, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorEvent {
    pub mval: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    ExtrudeRepeat,
    ExtrudeRegion,
    ExtrudeVertsIndiv,
    ExtrudeEdgesIndiv,
    ExtrudeFacesIndiv,
    DupliExtrudeCursor,
    Spin,
    Screw,
}

const EXTRUDE_REPEAT_PROPS: &[PropertyDef] = &[
    PropertyDef::float("offset", 2.0, (0.0, 1e12), (0.0, 100.0)),
    PropertyDef::int("steps", 10, (0.0, 1e6), (0.0, 180.0)),
];

const DUPLI_EXTRUDE_CURSOR_PROPS: &[PropertyDef] = &[PropertyDef::bool("rotate_source", true)];

const SPIN_PROPS: &[PropertyDef] = &[
    PropertyDef::int("steps", 9, (0.0, 1e6), (0.0, 1000.0)),
    PropertyDef::bool("dupli", false),
    PropertyDef::float("angle", FRAC_PI_2, (-1e12, 1e12), (-TAU, TAU)),
    PropertyDef::vector("center", (-1e12, 1e12), (-1e4, 1e4)),
    PropertyDef::vector("axis", (-1.0, 1.0), (-1.0, 1.0)),
];

const SCREW_PROPS: &[PropertyDef] = &[
    PropertyDef::int("steps", 9, (1.0, 1e5), (3.0, 256.0)),
    PropertyDef::int("turns", 1, (1.0, 1e5), (1.0, 256.0)),
    PropertyDef::vector("center", (-1e12, 1e12), (-1e4, 1e4)),
    PropertyDef::vector("axis", (-1.0, 1.0), (-1.0, 1.0)),
];

impl OperatorKind {
    pub const ALL: [OperatorKind; 8] = [
        OperatorKind::ExtrudeRepeat,
        OperatorKind::ExtrudeRegion,
        OperatorKind::ExtrudeVertsIndiv,
        OperatorKind::ExtrudeEdgesIndiv,
        OperatorKind::ExtrudeFacesIndiv,
        OperatorKind::DupliExtrudeCursor,
        OperatorKind::Spin,
        OperatorKind::Screw,
    ];

    pub fn idname(&self) -> &'static str {
        match self {
            OperatorKind::ExtrudeRepeat => "mesh.extrude_repeat",
            OperatorKind::ExtrudeRegion => "mesh.extrude_region",
            OperatorKind::ExtrudeVertsIndiv => "mesh.extrude_verts_indiv",
            OperatorKind::ExtrudeEdgesIndiv => "mesh.extrude_edges_indiv",
            OperatorKind::ExtrudeFacesIndiv => "mesh.extrude_faces_indiv",
            OperatorKind::DupliExtrudeCursor => "mesh.dupli_extrude_cursor",
            OperatorKind::Spin => "mesh.spin",
            OperatorKind::Screw => "mesh.screw",
        }
    }

    pub fn from_idname(idname: &str) -> OperatorResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.idname() == idname)
            .ok_or_else(|| OperatorError::UnknownOperator(idname.to_string()))
    }

    /// UI label.
    pub fn label(&self) -> &'static str {
        match self {
            OperatorKind::ExtrudeRepeat => "Extrude Repeat Mesh",
            OperatorKind::ExtrudeRegion => "Extrude Region",
            OperatorKind::ExtrudeVertsIndiv => "Extrude Only Vertices",
            OperatorKind::ExtrudeEdgesIndiv => "Extrude Only Edges",
            OperatorKind::ExtrudeFacesIndiv => "Extrude Individual Faces",
            OperatorKind::DupliExtrudeCursor => "Duplicate or Extrude to Cursor",
            OperatorKind::Spin => "Spin",
            OperatorKind::Screw => "Screw",
        }
    }

    pub fn property_defs(&self) -> &'static [PropertyDef] {
        match self {
            OperatorKind::ExtrudeRepeat => EXTRUDE_REPEAT_PROPS,
            OperatorKind::DupliExtrudeCursor => DUPLI_EXTRUDE_CURSOR_PROPS,
            OperatorKind::Spin => SPIN_PROPS,
            OperatorKind::Screw => SCREW_PROPS,
            OperatorKind::ExtrudeRegion
            | OperatorKind::ExtrudeVertsIndiv
            | OperatorKind::ExtrudeEdgesIndiv
            | OperatorKind::ExtrudeFacesIndiv => &[],
        }
    }

    /// A fresh parameter bag holding the defaults.
    pub fn properties(&self) -> OperatorProperties {
        OperatorProperties::new(self.property_defs())
    }

    pub fn needs_view(&self) -> bool {
        matches!(self, OperatorKind::ExtrudeRepeat | OperatorKind::DupliExtrudeCursor)
    }

    /// Whether the operator can run from its properties alone, which redo needs.
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, OperatorKind::DupliExtrudeCursor)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.idname())
    }
}

pub fn poll(kind: OperatorKind, ctx: &EditContext) -> OperatorResult<()> {
    if ctx.object.is_none() {
        return Err(OperatorError::NoEditMesh);
    }
    if kind.needs_view() && ctx.view.is_none() {
        return Err(OperatorError::NoView);
    }
    Ok(())
}

/// Run an operator from its properties.
pub fn exec(
    kind: OperatorKind,
    ctx: &mut EditContext,
    props: &mut OperatorProperties,
    reports: &mut Reports,
) -> OperatorStatus {
    let result = poll(kind, ctx).and_then(|_| exec_inner(kind, ctx, props));
    into_status(kind, result, reports)
}

/// Run an operator interactively, filling unset properties from the context.
pub fn invoke(
    kind: OperatorKind,
    ctx: &mut EditContext,
    props: &mut OperatorProperties,
    event: Option<&CursorEvent>,
    reports: &mut Reports,
) -> OperatorStatus {
    let result = poll(kind, ctx).and_then(|_| match kind {
        OperatorKind::Spin => spin::spin_invoke(ctx, props),
        OperatorKind::Screw => spin::screw_invoke(ctx, props),
        OperatorKind::DupliExtrudeCursor => {
            let event = event.ok_or(OperatorError::NoEvent)?;
            extrude::dupli_extrude_cursor_invoke(ctx, props, event)
        }
        _ => exec_inner(kind, ctx, props),
    });
    into_status(kind, result, reports)
}

fn exec_inner(kind: OperatorKind, ctx: &mut EditContext, props: &mut OperatorProperties) -> OperatorResult<()> {
    match kind {
        OperatorKind::ExtrudeRepeat => extrude::extrude_repeat_exec(ctx, props),
        OperatorKind::ExtrudeRegion => extrude::extrude_region_exec(ctx),
        OperatorKind::ExtrudeVertsIndiv => extrude::extrude_verts_indiv_exec(ctx),
        OperatorKind::ExtrudeEdgesIndiv => extrude::extrude_edges_indiv_exec(ctx),
        OperatorKind::ExtrudeFacesIndiv => extrude::extrude_faces_indiv_exec(ctx),
        OperatorKind::DupliExtrudeCursor => Err(OperatorError::NotRepeatable(kind.idname())),
        OperatorKind::Spin => spin::spin_exec(ctx, props),
        OperatorKind::Screw => spin::screw_exec(ctx, props),
    }
}

fn into_status(kind: OperatorKind, result: OperatorResult<()>, reports: &mut Reports) -> OperatorStatus {
    match result {
        Ok(()) => {
            info!(op = kind.idname(), "operator finished");
            OperatorStatus::Finished
        }
        Err(err) => {
            warn!(op = kind.idname(), %err, "operator cancelled");
            reports.error(err.to_string());
            OperatorStatus::Cancelled
        }
    }
}

pub(crate) fn edit_object(ctx: &mut EditContext) -> OperatorResult<&mut EditObject> {
    ctx.object.as_mut().ok_or(OperatorError::NoEditMesh)
}
