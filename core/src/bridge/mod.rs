//! Mesh operator bridge.
//!
//! Topological operations are invoked by name with a bag of typed input
//! slots and report their results through named output slots. The usual
//! sequence mirrors a transaction:
//!
//! 1. [`BMOperator::init`] snapshots the mesh,
//! 2. input slots are filled with [`BMOperator::set`],
//! 3. [`BMOperator::exec`] runs the operation (a failure is stored, not returned),
//! 4. callers read output slots and adjust selection,
//! 5. [`BMOperator::finish`] commits, or restores the snapshot and returns the error.

mod extrude;
mod spin;
mod transform;

#[cfg(test)]
mod tests_extrude;
#[cfg(test)]
mod tests_spin;

use crate::geometry::{Matrix3, Matrix4, Vector3};
use crate::mesh::{ElemFlag, ElemMask, ElemRef, EdgeId, FaceId, Mesh, MeshError, VertId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Operator '{op}' has no slot '{slot}'")]
    UnknownSlot { op: OpName, slot: String },

    #[error("Slot '{slot}' of '{op}' expects {expected:?}")]
    SlotType { op: OpName, slot: String, expected: SlotKind },

    #[error("Operator '{op}' has not produced slot '{slot}'")]
    MissingOutput { op: OpName, slot: String },

    #[error("Degenerate input: {0}")]
    Degenerate(String),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Names of the operators the bridge can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpName {
    ExtrudeFaceRegion,
    ExtrudeVertIndiv,
    ExtrudeEdgeOnly,
    ExtrudeDiscreteFaces,
    Spin,
    Translate,
    Rotate,
    CreateVert,
    Duplicate,
}

const EXTRUDE_FACE_REGION_SLOTS: &[SlotDef] = &[
    SlotDef::new("geom", SlotKind::Elements),
    SlotDef::new("edges_exclude", SlotKind::ElementSet),
    SlotDef::new("use_select_history", SlotKind::Bool),
];

const EXTRUDE_VERT_INDIV_SLOTS: &[SlotDef] = &[
    SlotDef::new("verts", SlotKind::Elements),
    SlotDef::new("use_select_history", SlotKind::Bool),
];

const EXTRUDE_EDGE_ONLY_SLOTS: &[SlotDef] = &[
    SlotDef::new("edges", SlotKind::Elements),
    SlotDef::new("use_select_history", SlotKind::Bool),
];

const EXTRUDE_DISCRETE_FACES_SLOTS: &[SlotDef] = &[
    SlotDef::new("faces", SlotKind::Elements),
    SlotDef::new("use_select_history", SlotKind::Bool),
];

const SPIN_SLOTS: &[SlotDef] = &[
    SlotDef::new("geom", SlotKind::Elements),
    SlotDef::new("cent", SlotKind::Vector),
    SlotDef::new("axis", SlotKind::Vector),
    SlotDef::new("dvec", SlotKind::Vector),
    SlotDef::new("steps", SlotKind::Int),
    SlotDef::new("angle", SlotKind::Float),
    SlotDef::new("space", SlotKind::Matrix4),
    SlotDef::new("use_duplicate", SlotKind::Bool),
];

const TRANSLATE_SLOTS: &[SlotDef] = &[
    SlotDef::new("vec", SlotKind::Vector),
    SlotDef::new("verts", SlotKind::Elements),
    SlotDef::new("space", SlotKind::Matrix4),
];

const ROTATE_SLOTS: &[SlotDef] = &[
    SlotDef::new("cent", SlotKind::Vector),
    SlotDef::new("matrix", SlotKind::Matrix3),
    SlotDef::new("verts", SlotKind::Elements),
    SlotDef::new("space", SlotKind::Matrix4),
];

const CREATE_VERT_SLOTS: &[SlotDef] = &[SlotDef::new("co", SlotKind::Vector)];

const DUPLICATE_SLOTS: &[SlotDef] = &[
    SlotDef::new("geom", SlotKind::Elements),
    SlotDef::new("use_select_history", SlotKind::Bool),
];

impl OpName {
    pub const ALL: [OpName; 9] = [
        OpName::ExtrudeFaceRegion,
        OpName::ExtrudeVertIndiv,
        OpName::ExtrudeEdgeOnly,
        OpName::ExtrudeDiscreteFaces,
        OpName::Spin,
        OpName::Translate,
        OpName::Rotate,
        OpName::CreateVert,
        OpName::Duplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpName::ExtrudeFaceRegion => "extrude_face_region",
            OpName::ExtrudeVertIndiv => "extrude_vert_indiv",
            OpName::ExtrudeEdgeOnly => "extrude_edge_only",
            OpName::ExtrudeDiscreteFaces => "extrude_discrete_faces",
            OpName::Spin => "spin",
            OpName::Translate => "translate",
            OpName::Rotate => "rotate",
            OpName::CreateVert => "create_vert",
            OpName::Duplicate => "duplicate",
        }
    }

    pub fn from_name(name: &str) -> BridgeResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| BridgeError::UnknownOperator(name.to_string()))
    }

    /// Input slots accepted by the operator.
    pub fn slots_in(&self) -> &'static [SlotDef] {
        match self {
            OpName::ExtrudeFaceRegion => EXTRUDE_FACE_REGION_SLOTS,
            OpName::ExtrudeVertIndiv => EXTRUDE_VERT_INDIV_SLOTS,
            OpName::ExtrudeEdgeOnly => EXTRUDE_EDGE_ONLY_SLOTS,
            OpName::ExtrudeDiscreteFaces => EXTRUDE_DISCRETE_FACES_SLOTS,
            OpName::Spin => SPIN_SLOTS,
            OpName::Translate => TRANSLATE_SLOTS,
            OpName::Rotate => ROTATE_SLOTS,
            OpName::CreateVert => CREATE_VERT_SLOTS,
            OpName::Duplicate => DUPLICATE_SLOTS,
        }
    }
}

impl fmt::Display for OpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Bool,
    Int,
    Float,
    Vector,
    Matrix3,
    Matrix4,
    /// Ordered element buffer.
    Elements,
    /// Unordered element set (a map with empty values).
    ElementSet,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotDef {
    pub name: &'static str,
    pub kind: SlotKind,
}

impl SlotDef {
    const fn new(name: &'static str, kind: SlotKind) -> Self {
        Self { name, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vector(Vector3),
    Matrix3(Matrix3),
    Matrix4(Matrix4),
    Elements(Vec<ElemRef>),
    ElementSet(BTreeSet<ElemRef>),
}

impl SlotValue {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotValue::Bool(_) => SlotKind::Bool,
            SlotValue::Int(_) => SlotKind::Int,
            SlotValue::Float(_) => SlotKind::Float,
            SlotValue::Vector(_) => SlotKind::Vector,
            SlotValue::Matrix3(_) => SlotKind::Matrix3,
            SlotValue::Matrix4(_) => SlotKind::Matrix4,
            SlotValue::Elements(_) => SlotKind::Elements,
            SlotValue::ElementSet(_) => SlotKind::ElementSet,
        }
    }

    /// Elements of the mesh carrying `flag`, filtered by kind.
    pub fn from_flag(mesh: &Mesh, mask: ElemMask, flag: ElemFlag) -> Self {
        SlotValue::Elements(mesh.elements_with_flag(mask, flag))
    }
}

/// A single invocation of a named mesh operator.
#[derive(Debug)]
pub struct BMOperator {
    name: OpName,
    slots_in: HashMap<&'static str, SlotValue>,
    slots_out: HashMap<&'static str, Vec<ElemRef>>,
    snapshot: Option<Mesh>,
    error: Option<BridgeError>,
}

impl BMOperator {
    /// Start a transaction: the mesh is snapshotted so `finish` can roll back.
    pub fn init(mesh: &Mesh, name: OpName) -> Self {
        Self {
            snapshot: Some(mesh.clone()),
            ..Self::new(name)
        }
    }

    /// An operator without a rollback snapshot, for use inside other operators.
    pub fn new(name: OpName) -> Self {
        Self {
            name,
            slots_in: HashMap::new(),
            slots_out: HashMap::new(),
            snapshot: None,
            error: None,
        }
    }

    pub fn name(&self) -> OpName {
        self.name
    }

    pub fn set(&mut self, slot: &str, value: SlotValue) -> BridgeResult<()> {
        let def = self
            .name
            .slots_in()
            .iter()
            .find(|d| d.name == slot)
            .ok_or_else(|| BridgeError::UnknownSlot {
                op: self.name,
                slot: slot.to_string(),
            })?;
        if def.kind != value.kind() {
            return Err(BridgeError::SlotType {
                op: self.name,
                slot: slot.to_string(),
                expected: def.kind,
            });
        }
        self.slots_in.insert(def.name, value);
        Ok(())
    }

    pub fn with(mut self, slot: &str, value: SlotValue) -> BridgeResult<Self> {
        self.set(slot, value)?;
        Ok(self)
    }

    /// Insert into an element-set slot, creating it when empty.
    pub fn set_insert(&mut self, slot: &str, elem: ElemRef) -> BridgeResult<()> {
        if !self.slots_in.contains_key(slot) {
            self.set(slot, SlotValue::ElementSet(BTreeSet::new()))?;
        }
        match self.slots_in.get_mut(slot) {
            Some(SlotValue::ElementSet(set)) => {
                set.insert(elem);
                Ok(())
            }
            _ => Err(BridgeError::SlotType {
                op: self.name,
                slot: slot.to_string(),
                expected: SlotKind::ElementSet,
            }),
        }
    }

    /// Run the operation. Failures are kept until `finish`.
    pub fn exec(&mut self, mesh: &mut Mesh) {
        if self.error.is_some() {
            return;
        }
        let result = match self.name {
            OpName::ExtrudeFaceRegion => extrude::extrude_face_region(mesh, self),
            OpName::ExtrudeVertIndiv => extrude::extrude_vert_indiv(mesh, self),
            OpName::ExtrudeEdgeOnly => extrude::extrude_edge_only(mesh, self),
            OpName::ExtrudeDiscreteFaces => extrude::extrude_discrete_faces(mesh, self),
            OpName::Spin => spin::spin(mesh, self),
            OpName::Translate => transform::translate(mesh, self),
            OpName::Rotate => transform::rotate(mesh, self),
            OpName::CreateVert => transform::create_vert(mesh, self),
            OpName::Duplicate => transform::duplicate(mesh, self),
        };
        if let Err(err) = result {
            debug!(op = %self.name, %err, "bridge operator failed");
            self.error = Some(err);
        }
    }

    /// Run as a step of another operator, surfacing the failure immediately.
    fn exec_nested(&mut self, mesh: &mut Mesh) -> BridgeResult<()> {
        self.exec(mesh);
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Commit, or restore the mesh to its `init` state and return the failure.
    pub fn finish(self, mesh: &mut Mesh) -> BridgeResult<()> {
        match self.error {
            None => Ok(()),
            Some(err) => {
                if let Some(snapshot) = self.snapshot {
                    *mesh = snapshot;
                }
                Err(err)
            }
        }
    }

    /// Output slot contents; empty when the operation failed.
    pub fn output(&self, slot: &str) -> BridgeResult<&[ElemRef]> {
        if self.error.is_some() {
            return Ok(&[]);
        }
        self.slots_out
            .get(slot)
            .map(Vec::as_slice)
            .ok_or_else(|| BridgeError::MissingOutput {
                op: self.name,
                slot: slot.to_string(),
            })
    }

    /// Output elements whose kind is in `mask`.
    pub fn output_filtered(&self, slot: &str, mask: ElemMask) -> BridgeResult<Vec<ElemRef>> {
        Ok(self
            .output(slot)?
            .iter()
            .copied()
            .filter(|e| mask.contains(e.kind()))
            .collect())
    }

    fn set_output(&mut self, slot: &'static str, elems: Vec<ElemRef>) {
        self.slots_out.insert(slot, elems);
    }

    // Typed input accessors. Unset slots read as zero values.

    fn bool_in(&self, slot: &str) -> bool {
        matches!(self.slots_in.get(slot), Some(SlotValue::Bool(true)))
    }

    fn int_in(&self, slot: &str) -> i64 {
        match self.slots_in.get(slot) {
            Some(SlotValue::Int(v)) => *v,
            _ => 0,
        }
    }

    fn float_in(&self, slot: &str) -> f64 {
        match self.slots_in.get(slot) {
            Some(SlotValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    fn vector_in(&self, slot: &str) -> Vector3 {
        match self.slots_in.get(slot) {
            Some(SlotValue::Vector(v)) => *v,
            _ => Vector3::zeros(),
        }
    }

    fn matrix3_in(&self, slot: &str) -> Matrix3 {
        match self.slots_in.get(slot) {
            Some(SlotValue::Matrix3(m)) => *m,
            _ => Matrix3::identity(),
        }
    }

    fn matrix4_in(&self, slot: &str) -> Option<Matrix4> {
        match self.slots_in.get(slot) {
            Some(SlotValue::Matrix4(m)) => Some(*m),
            _ => None,
        }
    }

    fn elements_in(&self, slot: &str) -> Vec<ElemRef> {
        match self.slots_in.get(slot) {
            Some(SlotValue::Elements(elems)) => elems.clone(),
            Some(SlotValue::ElementSet(set)) => set.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    fn element_set_in(&self, slot: &str) -> BTreeSet<ElemRef> {
        self.elements_in(slot).into_iter().collect()
    }
}

/// Build, run and finish an operator in one go, returning it for output queries.
///
/// On failure the mesh is rolled back before the error is returned.
pub fn call(mesh: &mut Mesh, name: OpName, slots: Vec<(&str, SlotValue)>) -> BridgeResult<BMOperator> {
    let mut op = BMOperator::init(mesh, name);
    for (slot, value) in slots {
        op.set(slot, value)?;
    }
    op.exec(mesh);
    if let Some(err) = op.error.take() {
        if let Some(snapshot) = op.snapshot.take() {
            *mesh = snapshot;
        }
        return Err(err);
    }
    op.snapshot = None;
    Ok(op)
}

/// Split an element list into vertices, edges and faces.
pub(crate) fn split_elements(elems: &[ElemRef]) -> (BTreeSet<VertId>, BTreeSet<EdgeId>, BTreeSet<FaceId>) {
    let mut verts = BTreeSet::new();
    let mut edges = BTreeSet::new();
    let mut faces = BTreeSet::new();
    for elem in elems {
        match *elem {
            ElemRef::Vert(v) => {
                verts.insert(v);
            }
            ElemRef::Edge(e) => {
                edges.insert(e);
            }
            ElemRef::Face(f) => {
                faces.insert(f);
            }
        }
    }
    (verts, edges, faces)
}
