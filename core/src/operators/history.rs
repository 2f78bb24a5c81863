//! Redo of the last operator.
//!
//! The last finished operator is kept as a record of its identity and
//! parameters, together with the edit mesh as it was before it ran. Redo
//! restores that mesh and runs the operator again, so editing a parameter
//! re-derives the result instead of patching it.

use super::{exec, OperatorError, OperatorKind, OperatorProperties, OperatorResult, OperatorStatus};
use crate::mesh::EditMesh;
use crate::report::Reports;
use crate::scene::EditContext;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct OperatorRecord {
    pub id: Uuid,
    pub kind: OperatorKind,
    pub properties: OperatorProperties,
}

#[derive(Debug, Clone)]
struct RedoEntry {
    record: OperatorRecord,
    pre_state: EditMesh,
}

#[derive(Debug, Clone, Default)]
pub struct OperatorHistory {
    last: Option<RedoEntry>,
}

impl OperatorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `kind` the redo target. Replaces any previous record.
    pub fn push(&mut self, kind: OperatorKind, properties: OperatorProperties, pre_state: EditMesh) -> Uuid {
        let id = Uuid::new_v4();
        debug!(op = kind.idname(), %id, "register operator");
        self.last = Some(RedoEntry {
            record: OperatorRecord { id, kind, properties },
            pre_state,
        });
        id
    }

    pub fn last(&self) -> Option<&OperatorRecord> {
        self.last.as_ref().map(|entry| &entry.record)
    }

    pub fn last_properties_mut(&mut self) -> Option<&mut OperatorProperties> {
        self.last.as_mut().map(|entry| &mut entry.record.properties)
    }

    /// Whether `id` is still the operator a redo would repeat.
    pub fn is_last(&self, id: Uuid) -> bool {
        self.last().map(|r| r.id == id).unwrap_or(false)
    }

    /// Restore the mesh the last operator started from and run it again
    /// with its current properties.
    pub fn redo_last(&mut self, ctx: &mut EditContext, reports: &mut Reports) -> OperatorResult<OperatorStatus> {
        let entry = self.last.as_mut().ok_or(OperatorError::NothingToRedo)?;
        let kind = entry.record.kind;
        if !kind.is_repeatable() {
            return Err(OperatorError::NotRepeatable(kind.idname()));
        }
        let object = ctx.object.as_mut().ok_or(OperatorError::NoEditMesh)?;
        object.edit_mesh = entry.pre_state.clone();

        debug!(op = kind.idname(), id = %entry.record.id, "redo");
        Ok(exec(kind, ctx, &mut entry.record.properties, reports))
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
