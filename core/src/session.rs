//! An editing session: the edit context plus everything that outlives a
//! single operator call (redo record, attached manipulators, reports).

use crate::geometry::Tessellation;
use crate::manipulator::{DrawList, GizmoGroupType, GizmoMap, SpinHandle, TargetValue};
use crate::mesh::{EditMesh, MeshResult};
use crate::operators::{
    self, CursorEvent, OperatorError, OperatorHistory, OperatorKind, OperatorProperties, OperatorResult,
    OperatorStatus, PropertyValue,
};
use crate::report::Reports;
use crate::scene::{EditContext, EditObject};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    pub context: EditContext,
    pub history: OperatorHistory,
    pub gizmos: GizmoMap,
    pub reports: Reports,
}

impl EditSession {
    pub fn new(context: EditContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// Start editing `object`. Forgets the redo record and its manipulators.
    pub fn set_object(&mut self, object: EditObject) {
        self.context.object = Some(object);
        self.history.clear();
        self.gizmos.clear();
    }

    /// Change the edit mesh outside of any operator, e.g. a selection click.
    /// The last operator can no longer be redone on top of this.
    pub fn modify_mesh<F>(&mut self, f: F) -> OperatorResult<()>
    where
        F: FnOnce(&mut EditMesh) -> MeshResult<()>,
    {
        let object = self.context.object.as_mut().ok_or(OperatorError::NoEditMesh)?;
        f(&mut object.edit_mesh)?;
        self.history.clear();
        self.refresh_gizmos()
    }

    /// Run `kind` interactively. A spin that finishes attaches its
    /// manipulators when the view shows gizmos.
    pub fn invoke(
        &mut self,
        kind: OperatorKind,
        mut props: OperatorProperties,
        event: Option<&CursorEvent>,
    ) -> OperatorResult<OperatorStatus> {
        let pre_state = self.context.edit_mesh().cloned();
        let status = operators::invoke(kind, &mut self.context, &mut props, event, &mut self.reports);
        self.register(kind, props, pre_state, status);

        let show_gizmos = self.context.view.as_ref().map(|v| v.show_gizmos).unwrap_or(false);
        if status == OperatorStatus::Finished && kind == OperatorKind::Spin && show_gizmos {
            self.gizmos.ensure(GizmoGroupType::Spin, &self.history);
        }
        self.refresh_gizmos()?;
        Ok(status)
    }

    /// Run `kind` from its properties alone.
    pub fn exec(&mut self, kind: OperatorKind, mut props: OperatorProperties) -> OperatorResult<OperatorStatus> {
        let pre_state = self.context.edit_mesh().cloned();
        let status = operators::exec(kind, &mut self.context, &mut props, &mut self.reports);
        self.register(kind, props, pre_state, status);
        self.refresh_gizmos()?;
        Ok(status)
    }

    fn register(
        &mut self,
        kind: OperatorKind,
        props: OperatorProperties,
        pre_state: Option<EditMesh>,
        status: OperatorStatus,
    ) {
        if status != OperatorStatus::Finished {
            return;
        }
        if let Some(pre_state) = pre_state {
            self.history.push(kind, props, pre_state);
        }
    }

    pub fn redo_last(&mut self) -> OperatorResult<OperatorStatus> {
        let status = self.history.redo_last(&mut self.context, &mut self.reports)?;
        self.refresh_gizmos()?;
        Ok(status)
    }

    /// Edit properties of the last operator and redo it.
    pub fn redo_with(&mut self, values: &BTreeMap<String, PropertyValue>) -> OperatorResult<OperatorStatus> {
        let props = self.history.last_properties_mut().ok_or(OperatorError::NothingToRedo)?;
        let mut edited = props.clone();
        edited.apply(values)?;
        *props = edited;
        self.redo_last()
    }

    pub fn refresh_gizmos(&mut self) -> OperatorResult<()> {
        self.gizmos.refresh(&self.history, self.context.view.as_ref())
    }

    pub fn gizmo_get(&self, handle: SpinHandle) -> OperatorResult<TargetValue> {
        let group = self.gizmos.spin_group().ok_or(OperatorError::NoManipulator)?;
        let record = self
            .history
            .last()
            .filter(|r| r.id == group.record_id)
            .ok_or(OperatorError::NoManipulator)?;
        group.target_get(handle, &record.properties)
    }

    /// Drag `handle` to `value`: write it through the handle's binding and
    /// redo the spin. The first set of a drag snapshots the handle.
    pub fn gizmo_set(&mut self, handle: SpinHandle, value: &TargetValue) -> OperatorResult<OperatorStatus> {
        let group = self.gizmos.spin_group_mut().ok_or(OperatorError::NoManipulator)?;
        if !self.history.is_last(group.record_id) {
            return Err(OperatorError::NoManipulator);
        }
        let gizmo = group.gizmo_mut(handle);
        if gizmo.interaction.is_none() {
            gizmo.begin_interaction();
        }

        let props = self.history.last_properties_mut().ok_or(OperatorError::NothingToRedo)?;
        group.target_set(handle, props, value)?;
        self.redo_last()
    }

    /// End a drag started by [`Self::gizmo_set`].
    pub fn gizmo_release(&mut self, handle: SpinHandle) -> OperatorResult<()> {
        let group = self.gizmos.spin_group_mut().ok_or(OperatorError::NoManipulator)?;
        group.gizmo_mut(handle).end_interaction();
        debug!(?handle, "gizmo released");
        Ok(())
    }

    pub fn draw_gizmos(&self) -> DrawList {
        let mut list = DrawList::new();
        self.gizmos.draw(&mut list);
        list
    }

    pub fn tessellate(&self) -> Option<Tessellation> {
        self.context
            .object
            .as_ref()
            .map(|ob| Tessellation::from_mesh(&ob.edit_mesh.mesh, &ob.transform))
    }
}
