//! The set of manipulator groups attached to a view.
//!
//! Groups are added on demand by the operator that wants them and checked
//! every refresh; a group whose poll says [`Liveness::Detach`] is removed.

use super::draw::{draw_gizmo, DrawBackend};
use super::spin_group::SpinGizmoGroup;
use super::Gizmo;
use crate::geometry::ViewState;
use crate::operators::{OperatorHistory, OperatorResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of a group's per-redraw poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liveness {
    Keep,
    /// Still applicable, but to a newer operator record.
    Rebind,
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GizmoGroupType {
    Spin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GizmoGroup {
    Spin(SpinGizmoGroup),
}

impl GizmoGroup {
    pub fn group_type(&self) -> GizmoGroupType {
        match self {
            GizmoGroup::Spin(_) => GizmoGroupType::Spin,
        }
    }

    fn poll(&self, history: &OperatorHistory) -> Liveness {
        match self {
            GizmoGroup::Spin(group) => group.poll(history),
        }
    }

    fn draw_prepare(&mut self, history: &OperatorHistory, view: Option<&ViewState>) -> OperatorResult<()> {
        match self {
            GizmoGroup::Spin(group) => group.draw_prepare(history, view),
        }
    }

    pub fn gizmos(&self) -> &[Gizmo] {
        match self {
            GizmoGroup::Spin(group) => &group.gizmos,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GizmoMap {
    pub groups: Vec<GizmoGroup>,
}

impl GizmoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a group of type `ty` unless one is already attached or its
    /// poll fails. Returns whether a group of that type is attached.
    pub fn ensure(&mut self, ty: GizmoGroupType, history: &OperatorHistory) -> bool {
        if self.groups.iter().any(|g| g.group_type() == ty) {
            return true;
        }
        let group = match ty {
            GizmoGroupType::Spin => {
                match history.last().filter(|_| SpinGizmoGroup::poll_type(history)) {
                    Some(record) => GizmoGroup::Spin(SpinGizmoGroup::setup(record)),
                    None => return false,
                }
            }
        };
        debug!(?ty, "gizmo group attached");
        self.groups.push(group);
        true
    }

    /// Poll every group, dropping the dead ones, and re-sync the rest.
    pub fn refresh(&mut self, history: &OperatorHistory, view: Option<&ViewState>) -> OperatorResult<()> {
        self.groups.retain(|group| {
            let liveness = group.poll(history);
            if liveness == Liveness::Detach {
                debug!(ty = ?group.group_type(), "gizmo group detached");
            }
            liveness != Liveness::Detach
        });
        for group in &mut self.groups {
            group.draw_prepare(history, view)?;
        }
        Ok(())
    }

    pub fn spin_group(&self) -> Option<&SpinGizmoGroup> {
        self.groups.iter().find_map(|g| match g {
            GizmoGroup::Spin(group) => Some(group),
        })
    }

    pub fn spin_group_mut(&mut self) -> Option<&mut SpinGizmoGroup> {
        self.groups.iter_mut().find_map(|g| match g {
            GizmoGroup::Spin(group) => Some(group),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn draw(&self, backend: &mut dyn DrawBackend) {
        for gizmo in self.groups.iter().flat_map(|g| g.gizmos()) {
            draw_gizmo(backend, gizmo);
        }
    }
}
