//! Pointer-driven cell selection.
//!
//! A small state machine over idle and dragging. Bounds are checked by the
//! owner before events reach it.

use crate::grid::CellPos;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Which cells a drag may add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DragPolicy {
    /// Any cell the pointer enters.
    #[default]
    Free,
    /// Only cells in the column where the drag started.
    ColumnLocked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: CellPos,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    cells: BTreeSet<CellPos>,
    drag: DragState,
    policy: DragPolicy,
}

impl Selection {
    pub fn new(policy: DragPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DragPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DragPolicy) {
        self.policy = policy;
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Start a gesture at `pos`.
    ///
    /// Without the range modifier the selection restarts at `pos` and a drag
    /// begins. With it, `pos` is toggled and no drag is started.
    pub fn pointer_down(&mut self, pos: CellPos, range_modifier: bool) {
        if range_modifier {
            self.drag = DragState::Idle;
            self.toggle(pos);
        } else {
            self.cells.clear();
            self.cells.insert(pos);
            self.drag = DragState::Dragging { anchor: pos };
        }
    }

    /// Extend an active drag. Never removes cells.
    pub fn pointer_enter(&mut self, pos: CellPos) {
        let DragState::Dragging { anchor } = self.drag else {
            return;
        };
        if self.policy == DragPolicy::ColumnLocked && pos.col != anchor.col {
            return;
        }
        self.cells.insert(pos);
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Touch input: toggle membership, whatever the modifiers.
    pub fn tap(&mut self, pos: CellPos) {
        self.toggle(pos);
    }

    pub fn toggle(&mut self, pos: CellPos) {
        if !self.cells.remove(&pos) {
            self.cells.insert(pos);
        }
    }

    /// Drop every selected cell and end any drag.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.drag = DragState::Idle;
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        self.cells.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Selected cells in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = &CellPos> {
        self.cells.iter()
    }
}
