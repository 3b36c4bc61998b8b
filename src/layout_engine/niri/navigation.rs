use super::{NiriLayoutEngine, NodeId, ViewportState};
use crate::common::config::GapSettings;
use crate::layout_engine::graph::{Direction, Orientation};
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::window::WindowHandle;

impl NiriLayoutEngine {
    /// Moves the selection one step. Left and right land on the remembered
    /// tile of the neighbouring column. Returns the new selection, or None
    /// at the edge of the strip.
    pub fn focus(
        &mut self,
        ws: VirtualWorkspaceId,
        direction: Direction,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> Option<NodeId> {
        let selected = state.selected.filter(|&n| self.is_window(n) && self.in_workspace(ws, n))?;
        let column = self.column_of(selected)?;
        let target = match direction.orientation() {
            Orientation::Horizontal => {
                let index = self.column_index(ws, column)?.checked_add_signed(direction.step())?;
                let neighbour = *self.columns(ws).get(index)?;
                self.active_tile(neighbour)?
            }
            Orientation::Vertical => {
                let windows = self.column_windows(column);
                let index = windows.iter().position(|&w| w == selected)?;
                *windows.get(index.checked_add_signed(direction.step())?)?
            }
        };
        self.select(ws, target, state, gaps);
        Some(target)
    }

    pub fn focus_column_first(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> Option<NodeId> {
        let target = self.active_tile(*self.columns(ws).first()?)?;
        self.select(ws, target, state, gaps);
        Some(target)
    }

    pub fn focus_column_last(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> Option<NodeId> {
        let target = self.active_tile(*self.columns(ws).last()?)?;
        self.select(ws, target, state, gaps);
        Some(target)
    }

    /// Selects the window with `handle`. False if it is not on `ws`.
    pub fn select_window(
        &mut self,
        ws: VirtualWorkspaceId,
        handle: WindowHandle,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        match self.node_for_handle(handle).filter(|&n| self.in_workspace(ws, n)) {
            Some(node) => {
                self.select(ws, node, state, gaps);
                true
            }
            None => false,
        }
    }

    fn select(
        &mut self,
        ws: VirtualWorkspaceId,
        node: NodeId,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) {
        self.remember_active_tile(node);
        state.selected = Some(node);
        if let Some(index) = self.column_index(ws, node) {
            self.rebase_active_column(ws, state, gaps, index);
        }
    }
}
