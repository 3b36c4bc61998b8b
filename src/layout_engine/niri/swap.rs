use tracing::debug;

use super::{NiriLayoutEngine, NodeId, ViewportState};
use crate::common::config::GapSettings;
use crate::layout_engine::graph::{Direction, Orientation};
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::geometry::Rect;

impl NiriLayoutEngine {
    /// Swaps `node` with its neighbour. Across columns the whole columns
    /// trade places along with their widths, so each width stays at its
    /// position in the strip.
    pub fn swap_window(
        &mut self,
        ws: VirtualWorkspaceId,
        node: NodeId,
        direction: Direction,
        state: &mut ViewportState,
        working_frame: Rect,
        gaps: &GapSettings,
    ) -> bool {
        if !self.is_window(node) || !self.in_workspace(ws, node) {
            return false;
        }
        state.working_width = working_frame.size.width;
        let Some(column) = self.column_of(node) else {
            return false;
        };
        let swapped = match direction.orientation() {
            Orientation::Horizontal => self.swap_columns(ws, column, direction, state, gaps),
            Orientation::Vertical => self.swap_in_column(column, node, direction),
        };
        if !swapped {
            return false;
        }
        debug!(?node, %direction, "swapped window");
        self.ensure_selection_visible(ws, node, state, working_frame, gaps, false);
        true
    }

    fn swap_columns(
        &mut self,
        ws: VirtualWorkspaceId,
        column: NodeId,
        direction: Direction,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        let Some(index) = self.column_index(ws, column) else {
            return false;
        };
        let Some(other_index) = index.checked_add_signed(direction.step()) else {
            return false;
        };
        let Some(&other) = self.columns(ws).get(other_index) else {
            return false;
        };
        self.restructure(ws, state, gaps, |this, _| {
            if let Some(root) = this.roots.get(&ws).copied() {
                this.nodes[root].children.swap(index, other_index);
            }
            let (Some(mut a), Some(mut b)) =
                (this.column_data(column).cloned(), this.column_data(other).cloned())
            else {
                return;
            };
            a.swap_presentation(&mut b);
            if let Some(data) = this.column_data_mut(column) {
                *data = a;
            }
            if let Some(data) = this.column_data_mut(other) {
                *data = b;
            }
        });
        true
    }

    fn swap_in_column(&mut self, column: NodeId, node: NodeId, direction: Direction) -> bool {
        let windows = self.column_windows(column);
        let Some(index) = windows.iter().position(|&w| w == node) else {
            return false;
        };
        let Some(other) = index.checked_add_signed(direction.step()).filter(|&i| i < windows.len())
        else {
            return false;
        };
        self.nodes[column].children.swap(index, other);
        if let Some(data) = self.column_data_mut(column) {
            if data.active_tile_idx == index {
                data.active_tile_idx = other;
            } else if data.active_tile_idx == other {
                data.active_tile_idx = index;
            }
        }
        true
    }
}
