use tracing::{debug, warn};

use super::{ColumnShift, NiriLayoutEngine, NodeId, NodeKind, ViewportState};
use crate::animation::Animation;
use crate::common::collections::HashSet;
use crate::common::config::GapSettings;
use crate::layout_engine::graph::{Direction, Orientation};
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::window::WindowHandle;

impl NiriLayoutEngine {
    /// Inserts a window after `after` (or the end of the strip), stacking it
    /// into that column while it has room and opening a new column
    /// otherwise. Leaves viewport state alone.
    pub fn add_window(
        &mut self,
        ws: VirtualWorkspaceId,
        handle: WindowHandle,
        after: Option<NodeId>,
    ) -> NodeId {
        if let Some(existing) = self.node_for_handle(handle) {
            warn!(%handle, "window already in layout");
            return existing;
        }
        self.ensure_workspace(ws);
        let after = after.filter(|&n| self.in_workspace(ws, n));
        let column = after
            .and_then(|n| self.column_of(n))
            .or_else(|| self.columns(ws).last().copied());

        let Some(column) = column else {
            let column = self.new_column(ws, 0);
            return self.new_window(column, 0, handle);
        };

        let windows = self.column_windows(column);
        if windows.len() < self.max_windows_per_column {
            let index = match after {
                Some(n) if self.is_window(n) => {
                    windows.iter().position(|&w| w == n).map_or(windows.len(), |i| i + 1)
                }
                _ => self.column_data(column).map_or(windows.len(), |d| d.active_tile_idx + 1),
            }
            .min(windows.len());
            let node = self.new_window(column, index, handle);
            if let Some(data) = self.column_data_mut(column) {
                data.active_tile_idx = index;
            }
            node
        } else {
            let index = self.column_index(ws, column).map_or(0, |i| i + 1);
            let column = self.new_column(ws, index);
            self.new_window(column, 0, handle)
        }
    }

    /// Makes the workspace hold exactly `handles`. New windows go in after
    /// the selection in the order given. The view does not move. Returns
    /// true if anything changed.
    pub fn sync_windows(
        &mut self,
        ws: VirtualWorkspaceId,
        handles: &[WindowHandle],
        focused: Option<WindowHandle>,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        self.ensure_workspace(ws);
        let wanted: HashSet<WindowHandle> = handles.iter().copied().collect();
        let stale: Vec<WindowHandle> =
            self.windows_in(ws).into_iter().filter(|h| !wanted.contains(h)).collect();

        let mut changed = false;
        for handle in stale {
            self.remove_window(ws, handle, state, gaps);
            changed = true;
        }

        let mut anchor = state.selected.filter(|&n| self.in_workspace(ws, n));
        let mut last_added = None;
        for &handle in handles {
            if let Some(node) = self.node_for_handle(handle) {
                if !self.in_workspace(ws, node) {
                    warn!(%handle, ?ws, "window is laid out on another workspace");
                }
                continue;
            }
            let node =
                self.restructure(ws, state, gaps, |this, _| this.add_window(ws, handle, anchor));
            anchor = Some(node);
            last_added = Some(node);
            changed = true;
        }

        let in_ws = |n: &NodeId| self.in_workspace(ws, *n) && self.is_window(*n);
        let selection = focused
            .and_then(|h| self.node_for_handle(h))
            .filter(|n| in_ws(n))
            .or(last_added)
            .or(state.selected.filter(|n| in_ws(n)))
            .or_else(|| self.window_nodes(ws).first().copied());
        if selection != state.selected {
            self.restructure(ws, state, gaps, |_, state| state.selected = selection);
            changed = true;
        }
        if let Some(selected) = selection {
            self.remember_active_tile(selected);
        }
        if changed {
            debug!(?ws, windows = handles.len(), "synced windows");
        }
        changed
    }

    pub(super) fn remember_active_tile(&mut self, window: NodeId) {
        let Some(column) = self.column_of(window).filter(|&c| c != window) else {
            return;
        };
        let index = self.column_windows(column).iter().position(|&w| w == window);
        if let (Some(index), Some(data)) = (index, self.column_data_mut(column)) {
            data.active_tile_idx = index;
        }
    }

    /// Removes a window and returns the node that should take over the
    /// selection. Last window of a column takes the column with it.
    pub fn remove_window(
        &mut self,
        ws: VirtualWorkspaceId,
        handle: WindowHandle,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> Option<NodeId> {
        let node = self.node_for_handle(handle).filter(|&n| self.in_workspace(ws, n))?;
        let column = self.column_of(node)?;
        if self.column_windows(column).len() == 1 {
            let index = self.column_index(ws, column)?;
            return self.animate_columns_for_removal(ws, index, state, gaps);
        }

        let fallback = self.fallback_selection_on_removal(node);
        let _ = self.restructure(ws, state, gaps, |this, state| {
            let (_, index) = this.detach(node)?;
            this.nodes.remove(node);
            this.handle_to_node.remove(&handle);
            let remaining = this.column_windows(column).len();
            if let Some(data) = this.column_data_mut(column)
                && data.active_tile_idx >= index
                && (data.active_tile_idx > index || index >= remaining)
            {
                data.active_tile_idx = data.active_tile_idx.saturating_sub(1);
            }
            if state.selected == Some(node) {
                state.selected = fallback;
            }
            Some(())
        });
        fallback
    }

    /// Node that should be selected once `node` is gone: the next tile in
    /// its column, else the previous one, else the active tile of the
    /// neighbouring column (right first). Never `node` itself.
    pub fn fallback_selection_on_removal(&self, node: NodeId) -> Option<NodeId> {
        let ws = self.workspace_of_node(node)?;
        match self.nodes.get(node)?.kind {
            NodeKind::Window(_) => {
                let column = self.column_of(node)?;
                let siblings = self.column_windows(column);
                let index = siblings.iter().position(|&w| w == node)?;
                siblings
                    .get(index + 1)
                    .or_else(|| index.checked_sub(1).and_then(|i| siblings.get(i)))
                    .copied()
                    .or_else(|| self.fallback_for_column(ws, self.column_index(ws, column)?))
            }
            NodeKind::Column(_) => self.fallback_for_column(ws, self.column_index(ws, node)?),
            NodeKind::Root(_) => None,
        }
    }

    fn fallback_for_column(&self, ws: VirtualWorkspaceId, index: usize) -> Option<NodeId> {
        let columns = self.columns(ws);
        columns
            .get(index + 1)
            .or_else(|| index.checked_sub(1).and_then(|i| columns.get(i)))
            .and_then(|&c| self.active_tile(c))
    }

    /// Removes the column at `index` and everything in it. The view stays
    /// put while the columns to its right slide into the gap.
    pub fn animate_columns_for_removal(
        &mut self,
        ws: VirtualWorkspaceId,
        index: usize,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> Option<NodeId> {
        let column = *self.columns(ws).get(index)?;
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        let shift = widths.get(index).copied().unwrap_or_default() + gaps.inner.horizontal;
        let fallback = self.fallback_for_column(ws, index);

        self.restructure(ws, state, gaps, |this, state| {
            let selection_removed = state
                .selected
                .is_some_and(|s| s == column || this.column_of(s) == Some(column));
            this.destroy_column(column);
            if selection_removed || state.selected.is_some_and(|s| !this.contains_node(s)) {
                state.selected = fallback;
            }
        });

        let clock = self.clock.clone();
        let animation = if state.animations_enabled && !self.columns(ws).is_empty() {
            Animation::new(clock, shift, 0.0, state.animation_duration, state.easing)
        } else {
            Animation::settled(clock, 0.0)
        };
        state.column_shift = Some(ColumnShift { from_index: index, animation });
        debug!(?ws, index, ?fallback, "removed column");
        fallback
    }

    /// Moves a window into `target` at `index`, dropping its old column if
    /// that leaves it empty.
    fn move_window_to_column(&mut self, window: NodeId, target: NodeId, index: usize) {
        let Some((source, old_index)) = self.detach(window) else {
            return;
        };
        self.attach(window, target, index);
        self.remember_active_tile(window);
        let remaining = self.column_windows(source).len();
        if remaining == 0 {
            self.destroy_column(source);
        } else if let Some(data) = self.column_data_mut(source)
            && (data.active_tile_idx > old_index || data.active_tile_idx >= remaining)
        {
            data.active_tile_idx = data.active_tile_idx.saturating_sub(1);
        }
    }

    fn selected_window(&self, ws: VirtualWorkspaceId, state: &ViewportState) -> Option<NodeId> {
        state.selected.filter(|&n| self.is_window(n) && self.in_workspace(ws, n))
    }

    fn neighbour_column(&self, ws: VirtualWorkspaceId, column: NodeId, direction: Direction) -> Option<NodeId> {
        let index = self.column_index(ws, column)?;
        let target = index.checked_add_signed(direction.step())?;
        self.columns(ws).get(target).copied()
    }

    /// Pulls the top window of the neighbouring column into the selected
    /// column.
    pub fn consume_into_column(
        &mut self,
        ws: VirtualWorkspaceId,
        direction: Direction,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        if direction.orientation() != Orientation::Horizontal {
            return false;
        }
        let Some(selected) = self.selected_window(ws, state) else {
            return false;
        };
        let Some(column) = self.column_of(selected) else {
            return false;
        };
        let Some(neighbour) = self.neighbour_column(ws, column, direction) else {
            return false;
        };
        let Some(&window) = self.column_windows(neighbour).first() else {
            return false;
        };
        self.restructure(ws, state, gaps, |this, _| {
            let end = this.column_windows(column).len();
            this.move_window_to_column(window, column, end);
            this.remember_active_tile(selected);
        });
        true
    }

    /// Moves the selected window into the neighbouring column, or out into a
    /// new column of its own if it shares a column.
    pub fn consume_or_expel(
        &mut self,
        ws: VirtualWorkspaceId,
        direction: Direction,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        if direction.orientation() != Orientation::Horizontal {
            return false;
        }
        let Some(selected) = self.selected_window(ws, state) else {
            return false;
        };
        let Some(column) = self.column_of(selected) else {
            return false;
        };
        if self.column_windows(column).len() > 1 {
            let Some(index) = self.column_index(ws, column) else {
                return false;
            };
            let index = if direction == Direction::Left { index } else { index + 1 };
            self.restructure(ws, state, gaps, |this, _| {
                let target = this.new_column(ws, index);
                this.move_window_to_column(selected, target, 0);
            });
            return true;
        }
        let Some(neighbour) = self.neighbour_column(ws, column, direction) else {
            return false;
        };
        self.restructure(ws, state, gaps, |this, _| {
            let end = this.column_windows(neighbour).len();
            this.move_window_to_column(selected, neighbour, end);
        });
        true
    }

    /// Moves the selected window into a new column right of its own.
    pub fn expel_from_column(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        let Some(selected) = self.selected_window(ws, state) else {
            return false;
        };
        let Some(column) = self.column_of(selected) else {
            return false;
        };
        if self.column_windows(column).len() < 2 {
            return false;
        }
        let Some(index) = self.column_index(ws, column) else {
            return false;
        };
        self.restructure(ws, state, gaps, |this, _| {
            let target = this.new_column(ws, index + 1);
            this.move_window_to_column(selected, target, 0);
        });
        true
    }
}
