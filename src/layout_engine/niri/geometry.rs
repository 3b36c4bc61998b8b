use serde::{Deserialize, Serialize};

use super::viewport::strip_x;
use super::{NiriLayoutEngine, NodeId, ViewportState};
use crate::common::config::GapSettings;
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::geometry::{Rect, Round};
use crate::sys::window::WindowHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    OffScreenLeft,
    OffScreenRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlacement {
    pub handle: WindowHandle,
    pub node: NodeId,
    pub frame: Rect,
    pub column_index: usize,
    pub visibility: Visibility,
}

impl NiriLayoutEngine {
    /// Frames for every window on `ws` at the current animation time.
    /// Columns scrolled out of the working frame are still placed, just
    /// outside it.
    pub fn calculate_layout(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &ViewportState,
        working_frame: Rect,
        gaps: &GapSettings,
    ) -> Vec<WindowPlacement> {
        let widths = self.resolve_widths(ws, working_frame.size.width, gaps);
        if widths.is_empty() {
            return Vec::new();
        }
        let gap = gaps.inner.horizontal;
        let active = state.active_column_idx.min(widths.len() - 1);
        let view_pos = strip_x(&widths, active, gap) + state.view_offset.current();

        let mut placements = Vec::with_capacity(self.window_count(ws));
        let mut x = 0.0;
        for (index, &column) in self.columns(ws).iter().enumerate() {
            let width = widths[index];
            let left = working_frame.min_x() + x - view_pos + state.column_shift_at(index);
            x += width + gap;

            let windows = self.column_windows(column);
            let count = windows.len() as f64;
            let vgap = gaps.inner.vertical;
            let height = ((working_frame.size.height - vgap * (count - 1.0)) / count).max(0.0);
            for (row, &window) in windows.iter().enumerate() {
                let Some(handle) = self.handle_for_node(window) else {
                    continue;
                };
                let top = working_frame.min_y() + row as f64 * (height + vgap);
                let frame = Rect::from_xywh(left, top, width, height).round();
                let visibility = if frame.max_x() <= working_frame.min_x() {
                    Visibility::OffScreenLeft
                } else if frame.min_x() >= working_frame.max_x() {
                    Visibility::OffScreenRight
                } else {
                    Visibility::Visible
                };
                placements.push(WindowPlacement {
                    handle,
                    node: window,
                    frame,
                    column_index: index,
                    visibility,
                });
            }
        }
        placements
    }
}
