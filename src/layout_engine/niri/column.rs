use tracing::debug;

use super::{ColumnData, ColumnWidth, MIN_COLUMN_WIDTH, NiriLayoutEngine, NodeId, ViewportState};
use crate::common::config::GapSettings;
use crate::layout_engine::resize::SizeChange;
use crate::model::virtual_workspace::VirtualWorkspaceId;

impl ColumnData {
    /// Current width expressed as a proportion of the working width.
    fn proportion(&mut self, working_width: f64, gaps: &GapSettings) -> f64 {
        match self.width {
            ColumnWidth::Proportion(f) if !self.is_full_width => f,
            _ => {
                let available = (working_width - gaps.inner.horizontal).max(1.0);
                self.resolve_and_cache_width(working_width, gaps) / available
            }
        }
    }
}

impl NiriLayoutEngine {
    fn selected_column(&self, ws: VirtualWorkspaceId, state: &ViewportState) -> Option<NodeId> {
        let selected = state.selected.filter(|&n| self.in_workspace(ws, n))?;
        self.column_of(selected)
    }

    pub fn set_column_width(
        &mut self,
        ws: VirtualWorkspaceId,
        change: SizeChange,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        let Some(column) = self.selected_column(ws, state) else {
            return false;
        };
        let working_width = state.working_width;
        let Some(data) = self.column_data_mut(column) else {
            return false;
        };
        let current_px = data.resolve_and_cache_width(working_width, gaps);
        let current_proportion = data.proportion(working_width, gaps);
        let width = match change {
            SizeChange::SetFixed(px) => ColumnWidth::Fixed(px.max(MIN_COLUMN_WIDTH)),
            SizeChange::SetProportion(pct) => ColumnWidth::Proportion((pct / 100.0).clamp(0.0, 1.0)),
            SizeChange::AdjustFixed(delta) => {
                ColumnWidth::Fixed((current_px + delta).max(MIN_COLUMN_WIDTH))
            }
            SizeChange::AdjustProportion(delta) => {
                ColumnWidth::Proportion((current_proportion + delta / 100.0).clamp(0.0, 1.0))
            }
        };
        debug!(?column, ?change, ?width, "setting column width");
        data.set_width(width);
        true
    }

    /// Makes the selected column span the view, or restores its width.
    pub fn toggle_full_width(&mut self, ws: VirtualWorkspaceId, state: &mut ViewportState) -> bool {
        let Some(column) = self.selected_column(ws, state) else {
            return false;
        };
        let Some(data) = self.column_data_mut(column) else {
            return false;
        };
        if data.is_full_width {
            data.width = data.saved_width.take().unwrap_or(data.width);
            data.is_full_width = false;
        } else {
            data.saved_width = Some(data.width);
            data.width = ColumnWidth::Proportion(1.0);
            data.is_full_width = true;
        }
        data.invalidate_width();
        true
    }

    /// Steps the selected column to the next preset wider than its current
    /// width, wrapping to the first.
    pub fn switch_preset_width(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
    ) -> bool {
        let Some(column) = self.selected_column(ws, state) else {
            return false;
        };
        let presets = self.preset_column_widths.clone();
        let Some(&first) = presets.first() else {
            return false;
        };
        let working_width = state.working_width;
        let Some(data) = self.column_data_mut(column) else {
            return false;
        };
        let current = data.proportion(working_width, gaps);
        let next = presets.iter().copied().find(|&p| p > current + 1e-3).unwrap_or(first);
        data.set_width(ColumnWidth::Proportion(next));
        true
    }
}
