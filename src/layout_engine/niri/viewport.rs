use std::time::Duration;

use tracing::trace;

use super::{NiriLayoutEngine, NodeId};
use crate::animation::{Animation, AnimationEasing, Clock};
use crate::common::config::{GapSettings, Settings};
use crate::model::virtual_workspace::VirtualWorkspaceId;
use crate::sys::geometry::Rect;

const EPSILON: f64 = 1e-6;

/// Offset of the view relative to the left edge of the active column.
#[derive(Debug, Clone)]
pub enum ViewOffset {
    Static(f64),
    Animated(Animation),
}

impl ViewOffset {
    pub fn current(&self) -> f64 {
        match self {
            ViewOffset::Static(v) => *v,
            ViewOffset::Animated(anim) => anim.value(),
        }
    }

    /// Where the offset will come to rest.
    pub fn target(&self) -> f64 {
        match self {
            ViewOffset::Static(v) => *v,
            ViewOffset::Animated(anim) => anim.target(),
        }
    }

    pub fn velocity(&self) -> f64 {
        match self {
            ViewOffset::Static(_) => 0.0,
            ViewOffset::Animated(anim) => anim.velocity(),
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self, ViewOffset::Animated(anim) if !anim.is_done())
    }

    /// Freezes an animated offset at its current value.
    pub fn collapse(&mut self) {
        if let ViewOffset::Animated(anim) = self {
            *self = ViewOffset::Static(anim.value());
        }
    }

    /// Nudges a static offset. Animated offsets must be collapsed first.
    pub fn offset(&mut self, delta: f64) {
        debug_assert!(
            matches!(self, ViewOffset::Static(_)),
            "offset() on an animated view offset"
        );
        self.collapse();
        if let ViewOffset::Static(v) = self {
            *v += delta;
        }
    }

    /// Changes the frame of reference without touching what is on screen:
    /// an animation in flight keeps its progress with both ends moved.
    pub(super) fn rebase(&mut self, delta: f64) {
        match self {
            ViewOffset::Static(v) => *v += delta,
            ViewOffset::Animated(anim) => anim.offset(delta),
        }
    }

    /// Drops a finished animation.
    pub fn settle(&mut self) {
        if let ViewOffset::Animated(anim) = self
            && anim.is_done()
        {
            *self = ViewOffset::Static(anim.target());
        }
    }
}

/// Slides columns right of a removed one into the gap it left.
#[derive(Debug, Clone)]
pub struct ColumnShift {
    pub from_index: usize,
    pub animation: Animation,
}

impl ColumnShift {
    pub fn amount(&self, column_index: usize) -> f64 {
        if column_index >= self.from_index { self.animation.value() } else { 0.0 }
    }
}

/// Scroll state of one workspace.
#[derive(Debug, Clone)]
pub struct ViewportState {
    pub active_column_idx: usize,
    pub selected: Option<NodeId>,
    pub view_offset: ViewOffset,
    pub animations_enabled: bool,
    pub animation_duration: Duration,
    pub easing: AnimationEasing,
    /// Working width used the last time the view was laid out.
    pub working_width: f64,
    pub column_shift: Option<ColumnShift>,
    clock: Clock,
}

impl ViewportState {
    pub fn new(clock: Clock, settings: &Settings) -> Self {
        let mut state = Self {
            active_column_idx: 0,
            selected: None,
            view_offset: ViewOffset::Static(0.0),
            animations_enabled: true,
            animation_duration: Duration::ZERO,
            easing: AnimationEasing::default(),
            working_width: 0.0,
            column_shift: None,
            clock,
        };
        state.update_animation_settings(settings);
        state
    }

    pub fn update_animation_settings(&mut self, settings: &Settings) {
        self.animations_enabled = settings.animate;
        self.animation_duration = Duration::try_from_secs_f64(settings.animation_duration.max(0.0))
            .unwrap_or(Duration::ZERO);
        self.easing = settings.animation_easing;
        if !self.animations_enabled {
            self.view_offset = ViewOffset::Static(self.view_offset.target());
            self.column_shift = None;
        }
    }

    pub fn clock(&self) -> &Clock { &self.clock }

    pub fn is_animating(&self) -> bool {
        self.view_offset.is_animating()
            || self.column_shift.as_ref().is_some_and(|s| !s.animation.is_done())
    }

    /// Drops finished animations.
    pub fn settle(&mut self) {
        self.view_offset.settle();
        if self.column_shift.as_ref().is_some_and(|s| s.animation.is_done()) {
            self.column_shift = None;
        }
    }

    pub fn column_shift_at(&self, column_index: usize) -> f64 {
        self.column_shift.as_ref().map_or(0.0, |s| s.amount(column_index))
    }

    fn animate_view_offset_to(&mut self, target: f64) {
        let current = self.view_offset.current();
        if (self.view_offset.target() - target).abs() < EPSILON {
            return;
        }
        if !self.animations_enabled || self.animation_duration.is_zero() {
            self.view_offset = ViewOffset::Static(target);
            return;
        }
        let velocity = self.view_offset.velocity();
        self.view_offset = ViewOffset::Animated(Animation::with_velocity(
            self.clock.clone(),
            current,
            target,
            velocity,
            self.animation_duration,
        ));
    }
}

/// Left edge of column `index` in strip coordinates.
pub(super) fn strip_x(widths: &[f64], index: usize, gap: f64) -> f64 {
    widths.iter().take(index).map(|w| w + gap).sum()
}

impl NiriLayoutEngine {
    /// Resolves every column width for the given working width.
    pub fn resolve_widths(
        &mut self,
        ws: VirtualWorkspaceId,
        working_width: f64,
        gaps: &GapSettings,
    ) -> Vec<f64> {
        let columns = self.columns(ws).to_vec();
        columns
            .into_iter()
            .filter_map(|c| {
                self.column_data_mut(c).map(|d| d.resolve_and_cache_width(working_width, gaps))
            })
            .collect()
    }

    /// Strip position of the view's left edge.
    pub fn view_pos(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &ViewportState,
        gaps: &GapSettings,
    ) -> f64 {
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        let active = state.active_column_idx.min(widths.len().saturating_sub(1));
        strip_x(&widths, active, gaps.inner.horizontal) + state.view_offset.current()
    }

    /// Moves the active column without scrolling the view.
    pub(super) fn rebase_active_column(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
        target: usize,
    ) {
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        if widths.is_empty() {
            state.active_column_idx = 0;
            return;
        }
        let gap = gaps.inner.horizontal;
        let target = target.min(widths.len() - 1);
        let mut active = state.active_column_idx.min(widths.len() - 1);
        let mut delta = 0.0;
        while active < target {
            delta -= widths[active] + gap;
            active += 1;
        }
        while active > target {
            active -= 1;
            delta += widths[active] + gap;
        }
        state.active_column_idx = target;
        state.view_offset.rebase(delta);
    }

    /// After a structural change, picks the active column again and puts the
    /// view back at `view_pos`.
    pub(super) fn restore_view_pos(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
        view_pos: f64,
        previous_active: Option<NodeId>,
    ) {
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        if widths.is_empty() {
            state.active_column_idx = 0;
            state.view_offset = ViewOffset::Static(0.0);
            return;
        }
        let active = state
            .selected
            .and_then(|s| self.column_index(ws, s))
            .or_else(|| previous_active.and_then(|c| self.column_index(ws, c)))
            .unwrap_or(state.active_column_idx)
            .min(widths.len() - 1);
        state.active_column_idx = active;
        let wanted = view_pos - strip_x(&widths, active, gaps.inner.horizontal);
        let delta = wanted - state.view_offset.current();
        if delta.abs() > EPSILON {
            state.view_offset.collapse();
            state.view_offset.offset(delta);
        }
    }

    /// Runs a structural edit while keeping the view where it is.
    pub(super) fn restructure<R>(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        gaps: &GapSettings,
        edit: impl FnOnce(&mut Self, &mut ViewportState) -> R,
    ) -> R {
        let before = self.view_pos(ws, state, gaps);
        let previous_active = self.columns(ws).get(state.active_column_idx).copied();
        let result = edit(self, state);
        self.restore_view_pos(ws, state, gaps, before, previous_active);
        self.debug_check(ws);
        result
    }

    /// Scrolls as little as possible so the column holding `node` is on
    /// screen. Returns true if the view target changed.
    pub fn ensure_selection_visible(
        &mut self,
        ws: VirtualWorkspaceId,
        node: NodeId,
        state: &mut ViewportState,
        working_frame: Rect,
        gaps: &GapSettings,
        always_center_single_column: bool,
    ) -> bool {
        state.working_width = working_frame.size.width;
        let Some(index) = self.column_index(ws, node) else {
            return false;
        };
        self.rebase_active_column(ws, state, gaps, index);
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        let view_width = working_frame.size.width;
        let width = widths[index];

        let target = if always_center_single_column && widths.len() == 1 {
            -(view_width - width) / 2.0
        } else {
            let offset = state.view_offset.target();
            let fits = offset <= EPSILON && offset >= width - view_width - EPSILON;
            if fits {
                return false;
            } else if offset > 0.0 || width >= view_width {
                0.0
            } else {
                width - view_width
            }
        };
        if (state.view_offset.target() - target).abs() < EPSILON {
            return false;
        }
        trace!(?ws, index, from = state.view_offset.current(), to = target, "scrolling view");
        state.animate_view_offset_to(target);
        true
    }

    /// Centers the active column in the view.
    pub fn center_column(
        &mut self,
        ws: VirtualWorkspaceId,
        state: &mut ViewportState,
        working_frame: Rect,
        gaps: &GapSettings,
    ) -> bool {
        state.working_width = working_frame.size.width;
        let widths = self.resolve_widths(ws, state.working_width, gaps);
        let Some(&width) = widths.get(state.active_column_idx) else {
            return false;
        };
        let target = -(working_frame.size.width - width) / 2.0;
        if (state.view_offset.target() - target).abs() < EPSILON {
            return false;
        }
        state.animate_view_offset_to(target);
        true
    }
}
