use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::niri::{NiriLayoutEngine, ViewportState, WindowConstraints, WindowPlacement};
use super::resize::SizeChange;
use super::utils::compute_tiling_area;
use super::Direction;
use crate::animation::Clock;
use crate::common::collections::{HashMap, HashSet};
use crate::common::config::{Config, GapSettings, Settings};
use crate::model::virtual_workspace::{VirtualWorkspaceId, VirtualWorkspaceManager};
use crate::sys::geometry::{Rect, ScreenPoint};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowHandle;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    MoveFocus(Direction),
    FocusColumnFirst,
    FocusColumnLast,
    SwapWindow(Direction),
    ConsumeIntoColumn(Direction),
    ConsumeOrExpel(Direction),
    ExpelFromColumn,
    SetColumnWidth(SizeChange),
    ToggleFullWidth,
    SwitchPresetWidth,
    CenterColumn,

    NextWorkspace(Option<bool>),
    PrevWorkspace(Option<bool>),
    FocusWorkspace(String),
    WorkspaceBackAndForth,
    MoveWindowToWorkspace(String),
    SummonWorkspace(String),
    MoveWorkspaceToMonitor(ScreenPoint),
}

#[derive(Debug, Clone)]
pub enum LayoutEvent {
    /// Authoritative window list for one workspace.
    WindowsOnScreenUpdated {
        workspace: VirtualWorkspaceId,
        windows: Vec<WindowHandle>,
        focused: Option<WindowHandle>,
    },
    WindowAdded(WindowHandle),
    WindowRemoved(WindowHandle),
    WindowFocused(WindowHandle),
    ScreenParametersChanged(Vec<Monitor>),
    WindowConstraintsChanged(WindowHandle, WindowConstraints),
}

#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub raise_windows: Vec<WindowHandle>,
    pub focus_window: Option<WindowHandle>,
    pub workspace_changed_to: Option<VirtualWorkspaceId>,
}

/// Scrollable layouts for every workspace plus the workspace–monitor
/// bindings that decide which of them are on screen.
pub struct LayoutEngine {
    tree: NiriLayoutEngine,
    viewports: HashMap<VirtualWorkspaceId, ViewportState>,
    workspaces: VirtualWorkspaceManager,
    settings: Settings,
    clock: Clock,
    focused_point: Option<ScreenPoint>,
    focused_window: Option<WindowHandle>,
}

impl LayoutEngine {
    pub fn new(config: &Config, clock: Clock) -> Self {
        LayoutEngine {
            tree: NiriLayoutEngine::new(&config.settings.layout, clock.clone()),
            viewports: HashMap::default(),
            workspaces: VirtualWorkspaceManager::new(&config.workspaces),
            settings: config.settings.clone(),
            clock,
            focused_point: None,
            focused_window: None,
        }
    }

    pub fn apply_settings(&mut self, config: &Config) {
        self.tree.apply_settings(&config.settings.layout);
        self.workspaces.apply_settings(&config.workspaces);
        if !self.workspaces.monitors().is_empty() {
            self.workspaces.rearrange_workspaces_on_monitors();
        }
        self.update_animation_settings(&config.settings);
    }

    pub fn update_animation_settings(&mut self, settings: &Settings) {
        self.settings = settings.clone();
        for state in self.viewports.values_mut() {
            state.update_animation_settings(settings);
        }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn tree(&self) -> &NiriLayoutEngine { &self.tree }

    pub fn workspaces(&self) -> &VirtualWorkspaceManager { &self.workspaces }

    pub fn workspaces_mut(&mut self) -> &mut VirtualWorkspaceManager { &mut self.workspaces }

    pub fn viewport(&self, ws: VirtualWorkspaceId) -> Option<&ViewportState> {
        self.viewports.get(&ws)
    }

    pub fn focused_window(&self) -> Option<WindowHandle> { self.focused_window }

    pub fn focused_point(&self) -> Option<ScreenPoint> { self.focused_point }

    pub fn focused_workspace(&self) -> Option<VirtualWorkspaceId> {
        self.workspaces.active_workspace(self.focused_point?)
    }

    /// Stores a new monitor list and keeps the focused monitor valid.
    /// Returns true if bindings were rearranged.
    pub fn update_monitors(&mut self, monitors: Vec<Monitor>) -> bool {
        let changed = self.workspaces.update_monitors(monitors);
        if self.focused_point.is_none_or(|p| self.workspaces.monitor_at(p).is_none()) {
            self.focused_point = self.workspaces.monitors().first().map(Monitor::anchor);
        }
        if changed {
            info!(
                monitors = self.workspaces.monitors().len(),
                focused = ?self.focused_point,
                "monitor topology changed"
            );
            self.collect_garbage(self.focused_workspace());
        }
        changed
    }

    pub fn focus_monitor(&mut self, point: ScreenPoint) -> bool {
        if self.workspaces.monitor_at(point).is_none() {
            debug!(?point, "No monitor at point");
            return false;
        }
        self.focused_point = Some(point);
        true
    }

    /// Visible frame of the workspace's monitor, less the outer gaps.
    pub fn working_frame(&self, ws: VirtualWorkspaceId) -> Option<Rect> {
        let monitor = self.workspaces.monitor_for_workspace(ws)?;
        Some(compute_tiling_area(monitor.visible_frame, &self.settings.layout.gaps))
    }

    fn split(
        &mut self,
        ws: VirtualWorkspaceId,
    ) -> (&mut NiriLayoutEngine, &mut ViewportState, &GapSettings) {
        let working_width = self.working_frame(ws).map(|f| f.size.width).or_else(|| {
            let main = self.workspaces.monitors().first()?;
            Some(compute_tiling_area(main.visible_frame, &self.settings.layout.gaps).size.width)
        });
        let state = self
            .viewports
            .entry(ws)
            .or_insert_with(|| ViewportState::new(self.clock.clone(), &self.settings));
        if let Some(width) = working_width
            && (self.workspaces.is_visible(ws) || state.working_width == 0.0)
        {
            state.working_width = width;
        }
        (&mut self.tree, state, &self.settings.layout.gaps)
    }

    /// Scrolls the selection of a visible workspace into view.
    fn reveal(&mut self, ws: VirtualWorkspaceId) -> EventResponse {
        let Some(frame) = self.working_frame(ws) else {
            return EventResponse::default();
        };
        let center = self.settings.layout.always_center_single_column;
        let (tree, state, gaps) = self.split(ws);
        if let Some(selected) = state.selected {
            tree.ensure_selection_visible(ws, selected, state, frame, gaps, center);
        }
        EventResponse {
            focus_window: tree.selected_handle(ws, state),
            ..Default::default()
        }
    }

    fn collect_garbage(&mut self, focused: Option<VirtualWorkspaceId>) {
        for id in self.workspaces.garbage_collect_unused_workspaces(focused) {
            self.tree.remove_workspace(id);
            self.viewports.remove(&id);
        }
    }

    fn show_workspace(&mut self, id: VirtualWorkspaceId) -> EventResponse {
        self.collect_garbage(Some(id));
        let mut response = self.reveal(id);
        response.raise_windows = self.tree.windows_in(id);
        response.workspace_changed_to = Some(id);
        self.focused_window = response.focus_window;
        response
    }

    /// Shows a workspace on the focused monitor. If it is already visible
    /// elsewhere, focus moves to that monitor instead.
    fn activate_workspace(&mut self, id: VirtualWorkspaceId) -> EventResponse {
        let Some(point) = self.focused_point else {
            return EventResponse::default();
        };
        if let Some(current) = self.workspaces.visible_point(id) {
            self.focused_point = Some(current);
            return self.show_workspace(id);
        }
        if !self.workspaces.set_active_workspace(id, point) {
            return EventResponse::default();
        }
        self.show_workspace(id)
    }

    pub fn focus_workspace(&mut self, name: &str) -> EventResponse {
        let Some(id) = self.workspaces.workspace_id(name, true) else {
            return EventResponse::default();
        };
        if self.focused_workspace() == Some(id) {
            return self.workspace_back_and_forth();
        }
        self.activate_workspace(id)
    }

    pub fn workspace_back_and_forth(&mut self) -> EventResponse {
        let Some(point) = self.focused_point else {
            return EventResponse::default();
        };
        match self.workspaces.previous_workspace(point) {
            Some(previous) if self.workspaces.contains(previous) => {
                self.activate_workspace(previous)
            }
            _ => {
                debug!(?point, "No previous workspace on monitor");
                EventResponse::default()
            }
        }
    }

    fn cycle_workspace(&mut self, skip_empty: Option<bool>, forward: bool) -> EventResponse {
        let Some(current) = self.focused_workspace() else {
            return EventResponse::default();
        };
        let next = if forward {
            self.workspaces.next_workspace(current, skip_empty)
        } else {
            self.workspaces.prev_workspace(current, skip_empty)
        };
        match next {
            Some(next) if next != current => self.activate_workspace(next),
            _ => EventResponse::default(),
        }
    }

    fn detach_window(&mut self, ws: VirtualWorkspaceId, handle: WindowHandle) {
        let (tree, state, gaps) = self.split(ws);
        tree.remove_window(ws, handle, state, gaps);
        self.workspaces.remove_window(handle);
    }

    fn insert_window(&mut self, ws: VirtualWorkspaceId, handle: WindowHandle) {
        self.workspaces.assign_window(handle, ws);
        let mut windows = self.tree.windows_in(ws);
        windows.push(handle);
        let (tree, state, gaps) = self.split(ws);
        tree.sync_windows(ws, &windows, Some(handle), state, gaps);
    }

    /// Sends the focused window to another workspace; focus stays on the
    /// current one.
    pub fn move_window_to_workspace(&mut self, name: &str) -> EventResponse {
        let Some(source) = self.focused_workspace() else {
            return EventResponse::default();
        };
        let handle = self
            .focused_window
            .filter(|&h| self.tree.workspace_of_handle(h) == Some(source))
            .or_else(|| self.tree.selected_handle(source, self.viewports.get(&source)?));
        let Some(handle) = handle else {
            return EventResponse::default();
        };
        let Some(target) = self.workspaces.workspace_id(name, true) else {
            return EventResponse::default();
        };
        if target == source {
            return EventResponse::default();
        }
        debug!(%handle, ?source, ?target, "moving window to workspace");
        self.detach_window(source, handle);
        self.insert_window(target, handle);
        if self.workspaces.is_visible(target) {
            let _ = self.reveal(target);
        }
        let response = self.reveal(source);
        self.focused_window = response.focus_window;
        response
    }

    pub fn summon_workspace(&mut self, name: &str) -> EventResponse {
        let Some(point) = self.focused_point else {
            return EventResponse::default();
        };
        let Some(id) = self.workspaces.workspace_id(name, true) else {
            return EventResponse::default();
        };
        if !self.workspaces.summon_workspace(id, point) {
            return EventResponse::default();
        }
        self.show_workspace(id)
    }

    pub fn move_workspace_to_monitor(&mut self, point: ScreenPoint) -> EventResponse {
        let Some(ws) = self.focused_workspace() else {
            return EventResponse::default();
        };
        if !self.workspaces.move_workspace_to_monitor(ws, point) {
            return EventResponse::default();
        }
        self.focused_point = Some(point);
        self.show_workspace(ws)
    }

    pub fn handle_command(&mut self, command: LayoutCommand) -> EventResponse {
        debug!(?command, focused = ?self.focused_window);
        if let Some(ws) = self.focused_workspace() {
            debug!("Tree:\n{}", self.draw_tree(ws).trim_end());
        }
        match command {
            LayoutCommand::NextWorkspace(skip_empty) => self.cycle_workspace(skip_empty, true),
            LayoutCommand::PrevWorkspace(skip_empty) => self.cycle_workspace(skip_empty, false),
            LayoutCommand::FocusWorkspace(name) => self.focus_workspace(&name),
            LayoutCommand::WorkspaceBackAndForth => self.workspace_back_and_forth(),
            LayoutCommand::MoveWindowToWorkspace(name) => self.move_window_to_workspace(&name),
            LayoutCommand::SummonWorkspace(name) => self.summon_workspace(&name),
            LayoutCommand::MoveWorkspaceToMonitor(point) => self.move_workspace_to_monitor(point),
            command => self.handle_layout_command(command),
        }
    }

    fn handle_layout_command(&mut self, command: LayoutCommand) -> EventResponse {
        let Some(ws) = self.focused_workspace() else {
            debug!("No focused workspace; command ignored");
            return EventResponse::default();
        };
        let Some(frame) = self.working_frame(ws) else {
            return EventResponse::default();
        };
        let (tree, state, gaps) = self.split(ws);
        let changed = match command {
            LayoutCommand::MoveFocus(direction) => tree.focus(ws, direction, state, gaps).is_some(),
            LayoutCommand::FocusColumnFirst => tree.focus_column_first(ws, state, gaps).is_some(),
            LayoutCommand::FocusColumnLast => tree.focus_column_last(ws, state, gaps).is_some(),
            LayoutCommand::SwapWindow(direction) => match state.selected {
                Some(node) => tree.swap_window(ws, node, direction, state, frame, gaps),
                None => false,
            },
            LayoutCommand::ConsumeIntoColumn(direction) => {
                tree.consume_into_column(ws, direction, state, gaps)
            }
            LayoutCommand::ConsumeOrExpel(direction) => {
                tree.consume_or_expel(ws, direction, state, gaps)
            }
            LayoutCommand::ExpelFromColumn => tree.expel_from_column(ws, state, gaps),
            LayoutCommand::SetColumnWidth(change) => {
                tree.set_column_width(ws, change, state, gaps)
            }
            LayoutCommand::ToggleFullWidth => tree.toggle_full_width(ws, state),
            LayoutCommand::SwitchPresetWidth => tree.switch_preset_width(ws, state, gaps),
            LayoutCommand::CenterColumn => {
                let moved = tree.center_column(ws, state, frame, gaps);
                let focus_window = tree.selected_handle(ws, state);
                return if moved {
                    EventResponse { focus_window, ..Default::default() }
                } else {
                    EventResponse::default()
                };
            }
            LayoutCommand::NextWorkspace(_)
            | LayoutCommand::PrevWorkspace(_)
            | LayoutCommand::FocusWorkspace(_)
            | LayoutCommand::WorkspaceBackAndForth
            | LayoutCommand::MoveWindowToWorkspace(_)
            | LayoutCommand::SummonWorkspace(_)
            | LayoutCommand::MoveWorkspaceToMonitor(_) => false,
        };
        if !changed {
            return EventResponse::default();
        }
        let response = self.reveal(ws);
        self.focused_window = response.focus_window.or(self.focused_window);
        response
    }

    pub fn handle_event(&mut self, event: LayoutEvent) -> EventResponse {
        debug!(?event);
        match event {
            LayoutEvent::WindowsOnScreenUpdated { workspace, windows, focused } => {
                self.windows_on_screen_updated(workspace, windows, focused)
            }
            LayoutEvent::WindowAdded(handle) => {
                let Some(ws) = self.focused_workspace() else {
                    warn!(%handle, "No focused workspace for new window");
                    return EventResponse::default();
                };
                if self.tree.node_for_handle(handle).is_some() {
                    return EventResponse::default();
                }
                self.insert_window(ws, handle);
                let response = self.reveal(ws);
                self.focused_window = response.focus_window;
                response
            }
            LayoutEvent::WindowRemoved(handle) => {
                if self.focused_window == Some(handle) {
                    self.focused_window = None;
                }
                let Some(ws) = self.tree.workspace_of_handle(handle) else {
                    self.workspaces.remove_window(handle);
                    return EventResponse::default();
                };
                self.detach_window(ws, handle);
                if self.focused_workspace() != Some(ws) {
                    let _ = self.reveal(ws);
                    return EventResponse::default();
                }
                let response = self.reveal(ws);
                self.focused_window = response.focus_window;
                response
            }
            LayoutEvent::WindowFocused(handle) => {
                self.focused_window = Some(handle);
                let Some(ws) = self.tree.workspace_of_handle(handle) else {
                    return EventResponse::default();
                };
                if let Some(point) = self.workspaces.visible_point(ws) {
                    self.focused_point = Some(point);
                }
                let (tree, state, gaps) = self.split(ws);
                if tree.select_window(ws, handle, state, gaps) {
                    let _ = self.reveal(ws);
                }
                EventResponse::default()
            }
            LayoutEvent::ScreenParametersChanged(monitors) => {
                if self.update_monitors(monitors) {
                    EventResponse {
                        workspace_changed_to: self.focused_workspace(),
                        ..Default::default()
                    }
                } else {
                    EventResponse::default()
                }
            }
            LayoutEvent::WindowConstraintsChanged(handle, constraints) => {
                if !self.tree.update_window_constraints(handle, constraints) {
                    debug!(%handle, "Constraints for unknown window");
                }
                EventResponse::default()
            }
        }
    }

    fn windows_on_screen_updated(
        &mut self,
        ws: VirtualWorkspaceId,
        windows: Vec<WindowHandle>,
        focused: Option<WindowHandle>,
    ) -> EventResponse {
        if !self.workspaces.contains(ws) {
            warn!(?ws, "Window update for unknown workspace");
            return EventResponse::default();
        }
        for &handle in &windows {
            if let Some(old) = self.tree.workspace_of_handle(handle)
                && old != ws
            {
                self.detach_window(old, handle);
            }
        }
        let current: HashSet<WindowHandle> = windows.iter().copied().collect();
        for handle in self.tree.windows_in(ws) {
            if !current.contains(&handle) {
                self.workspaces.remove_window(handle);
            }
        }
        for &handle in &windows {
            self.workspaces.assign_window(handle, ws);
        }

        let (tree, state, gaps) = self.split(ws);
        let changed = tree.sync_windows(ws, &windows, focused, state, gaps);
        if !changed || !self.workspaces.is_visible(ws) {
            return EventResponse::default();
        }
        let _ = self.reveal(ws);
        EventResponse::default()
    }

    /// Frames for a visible workspace at the current animation time.
    pub fn calculate_layout(&mut self, ws: VirtualWorkspaceId) -> Vec<WindowPlacement> {
        let Some(frame) = self.working_frame(ws) else {
            return Vec::new();
        };
        let (tree, state, gaps) = self.split(ws);
        state.settle();
        tree.calculate_layout(ws, state, frame, gaps)
    }

    pub fn calculate_visible_layouts(&mut self) -> Vec<(VirtualWorkspaceId, Vec<WindowPlacement>)> {
        let visible: Vec<_> = self.workspaces.visible_workspaces().map(|(_, id)| id).collect();
        visible.into_iter().map(|ws| (ws, self.calculate_layout(ws))).collect()
    }

    /// True while any visible workspace is still scrolling or closing a gap.
    pub fn is_animating(&self) -> bool {
        self.workspaces
            .visible_workspaces()
            .any(|(_, ws)| self.viewports.get(&ws).is_some_and(ViewportState::is_animating))
    }

    pub fn draw_tree(&self, ws: VirtualWorkspaceId) -> String {
        self.tree.draw_tree(ws, self.viewports.get(&ws))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::niri::Visibility;
    use crate::model::workspace_name::WorkspaceName;
    use crate::sys::screen::test_monitor;

    fn w(idx: u32) -> WindowHandle { WindowHandle::new(7, idx) }

    fn engine() -> LayoutEngine {
        let mut config = Config::default();
        config.settings.animate = false;
        let mut engine = LayoutEngine::new(&config, Clock::manual(Duration::ZERO));
        assert!(engine.update_monitors(vec![test_monitor(1, 0.0, 0.0, "Built-in")]));
        engine
    }

    fn name_of(engine: &LayoutEngine, ws: VirtualWorkspaceId) -> String {
        engine.workspaces().workspace_info(ws).unwrap().name().to_string()
    }

    fn id_of(engine: &LayoutEngine, name: &str) -> Option<VirtualWorkspaceId> {
        engine.workspaces().workspace_by_name(&name.parse::<WorkspaceName>().unwrap())
    }

    fn order(engine: &LayoutEngine, ws: VirtualWorkspaceId) -> Vec<u32> {
        engine.tree().windows_in(ws).iter().map(|h| h.idx).collect()
    }

    #[test]
    fn first_monitor_shows_a_stub_workspace() {
        let engine = engine();
        let ws = engine.focused_workspace().unwrap();
        assert_eq!(name_of(&engine, ws), "1");
        assert_eq!(engine.focused_point(), Some(ScreenPoint::new(0, 0)));
        assert_eq!(engine.working_frame(ws), Some(Rect::from_xywh(0.0, 25.0, 1920.0, 1055.0)));
    }

    #[test]
    fn screen_update_lays_out_columns() {
        let mut engine = engine();
        let ws = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowsOnScreenUpdated {
            workspace: ws,
            windows: vec![w(1), w(2)],
            focused: None,
        });

        let placements = engine.calculate_layout(ws);
        let frames: Vec<_> = placements.iter().map(|p| (p.handle.idx, p.frame)).collect();
        assert_eq!(
            frames,
            vec![
                (1, Rect::from_xywh(0.0, 25.0, 960.0, 1055.0)),
                (2, Rect::from_xywh(960.0, 25.0, 960.0, 1055.0)),
            ]
        );
        assert!(placements.iter().all(|p| p.visibility == Visibility::Visible));
        assert_eq!(engine.workspaces().workspace_for_window(w(2)), Some(ws));
    }

    #[test]
    fn layout_commands_act_on_the_focused_workspace() {
        let mut engine = engine();
        let ws = engine.focused_workspace().unwrap();
        for idx in 1..=3 {
            let _ = engine.handle_event(LayoutEvent::WindowAdded(w(idx)));
        }
        assert_eq!(engine.focused_window(), Some(w(3)));
        assert_eq!(engine.tree().columns(ws).len(), 3);

        let response = engine.handle_command(LayoutCommand::MoveFocus(Direction::Left));
        assert_eq!(response.focus_window, Some(w(2)));

        let _ = engine.handle_command(LayoutCommand::SwapWindow(Direction::Left));
        assert_eq!(order(&engine, ws), vec![2, 1, 3]);

        let _ = engine.handle_command(LayoutCommand::ConsumeIntoColumn(Direction::Right));
        assert_eq!(engine.tree().columns(ws).len(), 2);
        assert_eq!(order(&engine, ws), vec![2, 1, 3]);

        let response = engine.handle_command(LayoutCommand::MoveFocus(Direction::Up));
        assert_eq!(response, EventResponse::default());

        let response = engine.handle_command(LayoutCommand::SetColumnWidth(
            "100%".parse().unwrap(),
        ));
        assert_eq!(response.focus_window, Some(w(2)));
        let placements = engine.calculate_layout(ws);
        assert_eq!(placements[0].frame.size.width, 1920.0);
    }

    #[test]
    fn focusing_a_workspace_twice_goes_back() {
        let mut engine = engine();
        let first = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));

        let response = engine.focus_workspace("2");
        let second = id_of(&engine, "2").unwrap();
        assert_eq!(response.workspace_changed_to, Some(second));
        assert!(response.raise_windows.is_empty());
        assert_eq!(engine.focused_workspace(), Some(second));

        let response = engine.focus_workspace("2");
        assert_eq!(response.workspace_changed_to, Some(first));
        assert_eq!(response.raise_windows, vec![w(1)]);
        assert_eq!(response.focus_window, Some(w(1)));
        // Hidden, empty and not persistent.
        assert_eq!(id_of(&engine, "2"), None);
    }

    #[test]
    fn moving_a_window_keeps_focus_on_the_source() {
        let mut engine = engine();
        let source = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(2)));

        let response = engine.handle_command(LayoutCommand::MoveWindowToWorkspace("3".into()));
        let target = id_of(&engine, "3").unwrap();
        assert_eq!(response.focus_window, Some(w(1)));
        assert_eq!(order(&engine, source), vec![1]);
        assert_eq!(order(&engine, target), vec![2]);
        assert_eq!(engine.workspaces().workspace_for_window(w(2)), Some(target));
        engine.tree().check_invariants(source).unwrap();
        engine.tree().check_invariants(target).unwrap();
    }

    #[test]
    fn screen_update_moves_windows_between_workspaces() {
        let mut engine = engine();
        let first = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowsOnScreenUpdated {
            workspace: first,
            windows: vec![w(1), w(2)],
            focused: Some(w(1)),
        });
        let other = engine.workspaces_mut().workspace_id("mail", true).unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowsOnScreenUpdated {
            workspace: other,
            windows: vec![w(2)],
            focused: None,
        });
        assert_eq!(order(&engine, first), vec![1]);
        assert_eq!(order(&engine, other), vec![2]);
        assert_eq!(engine.workspaces().workspace_for_window(w(2)), Some(other));
    }

    #[test]
    fn removing_the_focused_window_focuses_a_neighbour() {
        let mut engine = engine();
        for idx in 1..=3 {
            let _ = engine.handle_event(LayoutEvent::WindowAdded(w(idx)));
        }
        let _ = engine.handle_event(LayoutEvent::WindowFocused(w(2)));
        let response = engine.handle_event(LayoutEvent::WindowRemoved(w(2)));
        assert_eq!(response.focus_window, Some(w(3)));
        assert_eq!(engine.focused_window(), Some(w(3)));
        assert_eq!(engine.workspaces().workspace_for_window(w(2)), None);
    }

    #[test]
    fn new_monitor_gets_its_own_workspace() {
        let mut engine = engine();
        let first = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));

        let response = engine.handle_event(LayoutEvent::ScreenParametersChanged(vec![
            test_monitor(1, 0.0, 0.0, "Built-in"),
            test_monitor(2, 1920.0, 0.0, "DELL"),
        ]));
        assert_eq!(response.workspace_changed_to, Some(first));
        let right = ScreenPoint::new(1920, 0);
        let second = engine.workspaces().active_workspace(right).unwrap();
        assert_ne!(second, first);
        assert_eq!(engine.workspaces().active_workspace(ScreenPoint::new(0, 0)), Some(first));

        // Focusing a workspace shown elsewhere moves focus there.
        let name = name_of(&engine, second);
        let response = engine.focus_workspace(&name);
        assert_eq!(response.workspace_changed_to, Some(second));
        assert_eq!(engine.focused_point(), Some(right));
        assert_eq!(engine.workspaces().active_workspace(ScreenPoint::new(0, 0)), Some(first));
    }

    #[test]
    fn workspace_can_follow_a_monitor_move() {
        let mut engine = engine();
        let _ = engine.update_monitors(vec![
            test_monitor(1, 0.0, 0.0, "Built-in"),
            test_monitor(2, 1920.0, 0.0, "DELL"),
        ]);
        let ws = engine.focused_workspace().unwrap();
        let right = ScreenPoint::new(1920, 0);
        let response = engine.handle_command(LayoutCommand::MoveWorkspaceToMonitor(right));
        assert_eq!(response.workspace_changed_to, Some(ws));
        assert_eq!(engine.workspaces().visible_point(ws), Some(right));
        assert_eq!(engine.focused_point(), Some(right));
        assert!(engine.workspaces().active_workspace(ScreenPoint::new(0, 0)).is_some());
    }

    #[test]
    fn cycling_workspaces_wraps_around() {
        let mut engine = engine();
        let first = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));
        let _ = engine.focus_workspace("2");
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(2)));

        let response = engine.handle_command(LayoutCommand::NextWorkspace(None));
        assert_eq!(response.workspace_changed_to, Some(first));
        let response = engine.handle_command(LayoutCommand::PrevWorkspace(Some(true)));
        assert_eq!(response.workspace_changed_to, id_of(&engine, "2"));
    }

    #[test]
    fn animation_settings_reach_every_viewport() {
        let mut engine = engine();
        let ws = engine.focused_workspace().unwrap();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));
        assert!(!engine.viewport(ws).unwrap().animations_enabled);

        let settings = Settings { animate: true, ..engine.settings().clone() };
        engine.update_animation_settings(&settings);
        assert!(engine.viewport(ws).unwrap().animations_enabled);
        assert!(!engine.is_animating());
    }

    #[test]
    fn constraints_are_forwarded_to_the_tree() {
        let mut engine = engine();
        let _ = engine.handle_event(LayoutEvent::WindowAdded(w(1)));
        let constraints = WindowConstraints {
            is_fixed_size: true,
            ..Default::default()
        };
        let _ = engine.handle_event(LayoutEvent::WindowConstraintsChanged(w(1), constraints));
        assert_eq!(engine.tree().window_constraints(w(1)), Some(constraints));
    }
}
