//! Binding of logical workspaces to physical monitors.
//!
//! Monitors are keyed by their anchor point (top-left corner of the frame)
//! because monitor ids are reassigned on every reconfiguration. Every
//! mutation is validated against forced assignments before any table is
//! touched; a rejected command returns `false` and leaves the tables as they
//! were.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tracing::{debug, info, trace, warn};

use super::monitor_rule::{MonitorDescription, resolve_forced_point};
use super::workspace_name::WorkspaceName;
use crate::common::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use crate::common::config::WorkspaceSettings;
use crate::sys::geometry::ScreenPoint;
use crate::sys::screen::Monitor;
use crate::sys::window::WindowHandle;

/// Upper bound when searching for a free numeric stub name.
const MAX_STUB_NUMBER: u32 = 1000;

new_key_type! {
    pub struct VirtualWorkspaceId;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualWorkspace {
    name: WorkspaceName,
    /// Anchor of the monitor this workspace was last shown on.
    assigned_point: Option<ScreenPoint>,
    windows: HashSet<WindowHandle>,
}

impl VirtualWorkspace {
    fn new(name: WorkspaceName) -> Self {
        Self {
            name,
            assigned_point: None,
            windows: HashSet::default(),
        }
    }

    pub fn name(&self) -> &WorkspaceName { &self.name }

    pub fn assigned_point(&self) -> Option<ScreenPoint> { self.assigned_point }

    pub fn contains_window(&self, handle: WindowHandle) -> bool { self.windows.contains(&handle) }

    pub fn windows(&self) -> impl Iterator<Item = WindowHandle> + '_ { self.windows.iter().copied() }

    pub fn window_count(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }
}

#[derive(Debug, Default)]
pub struct VirtualWorkspaceManager {
    workspaces: SlotMap<VirtualWorkspaceId, VirtualWorkspace>,
    name_to_id: HashMap<WorkspaceName, VirtualWorkspaceId>,
    visible_by_point: BTreeMap<ScreenPoint, VirtualWorkspaceId>,
    point_by_workspace: HashMap<VirtualWorkspaceId, ScreenPoint>,
    previous_by_point: BTreeMap<ScreenPoint, VirtualWorkspaceId>,
    window_to_workspace: HashMap<WindowHandle, VirtualWorkspaceId>,
    persistent: BTreeSet<WorkspaceName>,
    forced: HashMap<WorkspaceName, Vec<MonitorDescription>>,
    monitors: Vec<Monitor>,
    fallback_counter: usize,
    workspace_list_cache: Option<Vec<(VirtualWorkspaceId, WorkspaceName)>>,
}

impl VirtualWorkspaceManager {
    pub fn new(settings: &WorkspaceSettings) -> Self {
        let mut manager = Self::default();
        manager.apply_settings(settings);
        manager
    }

    /// Replaces persistent names and forced assignments. Persistent
    /// workspaces that do not exist yet are created.
    pub fn apply_settings(&mut self, settings: &WorkspaceSettings) {
        self.persistent = settings.persistent_names().into_iter().collect();
        self.forced = settings.forced_assignments().into_iter().collect();
        let persistent: Vec<_> = self.persistent.iter().cloned().collect();
        for name in persistent {
            self.get_or_create(name);
        }
    }

    fn get_or_create(&mut self, name: WorkspaceName) -> VirtualWorkspaceId {
        if let Some(&id) = self.name_to_id.get(&name) {
            return id;
        }
        let id = self.workspaces.insert(VirtualWorkspace::new(name.clone()));
        debug!(%name, ?id, "created workspace");
        self.name_to_id.insert(name, id);
        self.workspace_list_cache = None;
        id
    }

    /// Looks a workspace up by name, creating it when `create` is set.
    /// Invalid names never resolve.
    pub fn workspace_id(&mut self, name: &str, create: bool) -> Option<VirtualWorkspaceId> {
        let name: WorkspaceName = match name.parse() {
            Ok(name) => name,
            Err(err) => {
                debug!("Rejected workspace name: {err}");
                return None;
            }
        };
        match self.name_to_id.get(&name) {
            Some(&id) => Some(id),
            None if create => Some(self.get_or_create(name)),
            None => None,
        }
    }

    pub fn workspace_by_name(&self, name: &WorkspaceName) -> Option<VirtualWorkspaceId> {
        self.name_to_id.get(name).copied()
    }

    pub fn workspace_info(&self, id: VirtualWorkspaceId) -> Option<&VirtualWorkspace> {
        self.workspaces.get(id)
    }

    pub fn contains(&self, id: VirtualWorkspaceId) -> bool { self.workspaces.contains_key(id) }

    pub fn is_persistent(&self, id: VirtualWorkspaceId) -> bool {
        self.workspaces.get(id).is_some_and(|ws| self.persistent.contains(&ws.name))
    }

    pub fn monitors(&self) -> &[Monitor] { &self.monitors }

    pub fn monitor_at(&self, point: ScreenPoint) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.anchor() == point)
    }

    pub fn active_workspace(&self, point: ScreenPoint) -> Option<VirtualWorkspaceId> {
        self.visible_by_point.get(&point).copied()
    }

    pub fn previous_workspace(&self, point: ScreenPoint) -> Option<VirtualWorkspaceId> {
        self.previous_by_point.get(&point).copied()
    }

    pub fn visible_point(&self, id: VirtualWorkspaceId) -> Option<ScreenPoint> {
        self.point_by_workspace.get(&id).copied()
    }

    pub fn is_visible(&self, id: VirtualWorkspaceId) -> bool {
        self.point_by_workspace.contains_key(&id)
    }

    pub fn visible_workspaces(&self) -> impl Iterator<Item = (ScreenPoint, VirtualWorkspaceId)> + '_ {
        self.visible_by_point.iter().map(|(&point, &id)| (point, id))
    }

    pub fn monitor_for_workspace(&self, id: VirtualWorkspaceId) -> Option<&Monitor> {
        self.monitor_at(self.visible_point(id)?)
    }

    /// Anchor of the monitor a workspace is forced onto, if its rules match
    /// any connected monitor.
    pub fn forced_point(&self, id: VirtualWorkspaceId) -> Option<ScreenPoint> {
        let name = &self.workspaces.get(id)?.name;
        let descriptions = self.forced.get(name)?;
        resolve_forced_point(descriptions, &self.monitors)
    }

    fn allowed_on(&self, id: VirtualWorkspaceId, point: ScreenPoint) -> bool {
        self.forced_point(id).is_none_or(|forced| forced == point)
    }

    fn is_known_point(&self, point: ScreenPoint) -> bool { self.monitor_at(point).is_some() }

    fn unbind_point(&mut self, point: ScreenPoint) -> Option<VirtualWorkspaceId> {
        let id = self.visible_by_point.remove(&point)?;
        self.point_by_workspace.remove(&id);
        Some(id)
    }

    fn bind(&mut self, id: VirtualWorkspaceId, point: ScreenPoint) {
        self.visible_by_point.insert(point, id);
        self.point_by_workspace.insert(id, point);
        if let Some(ws) = self.workspaces.get_mut(id) {
            ws.assigned_point = Some(point);
        }
    }

    /// Shows `id` on the monitor anchored at `point`.
    ///
    /// The workspace previously shown there, and the point `id` leaves, both
    /// remember what they showed for back-and-forth. A point left empty by
    /// the move is filled with a stub workspace.
    pub fn set_active_workspace(&mut self, id: VirtualWorkspaceId, point: ScreenPoint) -> bool {
        trace_misc("set_active_workspace", || {
            if !self.contains(id) {
                warn!(?id, "Attempted to activate a non-existent workspace");
                return false;
            }
            if !self.is_known_point(point) {
                debug!(?point, "Rejected activation on an unknown monitor");
                return false;
            }
            if !self.allowed_on(id, point) {
                debug!(?id, ?point, "Rejected activation: workspace is forced elsewhere");
                return false;
            }
            if self.visible_point(id) == Some(point) {
                return true;
            }

            let vacated = self.visible_point(id);
            if let Some(old_point) = vacated {
                self.unbind_point(old_point);
                self.previous_by_point.insert(old_point, id);
            }
            if let Some(occupant) = self.unbind_point(point) {
                self.previous_by_point.insert(point, occupant);
            }
            self.bind(id, point);

            if let Some(old_point) = vacated {
                let stub = self.get_stub_workspace_id(old_point);
                self.bind(stub, old_point);
            }

            self.debug_check_bindings();
            true
        })
    }

    /// Picks the workspace to show on a monitor that has nothing better.
    pub fn get_stub_workspace_id(&mut self, point: ScreenPoint) -> VirtualWorkspaceId {
        if let Some(prev) = self.previous_workspace(point)
            && let Some(ws) = self.workspaces.get(prev)
            && !self.is_visible(prev)
            && self.allowed_on(prev, point)
            && ws.assigned_point == Some(point)
        {
            return prev;
        }

        let remembered = self
            .sorted_workspaces()
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| {
                !self.is_visible(id)
                    && self.allowed_on(id, point)
                    && self.workspaces[id].assigned_point == Some(point)
            });
        if let Some(id) = remembered {
            return id;
        }

        for n in 1..=MAX_STUB_NUMBER {
            let name = WorkspaceName::from_number(n);
            if self.persistent.contains(&name) {
                continue;
            }
            match self.name_to_id.get(&name).copied() {
                Some(id) => {
                    let ws = &self.workspaces[id];
                    if !self.is_visible(id) && ws.is_empty() && self.allowed_on(id, point) {
                        return id;
                    }
                }
                None => {
                    let forced_elsewhere = self.forced.get(&name).is_some_and(|descriptions| {
                        resolve_forced_point(descriptions, &self.monitors)
                            .is_some_and(|forced| forced != point)
                    });
                    if !forced_elsewhere {
                        return self.get_or_create(name);
                    }
                }
            }
        }

        loop {
            self.fallback_counter += 1;
            let Ok(name) = format!("workspace-{}", self.fallback_counter).parse::<WorkspaceName>()
            else {
                continue;
            };
            if !self.name_to_id.contains_key(&name) {
                warn!(%name, "No numeric stub name available");
                return self.get_or_create(name);
            }
        }
    }

    /// Stores a new monitor list. Rearranges bindings when the set of
    /// anchor points changed; returns whether it did.
    pub fn update_monitors(&mut self, monitors: Vec<Monitor>) -> bool {
        let old: BTreeSet<_> = self.monitors.iter().map(Monitor::anchor).collect();
        let new: BTreeSet<_> = monitors.iter().map(Monitor::anchor).collect();
        self.monitors = monitors;
        if old == new {
            return false;
        }
        self.rearrange_workspaces_on_monitors();
        true
    }

    /// Carries visible workspaces over to the nearest new anchor points.
    ///
    /// Pairs of (new point, old point) are matched greedily by squared
    /// distance, so an anchor that did not move always keeps its workspace.
    /// The closest pair overall is taken first, so when two new points want
    /// the same old point the nearer one wins regardless of point order.
    /// New points left unmatched get a stub.
    pub fn rearrange_workspaces_on_monitors(&mut self) {
        trace_misc("rearrange_workspaces_on_monitors", || {
            let new_points: BTreeSet<ScreenPoint> =
                self.monitors.iter().map(Monitor::anchor).collect();
            let old_bindings = std::mem::take(&mut self.visible_by_point);
            self.point_by_workspace.clear();

            let mut pairs = Vec::new();
            for &new_point in &new_points {
                for (&old_point, &id) in &old_bindings {
                    if self.allowed_on(id, new_point) {
                        pairs.push((new_point.distance_squared(old_point), new_point, old_point, id));
                    }
                }
            }
            pairs.sort_by_key(|&(dist, new_point, old_point, _)| (dist, new_point, old_point));

            let mut used_old = BTreeSet::new();
            for (_, new_point, old_point, id) in pairs {
                if self.visible_by_point.contains_key(&new_point) || used_old.contains(&old_point) {
                    continue;
                }
                used_old.insert(old_point);
                self.bind(id, new_point);
            }

            self.previous_by_point.retain(|point, _| new_points.contains(point));

            for &point in &new_points {
                if self.visible_by_point.contains_key(&point) {
                    continue;
                }
                let stub = self.get_stub_workspace_id(point);
                self.bind(stub, point);
            }

            info!(
                monitors = new_points.len(),
                visible = ?self.visible_by_point,
                "rearranged workspaces on monitors"
            );
            self.debug_check_bindings();
        })
    }

    /// Removes every workspace that is not persistent, not visible, not
    /// `focused` and has no windows. Returns the removed ids.
    pub fn garbage_collect_unused_workspaces(
        &mut self,
        focused: Option<VirtualWorkspaceId>,
    ) -> Vec<VirtualWorkspaceId> {
        let doomed: Vec<_> = self
            .workspaces
            .iter()
            .filter(|&(id, ws)| {
                !self.persistent.contains(&ws.name)
                    && !self.is_visible(id)
                    && Some(id) != focused
                    && ws.is_empty()
            })
            .map(|(id, _)| id)
            .collect();

        for &id in &doomed {
            if let Some(ws) = self.workspaces.remove(id) {
                debug!(name = %ws.name, "garbage collected workspace");
                self.name_to_id.remove(&ws.name);
            }
            self.previous_by_point.retain(|_, prev| *prev != id);
        }
        if !doomed.is_empty() {
            self.workspace_list_cache = None;
        }
        doomed
    }

    /// Exchanges the monitors of two visible workspaces.
    pub fn swap_workspaces(&mut self, a: VirtualWorkspaceId, b: VirtualWorkspaceId) -> bool {
        trace_misc("swap_workspaces", || {
            let (Some(point_a), Some(point_b)) = (self.visible_point(a), self.visible_point(b))
            else {
                debug!(?a, ?b, "Rejected swap: both workspaces must be visible");
                return false;
            };
            if a == b {
                return true;
            }
            if !self.allowed_on(a, point_b) || !self.allowed_on(b, point_a) {
                debug!(?a, ?b, "Rejected swap: forced assignment");
                return false;
            }
            self.bind(a, point_b);
            self.bind(b, point_a);
            self.debug_check_bindings();
            true
        })
    }

    /// Moves a visible workspace onto another monitor. The monitor it leaves
    /// gets a stub.
    pub fn move_workspace_to_monitor(&mut self, id: VirtualWorkspaceId, point: ScreenPoint) -> bool {
        let Some(current) = self.visible_point(id) else {
            debug!(?id, "Rejected move: workspace is not visible");
            return false;
        };
        if current == point {
            return false;
        }
        self.set_active_workspace(id, point)
    }

    /// Brings a workspace to `point`. If it is visible on another monitor the
    /// two monitors swap workspaces.
    pub fn summon_workspace(&mut self, id: VirtualWorkspaceId, point: ScreenPoint) -> bool {
        match (self.visible_point(id), self.active_workspace(point)) {
            (Some(current), _) if current == point => true,
            (Some(_), Some(occupant)) => self.swap_workspaces(id, occupant),
            _ => self.set_active_workspace(id, point),
        }
    }

    pub fn assign_window(&mut self, handle: WindowHandle, id: VirtualWorkspaceId) -> bool {
        if !self.contains(id) {
            warn!(?id, "Attempted to assign window to non-existent workspace");
            return false;
        }
        if let Some(old) = self.window_to_workspace.insert(handle, id)
            && let Some(ws) = self.workspaces.get_mut(old)
        {
            ws.windows.remove(&handle);
        }
        if let Some(ws) = self.workspaces.get_mut(id) {
            ws.windows.insert(handle);
        }
        true
    }

    pub fn remove_window(&mut self, handle: WindowHandle) -> Option<VirtualWorkspaceId> {
        let id = self.window_to_workspace.remove(&handle)?;
        if let Some(ws) = self.workspaces.get_mut(id) {
            ws.windows.remove(&handle);
        }
        Some(id)
    }

    pub fn workspace_for_window(&self, handle: WindowHandle) -> Option<VirtualWorkspaceId> {
        self.window_to_workspace.get(&handle).copied()
    }

    fn sorted_workspaces(&self) -> Vec<(VirtualWorkspaceId, &WorkspaceName)> {
        let mut workspaces: Vec<_> = self.workspaces.iter().map(|(id, ws)| (id, &ws.name)).collect();
        workspaces.sort_by(|a, b| a.1.cmp(b.1));
        workspaces
    }

    fn cycle_workspace(
        &self,
        current: VirtualWorkspaceId,
        skip_empty: Option<bool>,
        forward: bool,
    ) -> Option<VirtualWorkspaceId> {
        let skip_empty = skip_empty.unwrap_or(false);
        let ids: Vec<_> = self
            .sorted_workspaces()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|&id| id == current || !skip_empty || !self.workspaces[id].is_empty())
            .collect();
        let pos = ids.iter().position(|&id| id == current)?;
        let next = if forward {
            (pos + 1) % ids.len()
        } else {
            (pos + ids.len() - 1) % ids.len()
        };
        ids.get(next).copied()
    }

    pub fn next_workspace(
        &self,
        current: VirtualWorkspaceId,
        skip_empty: Option<bool>,
    ) -> Option<VirtualWorkspaceId> {
        self.cycle_workspace(current, skip_empty, true)
    }

    pub fn prev_workspace(
        &self,
        current: VirtualWorkspaceId,
        skip_empty: Option<bool>,
    ) -> Option<VirtualWorkspaceId> {
        self.cycle_workspace(current, skip_empty, false)
    }

    pub fn list_workspaces(&mut self) -> &[(VirtualWorkspaceId, WorkspaceName)] {
        if self.workspace_list_cache.is_none() {
            let list = self
                .sorted_workspaces()
                .into_iter()
                .map(|(id, name)| (id, name.clone()))
                .collect();
            self.workspace_list_cache = Some(list);
        }
        self.workspace_list_cache.as_deref().unwrap_or_default()
    }

    fn debug_check_bindings(&self) {
        debug_assert_eq!(self.visible_by_point.len(), self.point_by_workspace.len());
        debug_assert!(
            self.visible_by_point
                .iter()
                .all(|(point, id)| self.point_by_workspace.get(id) == Some(point))
        );
    }
}

fn trace_misc<T>(desc: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let end = Instant::now();
    trace!(time = ?(end - start), "{desc}");
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::screen::test_monitor;

    const P1: ScreenPoint = ScreenPoint::new(0, 0);
    const P2: ScreenPoint = ScreenPoint::new(1920, 0);
    const P3: ScreenPoint = ScreenPoint::new(-1920, 0);

    fn settings(persistent: &[&str], forced: &[(&str, &[&str])]) -> WorkspaceSettings {
        WorkspaceSettings {
            persistent: persistent.iter().map(|s| s.to_string()).collect(),
            force_assignment: forced
                .iter()
                .map(|(name, ds)| (name.to_string(), ds.iter().map(|d| d.to_string()).collect()))
                .collect(),
        }
    }

    fn one_monitor() -> Vec<Monitor> { vec![test_monitor(1, 0.0, 0.0, "Built-in")] }

    fn two_monitors() -> Vec<Monitor> {
        vec![test_monitor(1, 0.0, 0.0, "Built-in"), test_monitor(2, 1920.0, 0.0, "DELL U2720Q")]
    }

    fn manager(persistent: &[&str], forced: &[(&str, &[&str])]) -> VirtualWorkspaceManager {
        VirtualWorkspaceManager::new(&settings(persistent, forced))
    }

    fn name_of(m: &VirtualWorkspaceManager, id: Option<VirtualWorkspaceId>) -> Option<String> {
        id.map(|id| m.workspace_info(id).unwrap().name().to_string())
    }

    fn snapshot(
        m: &VirtualWorkspaceManager,
    ) -> (
        BTreeMap<ScreenPoint, VirtualWorkspaceId>,
        Vec<(VirtualWorkspaceId, ScreenPoint)>,
        BTreeMap<ScreenPoint, VirtualWorkspaceId>,
    ) {
        let mut by_ws: Vec<_> = m.point_by_workspace.iter().map(|(&id, &p)| (id, p)).collect();
        by_ws.sort();
        (m.visible_by_point.clone(), by_ws, m.previous_by_point.clone())
    }

    fn assert_exclusive(m: &VirtualWorkspaceManager) {
        let points: BTreeSet<_> = m.visible_by_point.keys().collect();
        let ids: BTreeSet<_> = m.visible_by_point.values().collect();
        assert_eq!(points.len(), m.visible_by_point.len());
        assert_eq!(ids.len(), m.visible_by_point.len());
        assert_eq!(m.point_by_workspace.len(), m.visible_by_point.len());
        for (point, id) in &m.visible_by_point {
            assert_eq!(m.point_by_workspace.get(id), Some(point));
        }
    }

    #[test]
    fn workspace_lookup_and_creation() {
        let mut m = manager(&["1"], &[]);
        let one = m.workspace_id("1", false).unwrap();
        assert_eq!(m.workspace_id("1", true), Some(one));
        assert_eq!(m.workspace_id("web", false), None);
        let web = m.workspace_id("web", true).unwrap();
        assert_ne!(web, one);
        assert_eq!(m.workspace_id("next", true), None);
        assert_eq!(m.workspace_id("", true), None);
    }

    #[test]
    fn first_monitor_gets_a_workspace() {
        let mut m = manager(&[], &[]);
        assert!(m.update_monitors(one_monitor()));
        assert_eq!(name_of(&m, m.active_workspace(P1)).as_deref(), Some("1"));
        assert!(!m.update_monitors(one_monitor()));
    }

    #[test]
    fn adding_a_monitor_keeps_the_existing_binding() {
        let mut m = manager(&[], &[]);
        m.update_monitors(one_monitor());
        let w1 = m.workspace_id("w1", true).unwrap();
        assert!(m.set_active_workspace(w1, P1));

        assert!(m.update_monitors(two_monitors()));
        assert_eq!(m.active_workspace(P1), Some(w1));
        let stub = m.active_workspace(P2).unwrap();
        assert_ne!(stub, w1);
        assert_exclusive(&m);
    }

    #[test]
    fn moved_monitors_carry_their_nearest_workspace() {
        let mut m = manager(&[], &[]);
        m.update_monitors(two_monitors());
        let a = m.workspace_id("a", true).unwrap();
        let b = m.workspace_id("b", true).unwrap();
        m.set_active_workspace(a, P1);
        m.set_active_workspace(b, P2);

        // The external display is now arranged at a higher resolution.
        let mut moved = two_monitors();
        moved[1].frame.origin.x = 2560.0;
        m.update_monitors(moved);
        assert_eq!(m.active_workspace(P1), Some(a));
        assert_eq!(m.active_workspace(ScreenPoint::new(2560, 0)), Some(b));

        m.update_monitors(one_monitor());
        assert_eq!(m.active_workspace(P1), Some(a));
        assert!(!m.is_visible(b));
        assert_eq!(m.previous_workspace(ScreenPoint::new(2560, 0)), None);
        assert_exclusive(&m);
    }

    #[test_log::test]
    fn set_active_workspace_tracks_previous() {
        let mut m = manager(&["1", "2"], &[]);
        m.update_monitors(one_monitor());
        let one = m.workspace_id("1", false).unwrap();
        let two = m.workspace_id("2", false).unwrap();
        assert!(m.set_active_workspace(one, P1));
        assert!(m.set_active_workspace(two, P1));
        assert_eq!(m.active_workspace(P1), Some(two));
        assert_eq!(m.previous_workspace(P1), Some(one));
        assert!(!m.is_visible(one));
        assert_exclusive(&m);
    }

    #[test]
    fn moving_a_visible_workspace_fills_the_vacated_monitor() {
        let mut m = manager(&["1", "2"], &[]);
        m.update_monitors(two_monitors());
        let one = m.workspace_id("1", false).unwrap();
        let two = m.workspace_id("2", false).unwrap();
        m.set_active_workspace(one, P1);
        m.set_active_workspace(two, P2);

        assert!(m.move_workspace_to_monitor(one, P2));
        assert_eq!(m.active_workspace(P2), Some(one));
        assert_eq!(m.previous_workspace(P2), Some(two));
        assert_eq!(m.previous_workspace(P1), Some(one));
        let stub = m.active_workspace(P1).unwrap();
        assert_ne!(stub, one);
        assert_exclusive(&m);

        assert!(!m.move_workspace_to_monitor(two, P1));
    }

    #[test]
    fn rejected_binding_leaves_state_untouched() {
        let mut m = manager(&["1", "mail"], &[("mail", &["secondary"])]);
        m.update_monitors(two_monitors());
        let mail = m.workspace_id("mail", false).unwrap();
        assert_eq!(m.forced_point(mail), Some(P2));

        let before = snapshot(&m);
        assert!(!m.set_active_workspace(mail, P1));
        assert_eq!(snapshot(&m), before);

        assert!(m.set_active_workspace(mail, P2));
        let before = snapshot(&m);
        assert!(!m.move_workspace_to_monitor(mail, P1));
        let other = m.active_workspace(P1).unwrap();
        assert!(!m.swap_workspaces(mail, other));
        assert!(!m.summon_workspace(mail, P1));
        assert_eq!(snapshot(&m), before);
    }

    #[test]
    fn forced_workspace_without_matching_monitor_is_unconstrained() {
        let mut m = manager(&["mail"], &[("mail", &["^projector$"])]);
        m.update_monitors(one_monitor());
        let mail = m.workspace_id("mail", false).unwrap();
        assert_eq!(m.forced_point(mail), None);
        assert!(m.set_active_workspace(mail, P1));
    }

    #[test]
    fn binding_stays_exclusive_across_switches() {
        let mut m = manager(&["1", "2", "3", "4"], &[]);
        m.update_monitors(vec![
            test_monitor(1, 0.0, 0.0, "Built-in"),
            test_monitor(2, 1920.0, 0.0, "DELL"),
            test_monitor(3, -1920.0, 0.0, "LG"),
        ]);
        let ids: Vec<_> = ["1", "2", "3", "4"]
            .iter()
            .map(|n| m.workspace_id(n, false).unwrap())
            .collect();
        let points = [P1, P2, P3];
        for step in 0..24 {
            let id = ids[(step * 7) % ids.len()];
            let point = points[(step * 5) % points.len()];
            assert!(m.set_active_workspace(id, point));
            assert_eq!(m.active_workspace(point), Some(id));
            assert_exclusive(&m);
            assert_eq!(m.visible_workspaces().count(), 3);
        }
    }

    #[test]
    fn stub_prefers_the_previous_workspace_of_the_point() {
        let mut m = manager(&[], &[]);
        m.update_monitors(two_monitors());
        let web = m.workspace_id("web", true).unwrap();
        m.set_active_workspace(web, P2);
        let chat = m.workspace_id("chat", true).unwrap();
        m.set_active_workspace(chat, P2);
        assert_eq!(m.previous_workspace(P2), Some(web));
        assert_eq!(m.get_stub_workspace_id(P2), web);
    }

    #[test]
    fn stub_skips_persistent_visible_and_busy_names() {
        let mut m = manager(&["1"], &[]);
        m.update_monitors(one_monitor());
        // "1" is persistent, so the first monitor got stub "2".
        assert_eq!(name_of(&m, m.active_workspace(P1)).as_deref(), Some("2"));
        let three = m.workspace_id("3", true).unwrap();
        m.assign_window(WindowHandle::new(1, 1), three);
        let stub = m.get_stub_workspace_id(ScreenPoint::new(5000, 0));
        assert_eq!(name_of(&m, Some(stub)).as_deref(), Some("4"));
    }

    #[test]
    fn stub_falls_back_to_a_workspace_last_seen_on_the_point() {
        let mut m = manager(&[], &[]);
        m.update_monitors(two_monitors());
        let notes = m.workspace_id("notes", true).unwrap();
        m.set_active_workspace(notes, P2);
        let chat = m.workspace_id("chat", true).unwrap();
        m.set_active_workspace(chat, P2);
        // The previous workspace of P2 is now visible on P1.
        m.set_active_workspace(notes, P1);
        assert_eq!(m.previous_workspace(P2), Some(notes));

        let stub = m.get_stub_workspace_id(P2);
        assert_eq!(name_of(&m, Some(stub)).as_deref(), Some("2"));
        assert_eq!(m.workspace_info(stub).unwrap().assigned_point(), Some(P2));
        // A point with no history takes the lowest free number instead.
        let fresh = m.get_stub_workspace_id(ScreenPoint::new(5000, 0));
        assert_eq!(name_of(&m, Some(fresh)).as_deref(), Some("1"));
    }

    #[test]
    fn stub_skips_names_forced_to_another_monitor() {
        let mut m = manager(&[], &[("1", &["secondary"])]);
        m.update_monitors(two_monitors());
        // "1" does not exist yet but belongs to P2.
        assert_eq!(name_of(&m, m.active_workspace(P1)).as_deref(), Some("2"));
        assert_eq!(name_of(&m, m.active_workspace(P2)).as_deref(), Some("1"));

        // Once it exists and is hidden it is still not offered to P1.
        let web = m.workspace_id("web", true).unwrap();
        m.set_active_workspace(web, P2);
        let one = m.workspace_id("1", false).unwrap();
        assert!(!m.is_visible(one));
        let stub = m.get_stub_workspace_id(P1);
        assert_eq!(name_of(&m, Some(stub)).as_deref(), Some("3"));
        assert_eq!(m.get_stub_workspace_id(P2), one);
    }

    #[test]
    fn rearrangement_respects_forced_assignments() {
        let mut m = manager(&["mail"], &[("mail", &["DELL.*"])]);
        m.update_monitors(two_monitors());
        let mail = m.workspace_id("mail", false).unwrap();
        assert!(m.set_active_workspace(mail, P2));
        let first = m.active_workspace(P1).unwrap();

        // The DELL moves to the left; another display takes its old place.
        assert!(m.update_monitors(vec![
            test_monitor(1, 0.0, 0.0, "Built-in"),
            test_monitor(2, 1920.0, 0.0, "LG HDR 4K"),
            test_monitor(3, -1920.0, 0.0, "DELL U2720Q"),
        ]));
        assert_eq!(m.active_workspace(P3), Some(mail));
        assert_eq!(m.active_workspace(P1), Some(first));
        let stub = m.active_workspace(P2).unwrap();
        assert_ne!(stub, mail);
        assert_eq!(name_of(&m, Some(stub)).as_deref(), Some("2"));
        assert_exclusive(&m);
    }

    #[test]
    fn garbage_collection_keeps_what_is_in_use() {
        let mut m = manager(&["1"], &[]);
        m.update_monitors(one_monitor());
        let visible = m.active_workspace(P1).unwrap();
        let focused = m.workspace_id("focused-ws", true).unwrap();
        let busy = m.workspace_id("busy", true).unwrap();
        let idle = m.workspace_id("idle", true).unwrap();
        m.assign_window(WindowHandle::new(3, 1), busy);

        let removed = m.garbage_collect_unused_workspaces(Some(focused));
        assert_eq!(removed, vec![idle]);
        assert!(m.workspace_info(idle).is_none());
        assert_eq!(m.workspace_id("idle", false), None);
        for id in [visible, focused, busy, m.workspace_id("1", false).unwrap()] {
            assert!(m.contains(id));
        }
        assert!(m.list_workspaces().iter().all(|(id, _)| *id != idle));
    }

    #[test]
    fn summon_swaps_when_visible_elsewhere() {
        let mut m = manager(&["1", "2", "3"], &[]);
        m.update_monitors(two_monitors());
        let one = m.workspace_id("1", false).unwrap();
        let two = m.workspace_id("2", false).unwrap();
        let three = m.workspace_id("3", false).unwrap();
        m.set_active_workspace(one, P1);
        m.set_active_workspace(two, P2);

        assert!(m.summon_workspace(two, P1));
        assert_eq!(m.active_workspace(P1), Some(two));
        assert_eq!(m.active_workspace(P2), Some(one));

        assert!(m.summon_workspace(three, P2));
        assert_eq!(m.active_workspace(P2), Some(three));
        assert!(!m.is_visible(one));
        assert_exclusive(&m);
    }

    #[test]
    fn window_membership_moves_between_workspaces() {
        let mut m = manager(&["1", "2"], &[]);
        let one = m.workspace_id("1", false).unwrap();
        let two = m.workspace_id("2", false).unwrap();
        let w = WindowHandle::new(7, 3);
        assert!(m.assign_window(w, one));
        assert!(m.assign_window(w, two));
        assert!(!m.workspace_info(one).unwrap().contains_window(w));
        assert_eq!(m.workspace_for_window(w), Some(two));
        assert_eq!(m.remove_window(w), Some(two));
        assert!(m.workspace_info(two).unwrap().is_empty());
    }

    #[test]
    fn navigation_follows_name_order() {
        let mut m = manager(&["1", "2", "10", "web"], &[]);
        let ids: Vec<_> = ["1", "2", "10", "web"]
            .iter()
            .map(|n| m.workspace_id(n, false).unwrap())
            .collect();
        assert_eq!(m.next_workspace(ids[1], None), Some(ids[2]));
        assert_eq!(m.next_workspace(ids[3], None), Some(ids[0]));
        assert_eq!(m.prev_workspace(ids[0], None), Some(ids[3]));

        m.assign_window(WindowHandle::new(1, 1), ids[3]);
        assert_eq!(m.next_workspace(ids[0], Some(true)), Some(ids[3]));

        let names: Vec<_> = m.list_workspaces().iter().map(|(_, n)| n.to_string()).collect();
        assert_eq!(names, ["1", "2", "10", "web"]);
    }
}
