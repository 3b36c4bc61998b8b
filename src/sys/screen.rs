use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::{Point, Rect, ScreenPoint};
use crate::common::collections::BTreeSet;

/// Enumeration index of a monitor. Not stable across reconfiguration; bind
/// against [`Monitor::anchor`] instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MonitorId(u32);

impl MonitorId {
    pub const fn new(id: u32) -> MonitorId { MonitorId(id) }

    pub fn get(&self) -> u32 { self.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: MonitorId,
    pub display_id: u32,
    pub frame: Rect,
    pub visible_frame: Rect,
    pub name: String,
}

impl Monitor {
    /// Top-left corner of the full frame.
    pub fn anchor(&self) -> ScreenPoint { ScreenPoint::from(self.frame.origin) }

    pub fn is_main(&self) -> bool { self.frame.origin == Point::ZERO }
}

/// Source of the live monitor list.
pub trait System {
    fn monitors(&self) -> Vec<Monitor>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyChange {
    /// Any observable monitor input changed.
    pub config_changed: bool,
    /// The set of anchor points changed; bindings need rearranging.
    pub anchors_changed: bool,
}

/// Owned cache of the monitor topology, keyed by a hash of every observable
/// monitor input.
pub struct ScreenCache<S: System> {
    system: S,
    token: Option<u64>,
    monitors: Vec<Monitor>,
    anchors: BTreeSet<ScreenPoint>,
}

impl<S: System> ScreenCache<S> {
    pub fn new(system: S) -> ScreenCache<S> {
        ScreenCache {
            system,
            token: None,
            monitors: Vec::new(),
            anchors: BTreeSet::new(),
        }
    }

    /// Re-reads the monitor list from the system.
    ///
    /// The main monitor (if any) is always first. The cached list is only
    /// replaced when the configuration token differs from the previous one.
    pub fn update_screen_config(&mut self) -> TopologyChange {
        let mut monitors = self.system.monitors();
        if let Some(main_idx) = monitors.iter().position(Monitor::is_main) {
            monitors.swap(0, main_idx);
        } else if !monitors.is_empty() {
            warn!("Could not find main monitor. monitors={monitors:?}");
        }

        let token = configuration_token(&monitors);
        if self.token == Some(token) {
            return TopologyChange {
                config_changed: false,
                anchors_changed: false,
            };
        }

        let anchors: BTreeSet<_> = monitors.iter().map(Monitor::anchor).collect();
        let anchors_changed = anchors != self.anchors;
        debug!(?token, monitors = monitors.len(), anchors_changed, "monitor config updated");

        self.token = Some(token);
        self.monitors = monitors;
        self.anchors = anchors;
        TopologyChange {
            config_changed: true,
            anchors_changed,
        }
    }

    pub fn monitors(&self) -> &[Monitor] { &self.monitors }

    pub fn token(&self) -> Option<u64> { self.token }

    pub fn monitor_at(&self, point: ScreenPoint) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.anchor() == point)
    }
}

pub fn configuration_token(monitors: &[Monitor]) -> u64 {
    let mut hasher = FxHasher::default();
    monitors.len().hash(&mut hasher);
    for monitor in monitors {
        monitor.id.hash(&mut hasher);
        monitor.display_id.hash(&mut hasher);
        monitor.name.hash(&mut hasher);
        for rect in [monitor.frame, monitor.visible_frame] {
            for v in [rect.origin.x, rect.origin.y, rect.size.width, rect.size.height] {
                v.to_bits().hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

/// Monitors ordered left to right, then top to bottom.
pub fn sorted_by_position(monitors: &[Monitor]) -> Vec<&Monitor> {
    let mut sorted: Vec<_> = monitors.iter().collect();
    sorted.sort_by_key(|m| {
        let anchor = m.anchor();
        (anchor.x, anchor.y)
    });
    sorted
}

#[cfg(test)]
pub(crate) fn test_monitor(id: u32, x: f64, y: f64, name: &str) -> Monitor {
    let frame = Rect::from_xywh(x, y, 1920.0, 1080.0);
    Monitor {
        id: MonitorId::new(id),
        display_id: id,
        frame,
        visible_frame: Rect::from_xywh(x, y + 25.0, 1920.0, 1055.0),
        name: name.to_string(),
    }
}
