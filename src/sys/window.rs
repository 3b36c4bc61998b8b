use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Stable identity of one real window.
///
/// Only valid for the lifetime of the owning process. `element` is the
/// platform reference needed to move the window; it does not take part in
/// equality or hashing.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct WindowHandle {
    pub pid: i32,
    pub idx: u32,
    pub element: u64,
}

impl WindowHandle {
    pub const fn new(pid: i32, idx: u32) -> WindowHandle { WindowHandle { pid, idx, element: 0 } }

    pub const fn with_element(self, element: u64) -> WindowHandle {
        WindowHandle { element, ..self }
    }
}

impl PartialEq for WindowHandle {
    fn eq(&self, other: &Self) -> bool { self.pid == other.pid && self.idx == other.idx }
}

impl Eq for WindowHandle {}

impl Hash for WindowHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
        self.idx.hash(state);
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pid, self.idx)
    }
}
