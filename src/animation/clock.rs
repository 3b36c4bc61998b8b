use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Shared monotonic clock that every animation samples.
///
/// Clones share the same time source. Tests can pin the time with
/// [`Clock::set_time`] or make all animations report their end value with
/// [`Clock::set_complete_instantly`].
#[derive(Debug, Clone, Default)]
pub struct Clock {
    inner: Rc<RefCell<ClockInner>>,
}

#[derive(Debug)]
struct ClockInner {
    epoch: Instant,
    manual: Option<Duration>,
    complete_instantly: bool,
}

impl Default for ClockInner {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
            manual: None,
            complete_instantly: false,
        }
    }
}

impl Clock {
    pub fn new() -> Self { Self::default() }

    /// A clock that only moves when told to.
    pub fn manual(time: Duration) -> Self {
        let clock = Self::default();
        clock.set_time(time);
        clock
    }

    pub fn now(&self) -> Duration {
        let inner = self.inner.borrow();
        inner.manual.unwrap_or_else(|| inner.epoch.elapsed())
    }

    pub fn set_time(&self, time: Duration) { self.inner.borrow_mut().manual = Some(time); }

    pub fn advance(&self, by: Duration) {
        let now = self.now();
        self.set_time(now + by);
    }

    pub fn set_complete_instantly(&self, value: bool) {
        self.inner.borrow_mut().complete_instantly = value;
    }

    pub fn should_complete_instantly(&self) -> bool { self.inner.borrow().complete_instantly }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = Clock::manual(Duration::from_millis(10));
        let other = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(other.now(), Duration::from_millis(15));

        other.set_complete_instantly(true);
        assert!(clock.should_complete_instantly());
    }

    #[test]
    fn real_time_is_monotonic() {
        let clock = Clock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
