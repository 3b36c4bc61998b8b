//! Time-driven value curves.
//!
//! An [`Animation`] is a pure function of the shared [`Clock`]: reading it
//! evaluates the curve at the clock's current time. Nothing is scheduled, and
//! an animation is cancelled by dropping it.

use std::time::Duration;

mod clock;
mod curve;

pub use clock::Clock;
pub use curve::{
    AnimationEasing, DECAY_VELOCITY_THRESHOLD, DEFAULT_DECELERATION_RATE,
    cubic_ease_out_with_velocity, decay_duration, ease_value,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Eased(AnimationEasing),
    /// Ease-out cubic starting with the given normalized slope.
    CubicVelocity { slope: f64 },
    Decay { initial_velocity: f64, rate: f64 },
}

#[derive(Debug, Clone)]
pub struct Animation {
    clock: Clock,
    from: f64,
    to: f64,
    start: Duration,
    duration: Duration,
    curve: Curve,
}

impl Animation {
    pub fn new(
        clock: Clock,
        from: f64,
        to: f64,
        duration: Duration,
        easing: AnimationEasing,
    ) -> Self {
        let start = clock.now();
        Self {
            clock,
            from,
            to,
            start,
            duration,
            curve: Curve::Eased(easing),
        }
    }

    /// Ease-out cubic that starts moving at `initial_velocity` (px/s), so a
    /// retargeted animation continues smoothly from the one it replaces.
    pub fn with_velocity(
        clock: Clock,
        from: f64,
        to: f64,
        initial_velocity: f64,
        duration: Duration,
    ) -> Self {
        let distance = to - from;
        let secs = duration.as_secs_f64();
        let slope = if distance.abs() > f64::EPSILON && secs > 0.0 {
            initial_velocity * secs / distance
        } else {
            3.0
        };
        let start = clock.now();
        Self {
            clock,
            from,
            to,
            start,
            duration,
            curve: Curve::CubicVelocity { slope },
        }
    }

    /// Kinetic deceleration from `initial_velocity` (px/s).
    pub fn decay(clock: Clock, from: f64, initial_velocity: f64, rate: f64) -> Self {
        let secs = curve::decay_duration(initial_velocity, rate, DECAY_VELOCITY_THRESHOLD);
        let to = from + curve::decay_position(initial_velocity, rate, secs);
        let start = clock.now();
        Self {
            clock,
            from,
            to,
            start,
            duration: Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO),
            curve: Curve::Decay { initial_velocity, rate },
        }
    }

    /// Identity animation: already finished at `value`.
    pub fn settled(clock: Clock, value: f64) -> Self {
        let start = clock.now();
        Self {
            clock,
            from: value,
            to: value,
            start,
            duration: Duration::ZERO,
            curve: Curve::Eased(AnimationEasing::Linear),
        }
    }

    fn elapsed(&self) -> Duration { self.clock.now().saturating_sub(self.start) }

    fn value_at(&self, elapsed: Duration) -> f64 {
        if self.clock.should_complete_instantly() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        match self.curve {
            Curve::Eased(easing) => self.from + (self.to - self.from) * ease_value(t, easing),
            Curve::CubicVelocity { slope } => {
                self.from + (self.to - self.from) * cubic_ease_out_with_velocity(t, slope)
            }
            Curve::Decay { initial_velocity, rate } => {
                self.from + curve::decay_position(initial_velocity, rate, elapsed.as_secs_f64())
            }
        }
    }

    pub fn value(&self) -> f64 { self.value_at(self.elapsed()) }

    /// Instantaneous velocity in px/s; zero once finished.
    pub fn velocity(&self) -> f64 {
        if self.is_done() {
            return 0.0;
        }
        let elapsed = self.elapsed();
        let secs = self.duration.as_secs_f64();
        let t = elapsed.as_secs_f64() / secs;
        match self.curve {
            Curve::Eased(_) => {
                let step = Duration::from_millis(1);
                (self.value_at(elapsed + step) - self.value_at(elapsed)) / step.as_secs_f64()
            }
            Curve::CubicVelocity { slope } => {
                (self.to - self.from) * curve::cubic_ease_out_with_velocity_slope(t, slope) / secs
            }
            Curve::Decay { initial_velocity, rate } => {
                curve::decay_velocity(initial_velocity, rate, elapsed.as_secs_f64())
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.clock.should_complete_instantly() || self.elapsed() >= self.duration
    }

    pub fn from(&self) -> f64 { self.from }

    pub fn target(&self) -> f64 { self.to }

    pub fn duration(&self) -> Duration { self.duration }

    /// Shifts both endpoints, leaving progress untouched.
    pub fn offset(&mut self, delta: f64) {
        self.from += delta;
        self.to += delta;
    }
}
