use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Deceleration rate used by kinetic scrolling, per millisecond.
pub const DEFAULT_DECELERATION_RATE: f64 = 0.997;

/// Below this speed (px/s) a decay animation counts as stopped.
pub const DECAY_VELOCITY_THRESHOLD: f64 = 5.0;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationEasing {
    Linear,
    /// Smoothstep, `3t² − 2t³`.
    EaseInOut,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Sine,
    Power(i32),
    Expo,
    Circ,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    In,
    Out,
    InOut,
}

impl Shape {
    fn ease_in(self, t: f64) -> f64 {
        match self {
            Shape::Sine => 1.0 - (t * FRAC_PI_2).cos(),
            Shape::Power(n) => t.powi(n),
            Shape::Expo if t == 0.0 => 0.0,
            Shape::Expo => 2f64.powf(10.0 * t - 10.0),
            Shape::Circ => 1.0 - (1.0 - t * t).sqrt(),
        }
    }
}

impl AnimationEasing {
    fn shape(self) -> Option<(Shape, Mode)> {
        use AnimationEasing::*;
        let parts = match self {
            Linear | EaseInOut => return None,
            EaseInSine => (Shape::Sine, Mode::In),
            EaseOutSine => (Shape::Sine, Mode::Out),
            EaseInOutSine => (Shape::Sine, Mode::InOut),
            EaseInQuad => (Shape::Power(2), Mode::In),
            EaseOutQuad => (Shape::Power(2), Mode::Out),
            EaseInOutQuad => (Shape::Power(2), Mode::InOut),
            EaseInCubic => (Shape::Power(3), Mode::In),
            EaseOutCubic => (Shape::Power(3), Mode::Out),
            EaseInOutCubic => (Shape::Power(3), Mode::InOut),
            EaseInQuart => (Shape::Power(4), Mode::In),
            EaseOutQuart => (Shape::Power(4), Mode::Out),
            EaseInOutQuart => (Shape::Power(4), Mode::InOut),
            EaseInQuint => (Shape::Power(5), Mode::In),
            EaseOutQuint => (Shape::Power(5), Mode::Out),
            EaseInOutQuint => (Shape::Power(5), Mode::InOut),
            EaseInExpo => (Shape::Expo, Mode::In),
            EaseOutExpo => (Shape::Expo, Mode::Out),
            EaseInOutExpo => (Shape::Expo, Mode::InOut),
            EaseInCirc => (Shape::Circ, Mode::In),
            EaseOutCirc => (Shape::Circ, Mode::Out),
            EaseInOutCirc => (Shape::Circ, Mode::InOut),
        };
        Some(parts)
    }
}

/// Maps linear progress `t` in `[0, 1]` to eased progress. Out curves are
/// the mirror of their in curve; in-out curves join the two halves at 0.5.
pub fn ease_value(t: f64, easing: AnimationEasing) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let Some((shape, mode)) = easing.shape() else {
        return match easing {
            AnimationEasing::EaseInOut => t * t * (3.0 - 2.0 * t),
            _ => t,
        };
    };
    match mode {
        Mode::In => shape.ease_in(t),
        Mode::Out => 1.0 - shape.ease_in(1.0 - t),
        Mode::InOut if t < 0.5 => shape.ease_in(2.0 * t) / 2.0,
        Mode::InOut => 1.0 - shape.ease_in(2.0 - 2.0 * t) / 2.0,
    }
}

/// Ease-out cubic whose starting slope is `slope` (in progress units per
/// unit of `t`). Ends at 1 with zero slope. `slope == 3.0` is plain
/// ease-out cubic.
pub fn cubic_ease_out_with_velocity(t: f64, slope: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let base = 1.0 - f64::powi(1.0 - t, 3);
    base + (slope - 3.0) * t * (1.0 - t) * (1.0 - t)
}

/// Slope of [`cubic_ease_out_with_velocity`] at `t`.
pub fn cubic_ease_out_with_velocity_slope(t: f64, slope: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let base = 3.0 * (1.0 - t) * (1.0 - t);
    base + (slope - 3.0) * (1.0 - t) * (1.0 - 3.0 * t)
}

fn valid_rate(rate: f64) -> bool { rate > 0.0 && rate < 1.0 }

/// Distance travelled after `secs` when decelerating from `initial_velocity`.
/// Zero for a rate outside `(0, 1)`.
pub fn decay_position(initial_velocity: f64, rate: f64, secs: f64) -> f64 {
    if !valid_rate(rate) {
        return 0.0;
    }
    initial_velocity * (rate.powf(1000.0 * secs) - 1.0) / (1000.0 * rate.ln())
}

pub fn decay_velocity(initial_velocity: f64, rate: f64, secs: f64) -> f64 {
    initial_velocity * rate.powf(1000.0 * secs)
}

/// Seconds until a decay from `initial_velocity` drops below `threshold`.
pub fn decay_duration(initial_velocity: f64, rate: f64, threshold: f64) -> f64 {
    let speed = initial_velocity.abs();
    if !(speed > threshold) || !valid_rate(rate) {
        return 0.0;
    }
    (threshold / speed).ln() / (1000.0 * rate.ln())
}
