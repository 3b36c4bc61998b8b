use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self { Self { origin, size } }

    pub const fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Size::new(width, height))
    }

    #[inline]
    pub fn min_x(&self) -> f64 { self.origin.x }

    #[inline]
    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    #[inline]
    pub fn min_y(&self) -> f64 { self.origin.y }

    #[inline]
    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && self.max_x() > other.min_x()
            && self.min_y() < other.max_y()
            && self.max_y() > other.min_y()
    }
}

pub trait Round {
    fn round(&self) -> Self;
}

impl Round for Point {
    fn round(&self) -> Self { Point::new(self.x.round(), self.y.round()) }
}

impl Round for Size {
    fn round(&self) -> Self { Size::new(self.width.round(), self.height.round()) }
}

impl Round for Rect {
    // Round edges rather than origin and size so adjacent rects stay flush.
    fn round(&self) -> Self {
        let min_x = self.min_x().round();
        let min_y = self.min_y().round();
        let max_x = self.max_x().round();
        let max_y = self.max_y().round();
        Rect::from_xywh(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Integer screen coordinate used as a stable hash key for monitors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }

    pub fn distance_squared(self, other: ScreenPoint) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

impl From<Point> for ScreenPoint {
    fn from(value: Point) -> Self {
        Self {
            x: value.x.round() as i32,
            y: value.y.round() as i32,
        }
    }
}

impl From<ScreenPoint> for Point {
    fn from(value: ScreenPoint) -> Self { Point::new(f64::from(value.x), f64::from(value.y)) }
}
