use serde::{Deserialize, Serialize};

/// Integer point (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Sub-pixel point, used for hull vertices and pivot points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer extent. Named `x`/`y` because sprite cells treat the two axes symmetrically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub x: i32,
    pub y: i32,
}

impl Size {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0
    }
}

/// Axis-aligned rectangle (pixels), half-open: `x0 = x`, `x1 = x + w`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn x0(&self) -> i32 {
        self.x
    }
    pub fn y0(&self) -> i32 {
        self.y
    }
    /// Exclusive right edge coordinate (`x + w`).
    pub fn x1(&self) -> i32 {
        self.x + self.w
    }
    /// Exclusive bottom edge coordinate (`y + h`).
    pub fn y1(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Grows the rectangle by `value` pixels on every side (shrinks for negative values).
    pub fn expand(&self, value: i32) -> Rect {
        Rect::new(
            self.x - value,
            self.y - value,
            self.w + value * 2,
            self.h + value * 2,
        )
    }

    /// Intersection; empty (zero-sized) when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x0().max(other.x0());
        let y0 = self.y0().max(other.y0());
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        Rect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    /// Smallest rectangle containing both.
    pub fn combine(&self, other: &Rect) -> Rect {
        let x0 = self.x0().min(other.x0());
        let y0 = self.y0().min(other.y0());
        let x1 = self.x1().max(other.x1());
        let y1 = self.y1().max(other.y1());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.x1() >= other.x1()
            && self.y1() >= other.y1()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        self.x <= p.x && self.y <= p.y && self.x1() > p.x && self.y1() > p.y
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x1() <= other.x
            || other.x1() <= self.x
            || self.y1() <= other.y
            || other.y1() <= self.y)
    }
}

/// Largest multiple of `q` not above `v`.
pub fn floor_multiple(v: i32, q: i32) -> i32 {
    (v / q) * q
}

/// Smallest multiple of `q` not below `v`.
pub fn ceil_multiple(v: i32, q: i32) -> i32 {
    ((v + q - 1) / q) * q
}

pub fn div_ceil(a: i64, b: i64) -> i64 {
    if b > 0 {
        (a + b - 1) / b
    } else {
        -1
    }
}

/// Smallest power of two not below `value` (1 for values below 2).
pub fn ceil_to_pot(value: i32) -> i32 {
    let mut pot = 1;
    while pot < value {
        pot <<= 1;
    }
    pot
}

/// Largest power of two not above `value` (0 for values below 1).
pub fn floor_to_pot(value: i32) -> i32 {
    let mut pot = 1;
    while pot <= value {
        pot <<= 1;
    }
    pot >> 1
}

pub fn isqrt(a: i64) -> i32 {
    (a as f64).sqrt() as i32
}
