/// Largest coordinate magnitude a table accepts. The distance between any two
/// accepted coordinates still fits in an `i32`.
pub const COORDINATE_LIMIT: i32 = i32::MAX / 2;

/// A point in table-local pixel space.
///
/// Coordinates are integers: nodes live on whole pixels, and two points are
/// the same point only when both coordinates match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis of a grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Both endpoints share the same y.
    Horizontal,
    /// Both endpoints share the same x.
    Vertical,
}

impl Orientation {
    /// Classify the segment between two points.
    ///
    /// Returns `None` for segments that are not axis-aligned and for
    /// zero-length segments.
    pub fn between(a: Point, b: Point) -> Option<Orientation> {
        if a == b {
            None
        } else if a.y == b.y {
            Some(Orientation::Horizontal)
        } else if a.x == b.x {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }

    /// The other axis.
    pub fn cross(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Bounding box with top-left origin coordinate system.
///
/// - `x0`: left edge
/// - `top`: top edge
/// - `x1`: right edge
/// - `bottom`: bottom edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    pub x0: i32,
    pub top: i32,
    pub x1: i32,
    pub bottom: i32,
}

impl BBox {
    pub fn new(x0: i32, top: i32, x1: i32, bottom: i32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            top: a.y.min(b.y),
            x1: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn pad(&self, margin: i32) -> BBox {
        BBox {
            x0: self.x0 - margin,
            top: self.top - margin,
            x1: self.x1 + margin,
            bottom: self.bottom + margin,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.top && p.y <= self.bottom
    }
}
