//! Cell and crop value types.

use crate::geometry::BBox;

/// A table cell on the row/column grid.
///
/// Cells either come from a detector response or are synthesized to fill a
/// slot no detected cell covers (`is_new_cell`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub id: i64,
    /// Index of the first row covered.
    pub row: usize,
    /// Index of the first column covered.
    pub column: usize,
    /// Row span, at least 1.
    pub rows: usize,
    /// Column span, at least 1.
    pub columns: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Synthesized to fill a gap rather than reported by the detector.
    pub is_new_cell: bool,
    /// Started inside a slot already covered by another cell.
    pub is_submerged: bool,
}

impl Cell {
    /// Pixel box of the cell.
    pub fn bbox(&self) -> BBox {
        BBox::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether the cell covers grid slot `(row, column)`.
    pub fn covers(&self, row: usize, column: usize) -> bool {
        (self.row..self.row + self.rows).contains(&row)
            && (self.column..self.column + self.columns).contains(&column)
    }
}

/// A rectangle sent to the detector to re-split a sub-region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crop {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Crop {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Crop covering a bounding box.
    pub fn from_bbox(bbox: &BBox) -> Self {
        Self::new(bbox.x0, bbox.top, bbox.x1, bbox.bottom)
    }

    /// The crop as `[x1, y1, x2, y2]` in absolute values, the form the
    /// detector expects.
    pub fn get_crop(&self) -> [i32; 4] {
        [self.x1.abs(), self.y1.abs(), self.x2.abs(), self.y2.abs()]
    }
}
