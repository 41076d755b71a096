//! Color-keyed shelf layout.
//!
//! The shelf is a 3x3 grid addressed `[row][column]`, row 0 at the bottom.
//! Only the row matters for placement: each row has a fixed lift height and
//! the drive leg handles the lateral position.

use crate::color::ColorId;

/// Lift heights per shelf row, bottom to top (mm).
pub const ROW_HEIGHTS_MM: [i16; 3] = [100, 180, 260];

/// Where each color belongs on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfMap {
    grid: [[ColorId; 3]; 3],
}

impl Default for ShelfMap {
    /// The stock layout: dark parts low, primaries in the middle, top empty.
    fn default() -> Self {
        use ColorId::*;
        Self {
            grid: [
                [Black, White, Yellow],
                [Green, Blue, Red],
                [None, None, None],
            ],
        }
    }
}

impl ShelfMap {
    pub fn new(grid: [[ColorId; 3]; 3]) -> Self {
        Self { grid }
    }

    /// Row index for `color`, scanning rows bottom-up and left to right.
    /// Unknown colors (and `None`) land on the bottom row.
    pub fn lookup_row(&self, color: ColorId) -> usize {
        if color == ColorId::None {
            return 0;
        }
        for (row, cells) in self.grid.iter().enumerate() {
            if cells.contains(&color) {
                return row;
            }
        }
        0
    }

    /// Lift height for `row`; out-of-range rows clamp to the top shelf.
    pub fn row_height_mm(row: usize) -> i16 {
        ROW_HEIGHTS_MM[row.min(ROW_HEIGHTS_MM.len() - 1)]
    }

    /// Placement height for `color`.
    pub fn height_for(&self, color: ColorId) -> i16 {
        Self::row_height_mm(self.lookup_row(color))
    }
}
