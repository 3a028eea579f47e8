//! Grid coordinate type.
//!
//! `Pos` uses signed components so that neighbour arithmetic at the grid edge
//! produces an out-of-bounds coordinate instead of wrapping; the grid rejects
//! it in its bounds check.

use std::fmt;

/// A `(row, col)` cell coordinate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

/// Cardinal offsets in the fixed expansion order: up, down, left, right.
pub const CARDINAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Pos {
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The four cardinal neighbours in the order up, down, left, right.
    /// Coordinates may be negative or past the grid edge.
    #[inline]
    pub fn neighbors(self) -> [Pos; 4] {
        CARDINAL.map(|(dr, dc)| Pos::new(self.row + dr, self.col + dc))
    }

    /// Manhattan distance, the exact step count on an open 4-connected grid.
    #[inline]
    pub fn manhattan(self, other: Pos) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// `true` if `other` is exactly one cardinal step away.
    #[inline]
    pub fn is_adjacent(self, other: Pos) -> bool {
        self.manhattan(other) == 1
    }
}

impl From<(i32, i32)> for Pos {
    #[inline]
    fn from((row, col): (i32, i32)) -> Self {
        Pos::new(row, col)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
