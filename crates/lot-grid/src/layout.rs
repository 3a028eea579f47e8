//! Map construction.
//!
//! [`GridBuilder`] is the only way drivers shape a grid before agents are
//! admitted.  The two reference lots reproduce the maps the simulator was
//! calibrated on:
//!
//! ```text
//! reference_lot (13 × 12)          large_lot (17 × 24)
//!   entrance (0,4), exit (0,4)       entrance (0,8), exit (0,8)
//! ```

use lot_core::Pos;

use crate::{CellKind, GridMap};

/// Fluent builder for a [`GridMap`].
///
/// Out-of-bounds writes are ignored so layout code can be written with loose
/// ranges.
pub struct GridBuilder {
    grid: GridMap,
}

impl GridBuilder {
    /// Start from a `rows × cols` grid of aisles.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { grid: GridMap::new(rows, cols) }
    }

    /// Start from a grid where every cell is `kind`.
    pub fn filled(rows: usize, cols: usize, kind: CellKind) -> Self {
        Self::new(rows, cols).rect(
            Pos::new(0, 0),
            Pos::new(rows as i32 - 1, cols as i32 - 1),
            kind,
        )
    }

    /// Set one cell.
    pub fn cell(mut self, pos: Pos, kind: CellKind) -> Self {
        if self.grid.in_bounds(pos) {
            // Nothing is occupied while building, so only `Vehicle` fails.
            let set = self.grid.set_type(pos, kind);
            debug_assert!(set.is_ok(), "cannot lay out {pos}: {set:?}");
        }
        self
    }

    /// Set every cell in the inclusive rectangle `from ..= to`.
    pub fn rect(mut self, from: Pos, to: Pos, kind: CellKind) -> Self {
        for r in from.row.min(to.row)..=from.row.max(to.row) {
            for c in from.col.min(to.col)..=from.col.max(to.col) {
                self = self.cell(Pos::new(r, c), kind);
            }
        }
        self
    }

    pub fn build(self) -> GridMap {
        self.grid
    }

    // ── Reference lots ────────────────────────────────────────────────────

    /// The 13 × 12 lot with a single entrance at (0,4).
    ///
    /// Parking spaces line the perimeter; three double-row islands sit
    /// between wall strips at rows 2, 5, 7 and 10.
    pub fn reference_lot() -> GridMap {
        let mut b = Self::new(13, 12);
        for corner in [Pos::new(0, 0), Pos::new(0, 11), Pos::new(12, 0), Pos::new(12, 11)] {
            b = b.cell(corner, CellKind::Wall);
        }
        b = b
            .rect(Pos::new(0, 1), Pos::new(0, 10), CellKind::ParkingSpace)
            .rect(Pos::new(12, 1), Pos::new(12, 10), CellKind::ParkingSpace)
            .rect(Pos::new(1, 0), Pos::new(11, 0), CellKind::ParkingSpace)
            .rect(Pos::new(1, 11), Pos::new(11, 11), CellKind::ParkingSpace)
            .cell(Pos::new(0, 4), CellKind::Entrance)
            .cell(Pos::new(0, 3), CellKind::Wall)
            .cell(Pos::new(0, 5), CellKind::Wall);

        for r in [2, 5, 7, 10] {
            for c in (2..=8).step_by(3) {
                b = b.rect(Pos::new(r, c), Pos::new(r, c + 1), CellKind::Wall);
            }
        }
        for r in [3, 4, 8, 9] {
            for c in (2..=8).step_by(3) {
                b = b.rect(Pos::new(r, c), Pos::new(r, c + 1), CellKind::ParkingSpace);
            }
        }
        b.build()
    }

    /// The 17 × 24 lot with its entrance at (0,8).
    pub fn large_lot() -> GridMap {
        let mut b = Self::new(17, 24);
        for corner in [Pos::new(0, 0), Pos::new(0, 23), Pos::new(16, 0), Pos::new(16, 23)] {
            b = b.cell(corner, CellKind::Wall);
        }
        b = b
            .rect(Pos::new(0, 1), Pos::new(0, 22), CellKind::ParkingSpace)
            .rect(Pos::new(16, 1), Pos::new(16, 22), CellKind::ParkingSpace)
            .rect(Pos::new(1, 0), Pos::new(15, 0), CellKind::ParkingSpace)
            .rect(Pos::new(1, 23), Pos::new(15, 23), CellKind::ParkingSpace)
            .cell(Pos::new(0, 8), CellKind::Entrance);

        for r in [2, 7, 9, 14] {
            for c in (2..=20).step_by(3) {
                b = b.rect(Pos::new(r, c), Pos::new(r, c + 1), CellKind::Wall);
            }
        }
        for rows in [3..=6, 10..=13] {
            for r in rows {
                for c in (2..=20).step_by(3) {
                    b = b.rect(Pos::new(r, c), Pos::new(r, c + 1), CellKind::ParkingSpace);
                }
            }
        }
        b.build()
    }
}
