//! Text rendering of a grid snapshot.

use std::fmt::Write;

use lot_grid::{Cell, CellKind, GridMap};

/// One character for `cell`.
///
/// A published wait estimate wins over everything else and is shown as a
/// digit (`9` for nine or more).
pub fn glyph(cell: &Cell) -> char {
    if cell.wait_time > 0 {
        return char::from_digit(cell.wait_time.min(9), 10).unwrap_or('9');
    }
    match cell.kind {
        CellKind::Entrance | CellKind::Aisle => ' ',
        CellKind::Wall => '+',
        CellKind::ParkingSpace => '-',
        CellKind::ClosedAisle => '#',
        CellKind::Vehicle => cell.occupant.map_or('?', |a| a.glyph()),
    }
}

/// Render `grid` with row and column indices:
///
/// ```text
///     0 1 2 3
///   0 + - - +
///   1 -     -
/// ```
pub fn render(grid: &GridMap) -> String {
    let mut out = String::with_capacity((grid.rows() + 1) * (grid.cols() * 2 + 5));
    out.push_str("   ");
    for c in 0..grid.cols() {
        let _ = write!(out, "{:>2}", c % 100);
    }
    out.push('\n');
    for (r, row) in grid.iter_rows().enumerate() {
        let _ = write!(out, "{r:>3}");
        for cell in row {
            out.push(' ');
            out.push(glyph(cell));
        }
        out.push('\n');
    }
    out
}
