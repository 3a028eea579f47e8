//! Row-major grid storage and the compound updates agents perform on it.
//!
//! Every method here is O(1) (or O(path) for the wait-estimate scan) so
//! callers holding the [`SharedGrid`][crate::SharedGrid] lock never hold it
//! for long.

use lot_core::{AgentId, LotError, LotResult, Pos};

use crate::{Cell, CellKind};

/// A fixed-size 2-D array of [`Cell`]s.
///
/// Cloning produces an independent snapshot; planners search snapshots so
/// the live grid lock is only held for the copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridMap {
    rows:  i32,
    cols:  i32,
    cells: Vec<Cell>,
}

impl GridMap {
    /// A `rows × cols` grid of plain aisle cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(Cell::new(Pos::new(r as i32, c as i32), CellKind::Aisle));
            }
        }
        Self { rows: rows as i32, cols: cols as i32, cells }
    }

    // ── Dimensions & lookup ───────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    /// Dense index of `pos`, or `None` when out of bounds.
    #[inline]
    pub fn index_of(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.row * self.cols + pos.col) as usize)
    }

    #[inline]
    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn cell_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        let i = self.index_of(pos)?;
        Some(&mut self.cells[i])
    }

    fn require_mut(&mut self, pos: Pos) -> LotResult<&mut Cell> {
        self.cell_mut(pos)
            .ok_or(LotError::invalid(pos, "out of bounds"))
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over rows, each a slice of `cols` cells.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.cols.max(1) as usize)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// In bounds and roadway, or a moving vehicle on roadway.
    #[inline]
    pub fn is_passable(&self, pos: Pos) -> bool {
        self.cell(pos).is_some_and(Cell::is_passable)
    }

    /// In bounds and expandable by a planner.
    #[inline]
    pub fn is_traversable(&self, pos: Pos) -> bool {
        self.cell(pos).is_some_and(Cell::is_traversable)
    }

    #[inline]
    pub fn kind(&self, pos: Pos) -> Option<CellKind> {
        self.cell(pos).map(|c| c.kind)
    }

    #[inline]
    pub fn wait_time(&self, pos: Pos) -> u32 {
        self.cell(pos).map_or(0, |c| c.wait_time)
    }

    /// First passable cardinal neighbour of `pos` (order: up, down, left,
    /// right).
    pub fn first_passable_neighbor(&self, pos: Pos) -> Option<Pos> {
        pos.neighbors().into_iter().find(|&n| self.is_passable(n))
    }

    /// Positions of every cell currently of kind `kind`, row-major.
    pub fn positions_of(&self, kind: CellKind) -> Vec<Pos> {
        self.cells
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.pos)
            .collect()
    }

    /// Every agent currently holding a cell, with the cell it holds.
    pub fn occupants(&self) -> Vec<(AgentId, Pos)> {
        self.cells
            .iter()
            .filter_map(|c| c.occupant.map(|a| (a, c.pos)))
            .collect()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Overwrite the kind of an unoccupied cell (map construction, closures).
    pub fn set_type(&mut self, pos: Pos, kind: CellKind) -> LotResult<()> {
        if kind == CellKind::Vehicle {
            return Err(LotError::invalid(pos, "vehicles are placed with occupy()"));
        }
        let cell = self.require_mut(pos)?;
        if cell.occupant.is_some() {
            return Err(LotError::invalid(pos, "cell is occupied"));
        }
        cell.kind = kind;
        cell.surface = kind;
        Ok(())
    }

    /// Put `agent` on `pos`.  The previous kind is kept as the surface.
    pub fn occupy(&mut self, pos: Pos, agent: AgentId, moving: bool) -> LotResult<()> {
        let cell = self.require_mut(pos)?;
        match cell.occupant {
            Some(holder) if holder != agent => {
                return Err(LotError::invalid(pos, "cell held by another agent"));
            }
            Some(_) => {}
            None => {
                if !matches!(
                    cell.kind,
                    CellKind::Entrance | CellKind::Aisle | CellKind::ParkingSpace
                ) {
                    return Err(LotError::invalid(pos, "cell cannot hold a vehicle"));
                }
                cell.surface = cell.kind;
                cell.kind = CellKind::Vehicle;
                cell.occupant = Some(agent);
            }
        }
        cell.is_moving = moving;
        Ok(())
    }

    /// Remove `agent` from `pos`, restoring the surface kind.  A no-op if the
    /// cell is not held by `agent`.
    pub fn vacate(&mut self, pos: Pos, agent: AgentId) {
        if let Some(cell) = self.cell_mut(pos) {
            if cell.occupant == Some(agent) {
                cell.kind = cell.surface;
                cell.occupant = None;
                cell.is_moving = false;
            }
        }
    }

    /// Mark whether the occupant of `pos` is mid-transit.
    pub fn set_moving(&mut self, pos: Pos, agent: AgentId, moving: bool) {
        if let Some(cell) = self.cell_mut(pos) {
            if cell.occupant == Some(agent) {
                cell.is_moving = moving;
            }
        }
    }

    /// The occupancy handshake: release `from` and take `to` in one step.
    ///
    /// Succeeds only when `agent` holds `from` and `to` is free for it.
    /// Returns `false` (and changes nothing) otherwise.
    pub fn try_advance(&mut self, from: Pos, to: Pos, agent: AgentId) -> bool {
        let from_held = self.cell(from).is_some_and(|c| c.occupant == Some(agent));
        let to_free = self.cell(to).is_some_and(|c| c.is_free_for(agent));
        if !from_held || !to_free {
            return false;
        }
        self.vacate(from, agent);
        // Cannot fail: `to` was checked free for `agent` above.
        self.occupy(to, agent, true).is_ok()
    }

    // ── Wait-time publication ─────────────────────────────────────────────

    /// Publish `agent`'s block estimate on `pos`.
    ///
    /// An agent may always revise its own estimate; it replaces another
    /// agent's estimate only with a strictly larger one, so the published
    /// value never understates any outstanding block.
    pub fn publish_wait(&mut self, pos: Pos, agent: AgentId, estimate: u32) {
        if let Some(cell) = self.cell_mut(pos) {
            let own = cell.wait_owner.is_none_or(|owner| owner == agent);
            if own || estimate > cell.wait_time {
                cell.wait_time = estimate;
                cell.wait_owner = Some(agent);
            }
        }
    }

    /// Withdraw `agent`'s estimate from `pos`, if it is the one published.
    pub fn clear_wait(&mut self, pos: Pos, agent: AgentId) {
        if let Some(cell) = self.cell_mut(pos) {
            if cell.wait_owner == Some(agent) {
                cell.wait_time = 0;
                cell.wait_owner = None;
            }
        }
    }

    /// Residual congestion along `path`: for every cell but the last, the
    /// part of its wait time that outlasts the tick at which it is reached.
    pub fn congestion_along(&self, path: &[Pos]) -> u32 {
        let ahead = path.len().saturating_sub(1);
        path[..ahead]
            .iter()
            .enumerate()
            .map(|(k, &p)| self.wait_time(p).saturating_sub(k as u32))
            .sum()
    }
}
