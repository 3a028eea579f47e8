//! Planner trait and the default A* implementation.
//!
//! # Search
//!
//! States are cells paired with the accumulated cost `g`.  The open list is a
//! min-heap on `f = g + h`; equal `f` values pop in push order (a sequence
//! number is the secondary key), which makes the returned optimal path
//! deterministic.  Neighbours expand in the fixed order up, down, left,
//! right, and are pushed only when they improve the best known cost for
//! their cell.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::trace;

use lot_core::{AgentClass, CostMode, Pos};
use lot_grid::GridMap;

use crate::{CostModel, PlanError, PlanResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a planning query: cells from start to target inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub cells: Vec<Pos>,
    /// Accumulated cost, including any congestion penalty.
    pub cost: u32,
}

impl Route {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn start(&self) -> Option<Pos> {
        self.cells.first().copied()
    }

    pub fn target(&self) -> Option<Pos> {
        self.cells.last().copied()
    }

    /// `true` if start and target are the same cell.
    pub fn is_trivial(&self) -> bool {
        self.cells.len() == 1
    }

    /// Number of moves needed to follow the route.
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

// ── PlanRequest ───────────────────────────────────────────────────────────────

/// One planning query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRequest {
    pub start:  Pos,
    pub target: Pos,
    pub class:  AgentClass,
    /// A cell the route must not enter unless `allow_reentry` is set.
    pub no_go:  Option<Pos>,
    pub allow_reentry: bool,
}

impl PlanRequest {
    pub fn new(start: Pos, target: Pos) -> Self {
        Self {
            start,
            target,
            class: AgentClass::default(),
            no_go: None,
            allow_reentry: true,
        }
    }

    pub fn class(mut self, class: AgentClass) -> Self {
        self.class = class;
        self
    }

    /// Forbid `cell` (typically the cell the agent just left) unless
    /// `allow_reentry` is `true`.
    pub fn no_go(mut self, cell: Option<Pos>, allow_reentry: bool) -> Self {
        self.no_go = cell;
        self.allow_reentry = allow_reentry;
        self
    }

    #[inline]
    fn forbids(&self, pos: Pos) -> bool {
        !self.allow_reentry && self.no_go == Some(pos)
    }
}

// ── PathPlanner trait ─────────────────────────────────────────────────────────

/// Pluggable path search.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the driver and the replan
/// coordinator share one planner across threads.
pub trait PathPlanner: Send + Sync {
    /// Search `grid` for a route satisfying `request`.
    fn plan(&self, grid: &GridMap, request: &PlanRequest) -> PlanResult<Route>;
}

// ── AStarPlanner ──────────────────────────────────────────────────────────────

/// 4-connected A* using a [`CostModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarPlanner {
    pub cost: CostModel,
}

impl AStarPlanner {
    pub fn new(mode: CostMode) -> Self {
        Self { cost: CostModel::new(mode) }
    }
}

impl PathPlanner for AStarPlanner {
    fn plan(&self, grid: &GridMap, request: &PlanRequest) -> PlanResult<Route> {
        astar(grid, &self.cost, request)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

const NO_PARENT: usize = usize::MAX;

fn astar(grid: &GridMap, cost: &CostModel, req: &PlanRequest) -> PlanResult<Route> {
    let (Some(start_idx), Some(target_idx)) = (grid.index_of(req.start), grid.index_of(req.target))
    else {
        let bad = if grid.in_bounds(req.start) { req.target } else { req.start };
        return Err(PlanError::OutOfBounds(bad));
    };

    if start_idx == target_idx {
        return Ok(Route { cells: vec![req.start], cost: 0 });
    }

    let n = grid.len();
    // best[i] = lowest g recorded for cell i so far.
    let mut best   = vec![u32::MAX; n];
    let mut parent = vec![NO_PARENT; n];
    best[start_idx] = 0;

    // Min-heap on (f, push sequence): equal f pops first-pushed first.
    let mut heap: BinaryHeap<Reverse<(u32, u64, usize, u32)>> = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Reverse((cost.heuristic(req.start, req.target), seq, start_idx, 0)));

    let cells = grid.cells();
    let mut expanded = 0usize;

    while let Some(Reverse((_, _, idx, g))) = heap.pop() {
        if idx == target_idx {
            trace!(expanded, cost = g, "route found");
            return Ok(Route { cells: reconstruct(grid, &parent, target_idx), cost: g });
        }

        // Skip stale heap entries.
        if g > best[idx] {
            continue;
        }
        expanded += 1;

        for next in cells[idx].pos.neighbors() {
            let Some(next_idx) = grid.index_of(next) else { continue };
            let cell = &cells[next_idx];
            if !cell.is_traversable() || req.forbids(next) {
                continue;
            }

            let new_g = g.saturating_add(cost.edge_cost(req.class, g, cell.wait_time));
            if new_g < best[next_idx] {
                best[next_idx] = new_g;
                parent[next_idx] = idx;
                seq += 1;
                let f = new_g.saturating_add(cost.heuristic(next, req.target));
                heap.push(Reverse((f, seq, next_idx, new_g)));
            }
        }
    }

    trace!(expanded, "search space exhausted");
    Err(PlanError::NoPathFound { from: req.start, to: req.target })
}

fn reconstruct(grid: &GridMap, parent: &[usize], target_idx: usize) -> Vec<Pos> {
    let cells = grid.cells();
    let mut path = Vec::new();
    let mut cur = target_idx;
    loop {
        path.push(cells[cur].pos);
        match parent[cur] {
            NO_PARENT => break,
            p => cur = p,
        }
    }
    path.reverse();
    path
}
