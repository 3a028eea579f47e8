//! Injecting closures into a running simulation.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use lot_core::{ObstructionSpec, Pos, SimRng};
use lot_grid::{CellKind, GridMap};
use lot_motion::SimulationContext;

/// A free aisle with no published wait estimate, chosen uniformly.
pub fn random_closable_cell(grid: &GridMap, rng: &mut SimRng) -> Option<Pos> {
    let candidates: Vec<Pos> = grid
        .cells()
        .iter()
        .filter(|c| c.kind == CellKind::Aisle && c.wait_time == 0)
        .map(|c| c.pos)
        .collect();
    rng.choose(&candidates).copied()
}

/// Raises the closures listed in `SimConfig::obstructions`, one at a time.
///
/// Each closure waits its `delay_ticks`; every closure after the first also
/// waits until the replan coordinator has decided every agent affected by
/// the previous one.
pub struct EventMonitor {
    ctx:      Arc<SimulationContext>,
    rng:      SimRng,
    schedule: Vec<ObstructionSpec>,
}

impl EventMonitor {
    pub fn new(ctx: Arc<SimulationContext>, rng: SimRng) -> Self {
        let schedule = ctx.config.obstructions.clone();
        Self { ctx, rng, schedule }
    }

    /// Run [`run`][Self::run] on a thread named `event-monitor`.
    pub fn spawn(self) -> io::Result<JoinHandle<usize>> {
        thread::Builder::new()
            .name("event-monitor".into())
            .spawn(move || self.run())
    }

    /// Work through the schedule.  Returns the number of cells closed.
    pub fn run(mut self) -> usize {
        let schedule = std::mem::take(&mut self.schedule);
        let mut raised = 0;
        for (i, spec) in schedule.iter().enumerate() {
            if i > 0 && !self.wait_for_replans() {
                break;
            }
            if !self.pause(spec.delay_ticks) {
                break;
            }
            let cell = match spec.cell {
                Some(cell) => Some(cell),
                None => self.ctx.grid.with(|g| random_closable_cell(g, &mut self.rng)),
            };
            let Some(cell) = cell else {
                warn!("no closable aisle left");
                continue;
            };
            match self.ctx.raise_obstruction(cell) {
                Ok(()) => raised += 1,
                Err(e) => warn!(%cell, "closure skipped: {e}"),
            }
        }
        debug!(raised, "event monitor finished");
        raised
    }

    fn pause(&self, ticks: u64) -> bool {
        (0..ticks).all(|_| self.ctx.pause_tick())
    }

    /// One tick for executors to notice the last closure, then until the
    /// affected queue is idle.
    fn wait_for_replans(&self) -> bool {
        if !self.ctx.pause_tick() {
            return false;
        }
        let quantum = self.ctx.config.tick_quantum();
        while !self.ctx.affected.wait_idle(quantum) {
            if self.ctx.is_shutting_down() {
                return false;
            }
        }
        !self.ctx.is_shutting_down()
    }
}
