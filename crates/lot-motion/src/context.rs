//! The state one simulation run shares between the driver, every executor,
//! the replan coordinator, and the event monitor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::warn;

use lot_core::{LotError, LotResult, Pos, SimConfig};
use lot_grid::{CellKind, SharedGrid};

use crate::{AffectedQueue, Ledger, LotObserver, ObstructionBoard};

/// Shared run state.  Always handled through an `Arc`.
pub struct SimulationContext {
    pub config:       SimConfig,
    pub grid:         SharedGrid,
    pub obstructions: ObstructionBoard,
    pub affected:     AffectedQueue,
    pub ledger:       Mutex<Ledger>,
    observer:         Arc<dyn LotObserver>,
    shutdown:         AtomicBool,
}

impl SimulationContext {
    pub fn new(config: SimConfig, grid: SharedGrid, observer: Arc<dyn LotObserver>) -> Self {
        Self {
            config,
            grid,
            obstructions: ObstructionBoard::new(),
            affected: AffectedQueue::new(),
            ledger: Mutex::new(Ledger::new()),
            observer,
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn observer(&self) -> &dyn LotObserver {
        self.observer.as_ref()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Ask every worker to stop at its next tick boundary and wake the
    /// coordinator.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.affected.close();
    }

    /// Sleep one tick quantum.  Returns `false` if shutdown was requested.
    pub fn pause_tick(&self) -> bool {
        if self.is_shutting_down() {
            return false;
        }
        thread::sleep(self.config.tick_quantum());
        !self.is_shutting_down()
    }

    // ── Obstructions ──────────────────────────────────────────────────────

    /// Close `cell` and raise the obstruction flag.
    ///
    /// The cell must be an unoccupied aisle.  The grid is updated before the
    /// flag goes up, so an executor that has not yet seen the flag still
    /// cannot drive into the closed cell.
    pub fn raise_obstruction(&self, cell: Pos) -> LotResult<()> {
        self.grid.with(|g| match g.kind(cell) {
            Some(CellKind::Aisle) => g.set_type(cell, CellKind::ClosedAisle),
            Some(CellKind::Vehicle) => Err(LotError::invalid(cell, "cell is occupied")),
            Some(_) => Err(LotError::invalid(cell, "only aisles can be closed")),
            None => Err(LotError::invalid(cell, "out of bounds")),
        })?;
        self.obstructions.record(cell);
        warn!(%cell, "obstruction raised");
        self.observer.on_obstruction(cell);
        Ok(())
    }
}
