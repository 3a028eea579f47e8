//! Simulation time model and run configuration.
//!
//! # Design
//!
//! Every agent advances on its own thread, one cell per **tick**.  A tick is
//! a fixed wall-clock quantum (`SimConfig::tick_quantum_ms`, 1 s by default)
//! so concurrently running agents stay roughly in step without a global
//! barrier.  All counters reported for statistics (elapsed, delay, wait
//! estimates) are in ticks, never in wall-clock units, so results do not
//! depend on the quantum chosen.

use std::time::Duration;

use crate::{CostMode, LotError, LotResult, Pos};

// ── ObstructionSpec ───────────────────────────────────────────────────────────

/// One scheduled closure for the event monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObstructionSpec {
    /// Ticks to wait (after the previous closure resolved, or after start)
    /// before closing the cell.
    pub delay_ticks: u64,
    /// Cell to close.  `None` picks a random free aisle with no published
    /// wait time.
    pub cell: Option<Pos>,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically built in code by the driver or loaded from JSON (with the
/// `serde` feature) and passed to the simulation builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Wall-clock milliseconds per simulated tick.  Must be non-zero.
    pub tick_quantum_ms: u64,

    /// Settling countdown run by privileged agents on arrival, and the fixed
    /// term of every published wait estimate.  Default: 9.
    pub dwell_ticks: u32,

    /// Cell where admitted agents enter the grid.
    pub entrance: Pos,

    /// Cell released agents drive to.  May equal `entrance`.
    pub exit: Pos,

    /// Whether the congestion penalty is charged at all.
    pub cost_mode: CostMode,

    /// Master RNG seed.  The same seed always picks the same random cells.
    pub seed: u64,

    /// Closures injected by the event monitor, in order.  Empty = none.
    pub obstructions: Vec<ObstructionSpec>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_quantum_ms: 1_000,
            dwell_ticks:     9,
            entrance:        Pos::new(0, 4),
            exit:            Pos::new(0, 4),
            cost_mode:       CostMode::CongestionAware,
            seed:            42,
            obstructions:    Vec::new(),
        }
    }
}

impl SimConfig {
    /// The wall-clock length of one tick.
    #[inline]
    pub fn tick_quantum(&self) -> Duration {
        Duration::from_millis(self.tick_quantum_ms)
    }

    /// Reject configurations the runtime cannot honour.
    pub fn validate(&self) -> LotResult<()> {
        if self.tick_quantum_ms == 0 {
            return Err(LotError::Config("tick_quantum_ms must be non-zero".into()));
        }
        Ok(())
    }
}
