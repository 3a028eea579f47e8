//! Closed cells and the run-wide obstruction flag.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use lot_core::Pos;

/// Record of every cell closed during the run.
///
/// The flag is an atomic so executors can test it every tick without taking
/// a lock; the cell list is only consulted once the flag is up.
#[derive(Default)]
pub struct ObstructionBoard {
    raised: AtomicBool,
    closed: Mutex<Vec<Pos>>,
}

impl ObstructionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `cell` as closed and raise the flag.
    pub fn record(&self, cell: Pos) {
        self.closed.lock().push(cell);
        self.raised.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// First closed cell found on `path`, if any.
    pub fn intersects(&self, path: &[Pos]) -> Option<Pos> {
        if !self.is_raised() {
            return None;
        }
        let closed = self.closed.lock();
        path.iter().copied().find(|p| closed.contains(p))
    }

    pub fn closed_cells(&self) -> Vec<Pos> {
        self.closed.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.closed.lock().len()
    }
}
