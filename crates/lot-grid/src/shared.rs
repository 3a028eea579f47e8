//! The lock discipline around the live grid.

use std::sync::Arc;

use parking_lot::Mutex;

use lot_core::{LotResult, Pos};

use crate::{Cell, CellKind, GridMap};

/// Cheaply cloneable handle to the one live [`GridMap`] of a run.
///
/// Every access takes the grid lock for the duration of one call and releases
/// it on every exit path (the guard is scoped to the call, including when the
/// closure passed to [`with`][Self::with] returns early or panics).
#[derive(Clone)]
pub struct SharedGrid {
    inner: Arc<Mutex<GridMap>>,
}

impl SharedGrid {
    pub fn new(grid: GridMap) -> Self {
        Self { inner: Arc::new(Mutex::new(grid)) }
    }

    /// Run `f` with exclusive access.  Use for compound updates that must be
    /// atomic to every other observer.
    pub fn with<R>(&self, f: impl FnOnce(&mut GridMap) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn is_passable(&self, pos: Pos) -> bool {
        self.inner.lock().is_passable(pos)
    }

    pub fn set_type(&self, pos: Pos, kind: CellKind) -> LotResult<()> {
        self.inner.lock().set_type(pos, kind)
    }

    /// Copy of one cell, `None` when out of bounds.
    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        self.inner.lock().cell(pos).cloned()
    }

    /// Copy of the whole grid.  The lock is held only for the copy.
    pub fn snapshot(&self) -> GridMap {
        self.inner.lock().clone()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        let g = self.inner.lock();
        (g.rows(), g.cols())
    }
}
