//! Fluent builder for constructing a [`Simulation`].

use std::sync::Arc;

use tracing::warn;

use lot_core::{LotError, Pos, SimConfig, SimRng};
use lot_grid::{CellKind, GridMap, SharedGrid};
use lot_motion::{LotObserver, NoopObserver, SimulationContext, Supervisor};
use lot_planner::PathPlanner;
use lot_replan::{EventMonitor, ReplanCoordinator};

use crate::{SimResult, Simulation};

/// Fluent builder for [`Simulation<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick quantum, dwell, entrance/exit, cost mode, seed, …
/// - [`GridMap`]: the finished lot layout (e.g. [`lot_grid::GridBuilder`])
/// - `P: PathPlanner`: the search (e.g. [`lot_planner::AStarPlanner`])
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default          |
/// |-----------------|------------------|
/// | `.observer(o)`  | `NoopObserver`   |
///
/// `build()` starts the replan coordinator and, when the config lists any
/// obstructions, the event monitor.
pub struct SimBuilder<P: PathPlanner> {
    config:   SimConfig,
    grid:     GridMap,
    planner:  P,
    observer: Option<Arc<dyn LotObserver>>,
}

impl<P: PathPlanner + 'static> SimBuilder<P> {
    pub fn new(config: SimConfig, grid: GridMap, planner: P) -> Self {
        Self { config, grid, planner, observer: None }
    }

    /// Receive assignment, leg, replan, and obstruction events.
    pub fn observer(mut self, observer: Arc<dyn LotObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate inputs, start the background threads, and return a running
    /// [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<P>> {
        self.config.validate()?;
        check_gate(&self.grid, self.config.entrance)?;
        check_gate(&self.grid, self.config.exit)?;

        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));
        let mut rng = SimRng::new(self.config.seed);
        let has_events = !self.config.obstructions.is_empty();

        let ctx = Arc::new(SimulationContext::new(
            self.config,
            SharedGrid::new(self.grid),
            observer,
        ));
        let planner = Arc::new(self.planner);
        let supervisor = Supervisor::new();

        let coordinator =
            ReplanCoordinator::new(Arc::clone(&ctx), Arc::clone(&planner), Arc::clone(&supervisor))
                .spawn()?;
        let monitor = has_events
            .then(|| EventMonitor::new(Arc::clone(&ctx), rng.child(1)).spawn())
            .transpose();
        let monitor = match monitor {
            Ok(m) => m,
            Err(e) => {
                ctx.request_shutdown();
                if coordinator.join().is_err() {
                    warn!("replan coordinator panicked");
                }
                return Err(e.into());
            }
        };

        Ok(Simulation::from_parts(ctx, planner, supervisor, coordinator, monitor))
    }
}

/// Entrance and exit must be in-bounds roadway.
fn check_gate(grid: &GridMap, pos: Pos) -> SimResult<()> {
    match grid.kind(pos) {
        Some(CellKind::Entrance | CellKind::Aisle) => Ok(()),
        Some(_) => Err(LotError::invalid(pos, "gate must be an entrance or aisle").into()),
        None => Err(LotError::invalid(pos, "out of bounds").into()),
    }
}
