//! Least-disruption replanning of interrupted agents.
//!
//! Each batch taken from the affected queue is processed shortest remaining
//! route first.  For every agent the coordinator:
//!
//! 1. resolves a usable destination, substituting a neighbour only when the
//!    original one has been closed;
//! 2. plans from the agent's cell on a fresh grid snapshot, forbidding the
//!    cell it just left;
//! 3. on failure retries once with that cell allowed (a U-turn);
//! 4. on success starts a new executor leg, otherwise marks the agent
//!    unsolvable and releases its reserved space.
//!
//! Earlier agents in a batch are already driving their new routes when later
//! ones are planned, so later plans see their published wait estimates.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use lot_core::{AgentId, Pos};
use lot_grid::GridMap;
use lot_motion::{
    AffectedAgentInfo, AgentFate, Leg, LegKind, ReplanOutcome, ReplanReport, SimulationContext,
    Supervisor,
};
use lot_planner::{PathPlanner, PlanRequest, Route};

/// Standing consumer of the affected queue.
pub struct ReplanCoordinator<P: PathPlanner> {
    ctx:        Arc<SimulationContext>,
    planner:    Arc<P>,
    supervisor: Arc<Supervisor>,
}

impl<P: PathPlanner + 'static> ReplanCoordinator<P> {
    pub fn new(ctx: Arc<SimulationContext>, planner: Arc<P>, supervisor: Arc<Supervisor>) -> Self {
        Self { ctx, planner, supervisor }
    }

    /// Run [`run`][Self::run] on a thread named `replan-coordinator`.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("replan-coordinator".into())
            .spawn(move || self.run())
    }

    /// Block on the affected queue and process batches until it is closed.
    pub fn run(&self) {
        while let Some(batch) = self.ctx.affected.take_batch() {
            if self.ctx.is_shutting_down() {
                batch.iter().for_each(|_| self.ctx.affected.finish_one());
                break;
            }
            self.process(batch);
        }
        debug!("replan coordinator stopped");
    }

    /// Process whatever is pending right now without blocking.
    pub fn drain_once(&self) -> Vec<ReplanReport> {
        let batch = self.ctx.affected.try_take_batch();
        self.process(batch)
    }

    fn process(&self, batch: Vec<AffectedAgentInfo>) -> Vec<ReplanReport> {
        if !batch.is_empty() {
            info!(agents = batch.len(), "replanning batch");
        }
        let mut reports = Vec::with_capacity(batch.len());
        for affected in batch {
            let outcome = self.replan_one(&affected);
            let report = self
                .ctx
                .ledger
                .lock()
                .record_replan(affected.agent, affected.remaining_len, outcome);
            self.ctx.observer().on_replan(&report);
            // Only now is the agent accounted for again (as a running leg or
            // a settled fate), so the queue may report idle.
            self.ctx.affected.finish_one();
            reports.push(report);
        }
        reports
    }

    fn replan_one(&self, affected: &AffectedAgentInfo) -> ReplanOutcome {
        let agent = affected.agent;
        let snapshot = self.ctx.grid.snapshot();

        let Some(target) = resolve_destination(&snapshot, affected) else {
            warn!(%agent, destination = %affected.destination, "no usable destination");
            return self.give_up(affected);
        };

        let Some((route, reentered)) = self.search(&snapshot, affected, target) else {
            return self.give_up(affected);
        };

        let route_len = route.len();
        let leg = Leg {
            agent,
            class: affected.class,
            kind: affected.leg,
            route: route.cells,
            previous: affected.previous,
            admission_index: affected.admission_index,
            replanned: true,
            carried_elapsed: affected.elapsed_ticks,
            carried_delay: affected.delay_ticks,
        };
        if let Err(e) = self.supervisor.spawn_leg(&self.ctx, leg) {
            warn!(%agent, "could not restart agent: {e}");
            return self.give_up(affected);
        }
        info!(%agent, %target, route_len, reentered, "rerouted");
        ReplanOutcome::Rerouted { route_len, destination: target, reentered }
    }

    /// Plan without the previous cell, then once more allowing it.
    fn search(
        &self,
        snapshot: &GridMap,
        affected: &AffectedAgentInfo,
        target: Pos,
    ) -> Option<(Route, bool)> {
        let request = PlanRequest::new(affected.current, target).class(affected.class);
        match self.planner.plan(snapshot, &request.no_go(affected.previous, false)) {
            Ok(route) => return Some((route, false)),
            Err(e) => debug!(agent = %affected.agent, "{e}; retrying with re-entry"),
        }
        match self.planner.plan(snapshot, &request.no_go(affected.previous, true)) {
            Ok(route) => Some((route, true)),
            Err(e) => {
                debug!(agent = %affected.agent, "{e}");
                None
            }
        }
    }

    /// Permanent failure: the agent stays where it stopped.
    fn give_up(&self, affected: &AffectedAgentInfo) -> ReplanOutcome {
        let agent = affected.agent;
        self.ctx.grid.with(|g| {
            g.set_moving(affected.current, agent, false);
            if let LegKind::Inbound { space } = affected.leg {
                g.vacate(space, agent);
            }
        });
        self.ctx.ledger.lock().set_fate(agent, AgentFate::Unsolvable);
        warn!(%agent, at = %affected.current, "unsolvable after obstruction");
        ReplanOutcome::Unsolvable
    }
}

/// The cell to plan to.
///
/// The original destination stays the target while its surface is still
/// roadway; a vehicle standing on it only delays arrival.  Once it is closed,
/// the first neighbour of it (of the parking space, for inbound legs) that is
/// passable or already held by the agent is used instead.
fn resolve_destination(grid: &GridMap, affected: &AffectedAgentInfo) -> Option<Pos> {
    if grid.is_traversable(affected.destination) {
        return Some(affected.destination);
    }
    let anchor = match affected.leg {
        LegKind::Inbound { space } => space,
        LegKind::Outbound => affected.destination,
    };
    anchor.neighbors().into_iter().find(|&n| usable_for(grid, n, affected.agent))
}

fn usable_for(grid: &GridMap, pos: Pos, agent: AgentId) -> bool {
    grid.cell(pos)
        .is_some_and(|c| c.is_passable() || (c.occupant == Some(agent) && c.surface.is_roadway()))
}
