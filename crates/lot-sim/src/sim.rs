//! The `Simulation` facade.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use lot_core::{AgentClass, AgentId, LotError, Pos, SimRng};
use lot_grid::{CellKind, GridMap, SharedGrid};
use lot_motion::{
    AgentFate, Leg, LegKind, ReplanOutcome, ReplanReport, SimulationContext, Supervisor, TravelRecord,
};
use lot_planner::{PathPlanner, PlanRequest};

use crate::{SimError, SimResult};

/// A running lot simulation.
///
/// Agents move on their own threads from the moment they are admitted; the
/// driver only injects work and reads results.  Every method takes `&self`
/// except [`shutdown`][Self::shutdown].
///
/// Create via [`SimBuilder`][crate::SimBuilder].  Dropping a `Simulation`
/// shuts it down.
pub struct Simulation<P: PathPlanner> {
    ctx:         Arc<SimulationContext>,
    planner:     Arc<P>,
    supervisor:  Arc<Supervisor>,
    coordinator: Option<JoinHandle<()>>,
    monitor:     Option<JoinHandle<usize>>,
}

impl<P: PathPlanner> Simulation<P> {
    pub(crate) fn from_parts(
        ctx: Arc<SimulationContext>,
        planner: Arc<P>,
        supervisor: Arc<Supervisor>,
        coordinator: JoinHandle<()>,
        monitor: Option<JoinHandle<usize>>,
    ) -> Self {
        Self { ctx, planner, supervisor, coordinator: Some(coordinator), monitor }
    }

    // ── Driver operations ─────────────────────────────────────────────────

    /// Admit `agent` at the entrance and send it to `space`.
    ///
    /// The space is reserved immediately; the agent drives to the first
    /// passable neighbour of the space and settles onto it.  Fails without
    /// side effects if `space` is not a free parking space, it has no
    /// passable neighbour, the identity is taken, or no route exists.
    pub fn admit_agent(&self, space: Pos, agent: AgentId, class: AgentClass) -> SimResult<()> {
        let admission_index = self.ctx.ledger.lock().register(agent, class, space)?;

        let reserved = self.ctx.grid.with(|g| -> SimResult<Pos> {
            match g.kind(space) {
                Some(CellKind::ParkingSpace) => {}
                Some(_) => return Err(LotError::invalid(space, "not a free parking space").into()),
                None => return Err(LotError::invalid(space, "out of bounds").into()),
            }
            let approach = g
                .first_passable_neighbor(space)
                .ok_or(LotError::invalid(space, "no passable neighbour"))?;
            g.occupy(space, agent, false)?;
            Ok(approach)
        });
        let approach = match reserved {
            Ok(approach) => approach,
            Err(e) => {
                self.ctx.ledger.lock().unregister(agent);
                return Err(e);
            }
        };

        let request = PlanRequest::new(self.ctx.config.entrance, approach).class(class);
        let started = self
            .planner
            .plan(&self.ctx.grid.snapshot(), &request)
            .map_err(SimError::from)
            .and_then(|route| {
                debug!(%agent, %space, len = route.len(), cost = route.cost, "admission route");
                let leg =
                    Leg::new(agent, class, LegKind::Inbound { space }, route.cells, admission_index);
                self.supervisor.spawn_leg(&self.ctx, leg).map_err(SimError::from)
            });
        if let Err(e) = started {
            self.ctx.grid.with(|g| g.vacate(space, agent));
            self.ctx.ledger.lock().unregister(agent);
            warn!(%agent, %space, "admission failed: {e}");
            return Err(e);
        }

        info!(%agent, %space, %class, "admitted");
        self.ctx.observer().on_assignment(agent, space);
        Ok(())
    }

    /// Send a parked agent from its space to the exit.
    ///
    /// The agent pulls out onto the first passable neighbour of its space;
    /// the space becomes a free parking space again.  Fails without side
    /// effects if the agent is not parked or no route to the exit exists.
    pub fn release_agent(&self, agent: AgentId) -> SimResult<()> {
        let (space, profile) = {
            let ledger = self.ctx.ledger.lock();
            let profile = *ledger.profile(agent).ok_or(LotError::AgentNotFound(agent))?;
            let space = ledger.parked_space(agent).ok_or(SimError::NotParked(agent))?;
            (space, profile)
        };

        let snapshot = self.ctx.grid.snapshot();
        let start = snapshot
            .first_passable_neighbor(space)
            .ok_or(LotError::invalid(space, "no passable neighbour"))?;
        let request = PlanRequest::new(start, self.ctx.config.exit).class(profile.class);
        let route = self.planner.plan(&snapshot, &request)?;

        self.ctx.grid.with(|g| g.vacate(space, agent));
        {
            let mut ledger = self.ctx.ledger.lock();
            ledger.unpark(agent);
            ledger.set_fate(agent, AgentFate::Queued);
        }
        let leg = Leg::new(
            agent,
            profile.class,
            LegKind::Outbound,
            route.cells,
            profile.admission_index,
        );
        if let Err(e) = self.supervisor.spawn_leg(&self.ctx, leg) {
            // Put the agent back on its space.
            self.ctx.grid.with(|g| g.occupy(space, agent, false))?;
            self.ctx.ledger.lock().park(agent, space);
            return Err(e.into());
        }
        info!(%agent, %space, "released");
        Ok(())
    }

    /// Close `cell` now.  Agents whose remaining route crosses it are
    /// rerouted by the coordinator.
    pub fn trigger_obstruction(&self, cell: Pos) -> SimResult<()> {
        self.ctx.raise_obstruction(cell)?;
        Ok(())
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// `(agent, elapsed ticks)` of every completed inbound leg, in admission
    /// order.
    pub fn completion_stats(&self) -> Vec<(AgentId, u64)> {
        let mut inbound: Vec<TravelRecord> = self
            .travel_records()
            .into_iter()
            .filter(|r| matches!(r.leg, LegKind::Inbound { .. }))
            .collect();
        inbound.sort_by_key(|r| r.admission_index);
        inbound.into_iter().map(|r| (r.agent, r.elapsed_ticks)).collect()
    }

    /// Every completed leg, in completion order.
    pub fn travel_records(&self) -> Vec<TravelRecord> {
        self.ctx.ledger.lock().records().to_vec()
    }

    /// Coordinator decisions, in processing order.
    pub fn replan_reports(&self) -> Vec<ReplanReport> {
        self.ctx.ledger.lock().replans().to_vec()
    }

    pub fn fate(&self, agent: AgentId) -> Option<AgentFate> {
        self.ctx.ledger.lock().fate(agent)
    }

    /// The agent's fate, or `UnsolvableAfterObstruction` if a closure left
    /// it without a route.
    pub fn outcome(&self, agent: AgentId) -> SimResult<AgentFate> {
        match self.fate(agent) {
            Some(AgentFate::Unsolvable) => Err(SimError::UnsolvableAfterObstruction(agent)),
            Some(fate) => Ok(fate),
            None => Err(LotError::AgentNotFound(agent).into()),
        }
    }

    /// Agents a closure left without any route, in replan order.
    pub fn unsolvable_agents(&self) -> Vec<AgentId> {
        self.ctx
            .ledger
            .lock()
            .replans()
            .iter()
            .filter(|r| r.outcome == ReplanOutcome::Unsolvable)
            .map(|r| r.agent)
            .collect()
    }

    // ── Grid access ───────────────────────────────────────────────────────

    /// Copy of the live grid (for rendering).
    pub fn snapshot(&self) -> GridMap {
        self.ctx.grid.snapshot()
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.ctx.grid
    }

    pub fn context(&self) -> &Arc<SimulationContext> {
        &self.ctx
    }

    /// Every unreserved parking space, row-major.
    pub fn free_spaces(&self) -> Vec<Pos> {
        self.ctx.grid.with(|g| g.positions_of(CellKind::ParkingSpace))
    }

    /// A uniformly chosen unreserved parking space.
    pub fn random_free_space(&self, rng: &mut SimRng) -> Option<Pos> {
        rng.choose(&self.free_spaces()).copied()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Legs still running.
    pub fn active_agents(&self) -> usize {
        self.supervisor.active()
    }

    /// Block until no leg is running and no interrupted agent awaits a
    /// decision, or `timeout` elapses.  Returns whether the run settled.
    ///
    /// An agent stuck behind a stationary one never finishes, so this can
    /// time out on a healthy run.
    pub fn wait_settled(&self, timeout: Duration) -> bool {
        let ctx = &self.ctx;
        self.supervisor
            .wait_until(timeout, ctx.config.tick_quantum(), || ctx.affected.is_idle())
    }

    /// Stop every worker at its next tick boundary and join all threads.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        let Some(coordinator) = self.coordinator.take() else { return };
        self.ctx.request_shutdown();
        if coordinator.join().is_err() {
            warn!("replan coordinator panicked");
        }
        if let Some(monitor) = self.monitor.take() {
            match monitor.join() {
                Ok(raised) => debug!(raised, "event monitor joined"),
                Err(_) => warn!("event monitor panicked"),
            }
        }
        self.supervisor.join_all();
        info!("simulation shut down");
    }
}

impl<P: PathPlanner> Drop for Simulation<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
