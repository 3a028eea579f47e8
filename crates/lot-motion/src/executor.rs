//! The per-agent motion state machine.
//!
//! ```text
//!   Queued ──start cell free──▶ Moving ──route done──▶ Arrived
//!                                 │
//!                                 └──closed cell ahead──▶ Interrupted
//! ```
//!
//! A `MotionExecutor` owns one leg of one agent and runs to completion on its
//! own thread.  Every grid access goes through the shared grid lock and is
//! released before the executor sleeps.

use std::sync::Arc;

use tracing::{debug, info, trace};

use lot_core::{AgentClass, AgentId, Pos};

use crate::{AffectedAgentInfo, AgentFate, SimulationContext, TravelRecord};

/// Direction of a leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegKind {
    /// Entrance to the approach cell beside `space`; on arrival the agent
    /// settles onto `space`, which it has held in reserve since admission.
    Inbound { space: Pos },
    /// From beside the parking space to the exit, then off the grid.
    Outbound,
}

impl LegKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LegKind::Inbound { .. } => "inbound",
            LegKind::Outbound => "outbound",
        }
    }
}

/// One granted route for one agent.
#[derive(Clone, Debug)]
pub struct Leg {
    pub agent:           AgentId,
    pub class:           AgentClass,
    pub kind:            LegKind,
    /// Cells to drive, start cell first.  Never empty.
    pub route:           Vec<Pos>,
    /// Cell the agent left just before this leg began (replanned legs).
    pub previous:        Option<Pos>,
    pub admission_index: usize,
    /// Set on legs issued by the replan coordinator.
    pub replanned:       bool,
    /// Counters carried over from the interrupted part of a replanned leg.
    pub carried_elapsed: u64,
    pub carried_delay:   u64,
}

impl Leg {
    pub fn new(
        agent: AgentId,
        class: AgentClass,
        kind: LegKind,
        route: Vec<Pos>,
        admission_index: usize,
    ) -> Self {
        Self {
            agent,
            class,
            kind,
            route,
            previous: None,
            admission_index,
            replanned: false,
            carried_elapsed: 0,
            carried_delay: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    Queued,
    Moving,
    Interrupted,
    Arrived,
}

/// How a run of [`MotionExecutor::run`] ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MotionOutcome {
    Arrived(TravelRecord),
    /// Handed to the affected queue.
    Interrupted,
    /// Shutdown was requested; the agent was left where it stood.
    Cancelled,
}

/// Drives one [`Leg`] to its destination.
pub struct MotionExecutor {
    ctx:     Arc<SimulationContext>,
    leg:     Leg,
    state:   MotionState,
    /// Index into `leg.route` of the cell currently held.
    cursor:  usize,
    previous: Option<Pos>,
    elapsed: u64,
    delay:   u64,
}

impl MotionExecutor {
    pub fn new(ctx: Arc<SimulationContext>, leg: Leg) -> Self {
        let previous = leg.previous;
        let (elapsed, delay) = (leg.carried_elapsed, leg.carried_delay);
        Self { ctx, leg, state: MotionState::Queued, cursor: 0, previous, elapsed, delay }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    fn current(&self) -> Pos {
        self.leg.route[self.cursor]
    }

    fn destination(&self) -> Pos {
        self.leg.route[self.leg.route.len() - 1]
    }

    fn remaining(&self) -> &[Pos] {
        &self.leg.route[self.cursor..]
    }

    /// Run the state machine to completion on the calling thread.
    pub fn run(mut self) -> MotionOutcome {
        if self.leg.route.is_empty() {
            return MotionOutcome::Cancelled;
        }
        if !self.enter_grid() {
            return MotionOutcome::Cancelled;
        }
        self.state = MotionState::Moving;
        self.ctx.ledger.lock().set_fate(self.leg.agent, AgentFate::EnRoute);
        debug!(
            agent = %self.leg.agent,
            leg = self.leg.kind.as_str(),
            len = self.leg.route.len(),
            "leg started"
        );

        loop {
            if self.ctx.is_shutting_down() {
                return MotionOutcome::Cancelled;
            }
            if let Some(cell) = self.ctx.obstructions.intersects(self.remaining()) {
                self.hand_off(cell);
                return MotionOutcome::Interrupted;
            }
            if self.cursor + 1 == self.leg.route.len() {
                return match self.settle() {
                    Some(record) => MotionOutcome::Arrived(record),
                    None => MotionOutcome::Cancelled,
                };
            }
            self.step();
            if !self.ctx.pause_tick() {
                return MotionOutcome::Cancelled;
            }
        }
    }

    /// Queued: wait until the start cell can be claimed.
    fn enter_grid(&mut self) -> bool {
        let (agent, start) = (self.leg.agent, self.current());
        loop {
            if self.ctx.is_shutting_down() {
                return false;
            }
            let entered = self.ctx.grid.with(|g| {
                let free = g.cell(start).is_some_and(|c| c.is_free_for(agent));
                free && g.occupy(start, agent, true).is_ok()
            });
            if entered {
                self.publish_estimate();
                return true;
            }
            debug!(%agent, %start, "start cell busy");
            self.delay += 1;
            self.elapsed += 1;
            if !self.ctx.pause_tick() {
                return false;
            }
        }
    }

    /// Moving: one tick of the handshake.
    fn step(&mut self) {
        let agent = self.leg.agent;
        let from = self.current();
        let to = self.leg.route[self.cursor + 1];
        let moved = self.ctx.grid.with(|g| {
            let moved = g.try_advance(from, to, agent);
            if !moved {
                g.set_moving(from, agent, false);
            }
            moved
        });
        if moved {
            trace!(%agent, %from, %to, "advanced");
            self.previous = Some(from);
            self.cursor += 1;
        } else {
            self.delay += 1;
            debug!(%agent, %from, %to, "blocked");
        }
        self.elapsed += 1;
        self.publish_estimate();
    }

    /// Publish `len + dwell + residual congestion` on the destination.
    fn publish_estimate(&self) {
        let (agent, dest) = (self.leg.agent, self.destination());
        let dwell = self.ctx.config.dwell_ticks;
        let remaining = self.remaining();
        self.ctx.grid.with(|g| {
            let estimate = remaining.len() as u32 + dwell + g.congestion_along(remaining);
            g.publish_wait(dest, agent, estimate);
        });
    }

    /// Arrived: count down on the destination (privileged agents only), free
    /// it, and record the leg.
    fn settle(&mut self) -> Option<TravelRecord> {
        let (agent, dest) = (self.leg.agent, self.destination());
        self.state = MotionState::Arrived;
        if self.leg.class.settles() {
            for j in (1..=self.ctx.config.dwell_ticks).rev() {
                self.ctx.grid.with(|g| {
                    g.set_moving(dest, agent, false);
                    g.publish_wait(dest, agent, j);
                });
                self.elapsed += 1;
                if !self.ctx.pause_tick() {
                    return None;
                }
            }
        }

        self.ctx.grid.with(|g| {
            g.clear_wait(dest, agent);
            g.vacate(dest, agent);
            // Parked agents stay on their reserved space as stationary vehicles.
            if let LegKind::Inbound { space } = self.leg.kind {
                g.set_moving(space, agent, false);
            }
        });

        let record = TravelRecord {
            agent,
            class: self.leg.class,
            leg: self.leg.kind,
            admission_index: self.leg.admission_index,
            elapsed_ticks: self.elapsed,
            delay_ticks: self.delay,
            replanned: self.leg.replanned,
        };
        {
            let mut ledger = self.ctx.ledger.lock();
            match self.leg.kind {
                LegKind::Inbound { space } => ledger.park(agent, space),
                LegKind::Outbound => ledger.set_fate(agent, AgentFate::Departed),
            }
            ledger.record_leg(record);
        }
        info!(
            %agent,
            leg = self.leg.kind.as_str(),
            elapsed = self.elapsed,
            delay = self.delay,
            "leg complete"
        );
        self.ctx.observer().on_leg_complete(&record);
        Some(record)
    }

    /// Interrupted: stop in place and hand ownership to the coordinator.
    fn hand_off(&mut self, closed: Pos) {
        let (agent, current, dest) = (self.leg.agent, self.current(), self.destination());
        self.state = MotionState::Interrupted;
        self.ctx.grid.with(|g| {
            g.set_moving(current, agent, false);
            g.clear_wait(dest, agent);
        });
        let remaining = self.remaining().to_vec();
        let info = AffectedAgentInfo {
            agent,
            class: self.leg.class,
            leg: self.leg.kind,
            remaining_len: remaining.len(),
            remaining,
            current,
            previous: self.previous,
            destination: dest,
            admission_index: self.leg.admission_index,
            elapsed_ticks: self.elapsed,
            delay_ticks: self.delay,
        };
        self.ctx.ledger.lock().set_fate(agent, AgentFate::Interrupted);
        info!(%agent, %current, %closed, remaining = info.remaining_len, "interrupted");
        self.ctx.observer().on_interrupted(&info);
        self.ctx.affected.push(info);
    }
}
