//! Per-run bookkeeping: who was admitted, where each agent ended up, and how
//! long every leg took.

use rustc_hash::FxHashMap;

use lot_core::{AgentClass, AgentId, LotError, LotResult, Pos};

use crate::LegKind;

/// Static facts about an admitted agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub agent:           AgentId,
    pub class:           AgentClass,
    /// 0-based order of admission; cohort statistics slice on it.
    pub admission_index: usize,
    /// The parking space reserved at admission.
    pub space:           Pos,
}

/// Where an agent currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentFate {
    /// Admitted, waiting for its start cell to free up.
    Queued,
    /// Driving a granted route.
    EnRoute,
    /// Stopped by a closure; owned by the replan coordinator.
    Interrupted,
    /// Standing on its parking space.
    Parked,
    /// Drove off the grid through the exit.
    Departed,
    /// No route exists after a closure; the agent stays where it stopped.
    Unsolvable,
}

impl AgentFate {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentFate::Queued => "queued",
            AgentFate::EnRoute => "en-route",
            AgentFate::Interrupted => "interrupted",
            AgentFate::Parked => "parked",
            AgentFate::Departed => "departed",
            AgentFate::Unsolvable => "unsolvable",
        }
    }

    /// No executor or coordinator will touch this agent again unless the
    /// driver releases it.
    pub fn is_settled(self) -> bool {
        matches!(self, AgentFate::Parked | AgentFate::Departed | AgentFate::Unsolvable)
    }
}

/// One completed leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TravelRecord {
    pub agent:           AgentId,
    pub class:           AgentClass,
    pub leg:             LegKind,
    pub admission_index: usize,
    /// Ticks from leaving the queue to freeing the destination, settling
    /// included.
    pub elapsed_ticks:   u64,
    /// Ticks spent unable to enter the next cell (queue wait included).
    pub delay_ticks:     u64,
    /// Whether any part of the leg was driven on a replanned route.
    pub replanned:       bool,
}

/// What the coordinator decided for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplanOutcome {
    Rerouted {
        route_len:   usize,
        destination: Pos,
        /// The fallback search that may re-enter the previous cell was
        /// needed.
        reentered:   bool,
    },
    Unsolvable,
}

/// One coordinator decision, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplanReport {
    /// 0-based position in the global processing order.
    pub order:         usize,
    pub agent:         AgentId,
    pub remaining_len: usize,
    pub outcome:       ReplanOutcome,
}

/// Everything recorded during a run.  Lives behind the context's mutex.
#[derive(Default, Debug)]
pub struct Ledger {
    profiles: FxHashMap<AgentId, AgentProfile>,
    fates:    FxHashMap<AgentId, AgentFate>,
    parked:   FxHashMap<AgentId, Pos>,
    records:  Vec<TravelRecord>,
    replans:  Vec<ReplanReport>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Profiles ──────────────────────────────────────────────────────────

    /// Register a newly admitted agent and return its admission index.
    pub fn register(&mut self, agent: AgentId, class: AgentClass, space: Pos) -> LotResult<usize> {
        if self.profiles.contains_key(&agent) {
            return Err(LotError::DuplicateAgent(agent));
        }
        let admission_index = self.profiles.len();
        self.profiles.insert(agent, AgentProfile { agent, class, admission_index, space });
        self.fates.insert(agent, AgentFate::Queued);
        Ok(admission_index)
    }

    /// Undo [`register`][Self::register] for an admission that never
    /// started.  Admissions are expected from one driver thread, so this is
    /// always the most recent registration.
    pub fn unregister(&mut self, agent: AgentId) {
        self.profiles.remove(&agent);
        self.fates.remove(&agent);
    }

    pub fn profile(&self, agent: AgentId) -> Option<&AgentProfile> {
        self.profiles.get(&agent)
    }

    pub fn admitted(&self) -> usize {
        self.profiles.len()
    }

    // ── Fates ─────────────────────────────────────────────────────────────

    pub fn set_fate(&mut self, agent: AgentId, fate: AgentFate) {
        self.fates.insert(agent, fate);
    }

    pub fn fate(&self, agent: AgentId) -> Option<AgentFate> {
        self.fates.get(&agent).copied()
    }

    pub fn count_fate(&self, fate: AgentFate) -> usize {
        self.fates.values().filter(|&&f| f == fate).count()
    }

    // ── Parking ───────────────────────────────────────────────────────────

    pub fn park(&mut self, agent: AgentId, space: Pos) {
        self.parked.insert(agent, space);
        self.fates.insert(agent, AgentFate::Parked);
    }

    /// Remove `agent` from the parked registry, returning its space.
    pub fn unpark(&mut self, agent: AgentId) -> Option<Pos> {
        self.parked.remove(&agent)
    }

    pub fn parked_space(&self, agent: AgentId) -> Option<Pos> {
        self.parked.get(&agent).copied()
    }

    // ── Records ───────────────────────────────────────────────────────────

    pub fn record_leg(&mut self, record: TravelRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TravelRecord] {
        &self.records
    }

    /// Record a coordinator decision, stamping its processing order.
    pub fn record_replan(
        &mut self,
        agent: AgentId,
        remaining_len: usize,
        outcome: ReplanOutcome,
    ) -> ReplanReport {
        let report = ReplanReport { order: self.replans.len(), agent, remaining_len, outcome };
        self.replans.push(report);
        report
    }

    pub fn replans(&self) -> &[ReplanReport] {
        &self.replans
    }
}
