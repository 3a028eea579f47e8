//! Observer hooks for logging and statistics collaborators.

use lot_core::{AgentId, Pos};

use crate::{AffectedAgentInfo, ReplanReport, TravelRecord};

/// Callbacks invoked by the runtime as agents progress.
///
/// Hooks fire on whichever worker thread produced the event, so
/// implementations must be `Send + Sync` and should return quickly; they are
/// never called with the grid lock held.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait LotObserver: Send + Sync {
    /// An agent was admitted and assigned `space`.
    fn on_assignment(&self, _agent: AgentId, _space: Pos) {}

    /// A leg finished at its destination.
    fn on_leg_complete(&self, _record: &TravelRecord) {}

    /// An executor stopped because its route crosses a closed cell.
    fn on_interrupted(&self, _info: &AffectedAgentInfo) {}

    /// The replan coordinator decided on one affected agent.
    fn on_replan(&self, _report: &ReplanReport) {}

    /// A cell was closed.
    fn on_obstruction(&self, _cell: Pos) {}
}

/// A [`LotObserver`] that does nothing.
pub struct NoopObserver;

impl LotObserver for NoopObserver {}
