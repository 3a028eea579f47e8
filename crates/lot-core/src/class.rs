//! Agent class and cost-mode enums shared across the planning crates.
//!
//! Two behaviours are keyed on the class of an agent:
//!
//! | Class        | Congestion penalty | Settling countdown on arrival |
//! |--------------|--------------------|-------------------------------|
//! | `Privileged` | charged            | runs `dwell_ticks`            |
//! | `Exempt`     | never charged      | skipped                       |
//!
//! The penalty itself is further gated by the run-wide [`CostMode`].

/// The behavioural class of an agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentClass {
    /// Accounts for congestion left by earlier agents and performs the full
    /// reversing manoeuvre on arrival.
    #[default]
    Privileged,
    /// May wait without cost accounting and parks without settling.
    Exempt,
}

impl AgentClass {
    #[inline]
    pub fn sees_congestion(self) -> bool {
        matches!(self, AgentClass::Privileged)
    }

    #[inline]
    pub fn settles(self) -> bool {
        matches!(self, AgentClass::Privileged)
    }

    /// Human-readable label, useful for CSV column values.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentClass::Privileged => "privileged",
            AgentClass::Exempt     => "exempt",
        }
    }
}

impl std::fmt::Display for AgentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the planner charges the congestion wait penalty at all.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostMode {
    /// Plain unit-cost A*; published wait times are ignored.
    Traditional,
    /// Privileged agents pay for residual wait time on cells ahead.
    #[default]
    CongestionAware,
}

impl CostMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CostMode::Traditional     => "traditional",
            CostMode::CongestionAware => "congestion-aware",
        }
    }
}

impl std::fmt::Display for CostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
