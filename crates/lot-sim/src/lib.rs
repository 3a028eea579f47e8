//! `lot-sim`: the driver-facing facade of the lotsim engine.
//!
//! # Threads of one run
//!
//! ```text
//!   driver ── admit_agent / release_agent / trigger_obstruction
//!     │
//!     ├─ agent-<id> × N      MotionExecutor per active leg (Supervisor)
//!     ├─ replan-coordinator  blocks on the affected queue, reroutes
//!     └─ event-monitor       raises the closures listed in SimConfig
//! ```
//!
//! All of them share one [`SimulationContext`][lot_motion::SimulationContext];
//! every grid mutation goes through its lock.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use lot_core::{AgentClass, AgentId, SimConfig};
//! use lot_grid::GridBuilder;
//! use lot_planner::AStarPlanner;
//! use lot_sim::SimBuilder;
//!
//! let config = SimConfig::default();
//! let sim = SimBuilder::new(config, GridBuilder::reference_lot(), AStarPlanner::default())
//!     .build()?;
//! sim.admit_agent(space, AgentId(0), AgentClass::Privileged)?;
//! sim.wait_settled(Duration::from_secs(60));
//! for (agent, ticks) in sim.completion_stats() { /* … */ }
//! ```

pub mod builder;
pub mod error;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use sim::Simulation;
