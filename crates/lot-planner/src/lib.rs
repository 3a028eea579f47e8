//! `lot-planner`: cost model and A* search over a grid snapshot.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                     |
//! |-----------|--------------------------------------------------------------|
//! | [`cost`]  | `CostModel`: Manhattan heuristic + congestion edge cost     |
//! | [`astar`] | `PathPlanner` trait, `AStarPlanner`, `PlanRequest`, `Route`  |
//! | [`error`] | `PlanError`, `PlanResult<T>`                                 |
//!
//! # Pluggability
//!
//! The runtime calls planning through the [`PathPlanner`] trait, so a driver
//! can swap in another search without touching the executor or the replan
//! coordinator.  Planners never execute anything: they return a route or an
//! error and the caller decides what to do with it.

pub mod astar;
pub mod cost;
pub mod error;


pub use astar::{AStarPlanner, PathPlanner, PlanRequest, Route};
pub use cost::CostModel;
pub use error::{PlanError, PlanResult};
