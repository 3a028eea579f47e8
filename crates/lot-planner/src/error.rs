//! Planning error type.

use thiserror::Error;

use lot_core::Pos;

/// Errors produced by `lot-planner`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The search space was exhausted without reaching the target.
    #[error("no path from {from} to {to}")]
    NoPathFound { from: Pos, to: Pos },

    #[error("{0} is outside the grid")]
    OutOfBounds(Pos),
}

pub type PlanResult<T> = Result<T, PlanError>;
