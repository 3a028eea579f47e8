//! Simulator error type.
//!
//! Sub-crates define their own error enums and wrap `LotError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{AgentId, Pos};

/// The top-level error type for `lot-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum LotError {
    /// Out of bounds, or the cell has the wrong kind for the operation.
    #[error("invalid position {pos}: {reason}")]
    InvalidPosition { pos: Pos, reason: &'static str },

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LotError {
    #[inline]
    pub fn invalid(pos: Pos, reason: &'static str) -> Self {
        LotError::InvalidPosition { pos, reason }
    }
}

/// Shorthand result type for all `lot-*` crates.
pub type LotResult<T> = Result<T, LotError>;
