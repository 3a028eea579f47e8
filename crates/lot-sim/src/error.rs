use lot_core::{AgentId, LotError};
use lot_motion::MotionError;
use lot_planner::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Lot(#[from] LotError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("no route for {0} after obstruction")]
    UnsolvableAfterObstruction(AgentId),

    #[error("{0} is not parked")]
    NotParked(AgentId),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<MotionError> for SimError {
    fn from(e: MotionError) -> Self {
        match e {
            MotionError::Lot(e) => SimError::Lot(e),
            MotionError::Spawn(e) => SimError::Spawn(e),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
