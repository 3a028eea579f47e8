use lot_core::LotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error(transparent)]
    Lot(#[from] LotError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type MotionResult<T> = Result<T, MotionError>;
