use thiserror::Error as ThisError;

use crate::store::Position;

#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Group index {index} is out of bounds ({len} groups)")]
    GroupOutOfBounds { index: usize, len: usize },

    #[error("Sensor position {position} is out of bounds ({len} sensors in group)")]
    SensorOutOfBounds { position: Position, len: usize },

    #[error("Sensor source error: {0}")]
    Source(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
