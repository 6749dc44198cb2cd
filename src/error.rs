use thiserror::Error;

use crate::organism::Organism;

/// Reasons a run refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{organism} population {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        organism: Organism,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("a run needs at least one step")]
    NoSteps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a history needs at least one snapshot")]
pub struct EmptyHistory;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("simulation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
