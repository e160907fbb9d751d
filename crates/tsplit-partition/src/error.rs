//! Partitioner error types.

use thiserror::Error;

/// Errors returned by the balanced partitioner.
#[derive(Debug, Error, PartialEq)]
pub enum PartitionError {
    #[error("node count must be at least 1, got {0}")]
    InvalidNodeCount(usize),

    #[error("invalid annealing schedule: {0}")]
    InvalidSchedule(String),

    #[error("total weight of {items} items exceeds u64::MAX seconds")]
    WeightOverflow { items: usize },
}

pub type PartitionResult<T> = Result<T, PartitionError>;
