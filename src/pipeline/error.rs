//! Pipeline-specific error types.

use thiserror::Error;

/// Errors that can occur within the pipeline runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{stage}: scale-up limit reached ({capacity} workers)")]
    CapacityExceeded { stage: String, capacity: usize },

    #[error("{stage}: scale-down limit reached (no workers left)")]
    Underflow { stage: String },

    #[error("Insufficient concurrency to start a pipeline: need at least {required}, got {requested}")]
    InsufficientConcurrency { required: usize, requested: usize },

    #[error("Allocation mismatch: {factors} factors but {targets} targets")]
    AllocationMismatch { factors: usize, targets: usize },

    #[error("Channel send error")]
    ChannelSend,

    #[error("Channel receive error")]
    ChannelRecv,
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
