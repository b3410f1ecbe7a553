//! Error types for arlearn
//!
//! Every public operation returns one of these instead of panicking. Callers
//! log and carry on; none of these is fatal to the running app.

use thiserror::Error;

use crate::{TargetIndex, TopicId};

/// Core arlearn errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArError {
    // Invalid input
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unknown target index: {0}")]
    UnknownTarget(TargetIndex),

    #[error("Unknown topic: {0}")]
    UnknownTopic(TopicId),

    #[error("Step {index} out of range: timeline has {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    #[error("Invalid selector: {0:?}")]
    InvalidSelector(String),

    // Precondition violations
    #[error("No step list loaded")]
    TimelineNotLoaded,

    #[error("Timeline already started")]
    TimelineAlreadyStarted,

    #[error("No active topic")]
    NoActiveTopic,

    #[error("Operation requires state {expected}, current state is {actual}")]
    WrongState { expected: String, actual: String },

    // External dependencies
    #[error("Tracking backend unavailable")]
    TrackingUnavailable,

    #[error("Tracking backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration
    #[error("Invalid content: {0}")]
    Content(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ArError {
    /// Precondition violations can be retried once the precondition holds
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ArError::TimelineNotLoaded
                | ArError::TimelineAlreadyStarted
                | ArError::NoActiveTopic
                | ArError::WrongState { .. }
        )
    }
}

/// Result type for arlearn operations
pub type ArResult<T> = Result<T, ArError>;
