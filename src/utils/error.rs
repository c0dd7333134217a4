//! Error types and handling
//!
//! The orchestrator's failure taxonomy. None of these propagate to the
//! caller as return values; every one becomes a room-labeled log line
//! before the room settles in a stopped or not-live state.

use crate::platform::comment::CommentError;
use crate::platform::resolver::ResolveError;
use crate::platform::stream::StreamStartError;
use thiserror::Error;

/// Failures surfaced while orchestrating one room
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Room id or stream address could not be obtained; aborts the run
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    /// The user-supplied identifier maps to no room; aborts the run
    #[error("No canonical room id for identifier {0}")]
    RoomIdNotFound(String),

    /// The recorder refused to start; aborts the run
    #[error("Recorder start failed: {0}")]
    RecorderStart(#[from] StreamStartError),

    /// Comment connection failed; recording proceeds without chat
    #[error("Comment channel failed: {0}")]
    Channel(#[from] CommentError),

    /// Anything else raised inside an event handler; funnels into stop
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type alias using OrchestratorError
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
