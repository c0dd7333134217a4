//! Room resolver interface
//!
//! Maps a user-supplied room identifier to the platform's canonical room
//! id, and a canonical id to the current (time-limited) stream address.
//! Both lookups are network calls; the orchestrator never blocks its
//! caller on them.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while resolving a room or its stream address
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("No stream address for room {0}")]
    NoStreamAddress(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Stateless lookups against the broadcast platform
///
/// Implementations own the HTTP/API plumbing; the orchestrator only sees
/// the two lookups it needs to start a recording.
#[async_trait]
pub trait RoomResolver: Send + Sync {
    /// Resolve the user-supplied identifier to the canonical room id.
    ///
    /// Returns `Ok(None)` when the platform has no room for the
    /// identifier; the orchestrator treats that as a failed start.
    async fn resolve_room_id(&self, identifier: &str) -> Result<Option<String>, ResolveError>;

    /// Resolve the current stream address for a canonical room id.
    ///
    /// The returned address is time-limited; a fresh one is requested on
    /// every (re)start of the recorder.
    async fn resolve_stream_address(&self, room_id: &str) -> Result<String, ResolveError>;
}
