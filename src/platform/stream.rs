//! Stream recorder interface
//!
//! A recorder pulls the media stream from a resolved address and persists
//! it. The orchestrator owns exactly one recorder instance at a time,
//! created per run by the factory, and discards it on stop.

use crate::orchestrator::state::RoomInfo;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that can occur when starting a recorder
#[derive(Error, Debug)]
pub enum StreamStartError {
    #[error("Invalid stream address: {0}")]
    InvalidAddress(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pulls one media stream and writes it to disk
#[async_trait]
pub trait StreamRecorder: Send + Sync {
    /// Begin pulling the stream at `address`.
    ///
    /// Calling `start` on a recorder that already stopped downloading
    /// (e.g. after the broadcast ended) re-uses the same output target.
    async fn start(&mut self, address: &str) -> Result<(), StreamStartError>;

    /// Stop pulling. Idempotent; safe to call when not started.
    async fn stop(&mut self);

    /// Whether bytes are currently being pulled from the stream.
    fn is_downloading(&self) -> bool;

    /// Cumulative bytes received, updated as the download progresses.
    ///
    /// Only the latest value matters; `watch` gives exactly that.
    fn progress(&self) -> watch::Receiver<u64>;
}

/// Creates one recorder per orchestrator run
///
/// The room record carries everything a recorder needs besides the
/// stream address: save destination, display label, and whether comments
/// should be written alongside the media.
pub trait StreamRecorderFactory: Send + Sync {
    fn create(&self, room: &RoomInfo) -> Box<dyn StreamRecorder>;
}
