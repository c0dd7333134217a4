//! Comment channel interface
//!
//! A persistent connection delivering broadcast lifecycle and chat events
//! for one room. Each successful `connect` yields a fresh, in-order event
//! stream; the same channel instance is reconnected after a drop.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised while connecting the comment channel
#[derive(Error, Debug)]
pub enum CommentError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An event parsed from the comment connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentEvent {
    /// The broadcaster went live
    BroadcastStarted,
    /// The broadcaster ended the stream
    BroadcastEnded,
    /// A chat message
    Chat { user: String, text: String },
    /// Current viewer count for the room
    ViewerCount(u64),
}

/// What the channel delivers on its event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A parsed comment-protocol event
    Comment(CommentEvent),
    /// The connection dropped; the stream ends after this
    Disconnected,
}

/// One room's comment connection
#[async_trait]
pub trait CommentChannel: Send + Sync {
    /// Open the connection and return its event stream.
    ///
    /// Used for the initial connect and for every reconnect; each call
    /// replaces the previous stream.
    async fn connect(&mut self) -> Result<mpsc::Receiver<ChannelEvent>, CommentError>;

    /// Close the connection. Idempotent.
    async fn disconnect(&mut self);
}

/// Creates one comment channel per orchestrator run
pub trait CommentChannelFactory: Send + Sync {
    fn create(&self, room_id: &str) -> Box<dyn CommentChannel>;
}
