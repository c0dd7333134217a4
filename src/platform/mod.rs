//! Collaborator interfaces for a broadcast platform
//!
//! Platform-agnostic traits for the three external collaborators the
//! orchestrator composes: room/address resolution, stream recording,
//! and the comment channel.

pub mod comment;
pub mod resolver;
pub mod stream;

pub use comment::{ChannelEvent, CommentChannel, CommentChannelFactory, CommentError, CommentEvent};
pub use resolver::{ResolveError, RoomResolver};
pub use stream::{StreamRecorder, StreamRecorderFactory, StreamStartError};
