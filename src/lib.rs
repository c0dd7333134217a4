//! liverec - records a live broadcast room to disk.
//!
//! The crate supervises one room per [`RecordingOrchestrator`]: it
//! resolves the room's stream address, runs a stream recorder, follows
//! the room's comment channel, and restarts or halts recording as the
//! broadcast starts and ends. Callers plug in platform-specific
//! collaborators through the traits in [`platform`] and observe outcomes
//! through a broadcast event stream.

pub mod orchestrator;
pub mod platform;
pub mod utils;

pub use orchestrator::state::{LogLevel, UiSignal};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorEvent, RecordingOrchestrator, RoomInfo, RoomStatus,
};
pub use platform::{
    ChannelEvent, CommentChannel, CommentChannelFactory, CommentError, CommentEvent, ResolveError,
    RoomResolver, StreamRecorder, StreamRecorderFactory, StreamStartError,
};
pub use utils::error::{OrchestratorError, OrchestratorResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for applications embedding the crate
///
/// Honors `RUST_LOG`, defaulting to debug output for this crate.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liverec=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
