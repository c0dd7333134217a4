//! Recording orchestration module
//!
//! This module implements the per-room recording lifecycle:
//! - RecordingOrchestrator supervising resolver, recorder and comment channel
//! - Room record, status machine and configuration types
//! - Broadcast event stream any presentation layer can subscribe to

pub mod coordinator;
pub mod state;

pub use coordinator::RecordingOrchestrator;
pub use state::{OrchestratorConfig, OrchestratorEvent, RoomInfo, RoomStatus};
