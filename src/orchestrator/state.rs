//! Orchestrator state types
//!
//! Defines the room record, the status machine's observable states, the
//! per-room configuration, and the events the orchestrator emits.

use crate::platform::comment::CommentEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Observable status of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// No recording in progress
    Idle,
    /// Resolving the room id and stream address
    Resolving,
    /// Recorder started, liveness not yet probed
    Unknown,
    /// Broadcast confirmed live, recording
    Live,
    /// Connected but the broadcaster is not streaming
    NotLive,
}

impl Default for RoomStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomStatus::Idle => write!(f, ""),
            RoomStatus::Resolving => write!(f, "resolving"),
            RoomStatus::Unknown => write!(f, "starting"),
            RoomStatus::Live => write!(f, "live"),
            RoomStatus::NotLive => write!(f, "not live"),
        }
    }
}

/// One recording target
///
/// Owned by the caller (typically kept in a room list); the orchestrator
/// mutates `is_running`, `status` and `resolved_room_id` as side effects
/// of its own transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    /// Stable record id, assigned on creation
    pub id: Uuid,

    /// User-supplied room identifier (short id, vanity id, ...)
    pub room_id: String,

    /// Canonical room id confirmed by the resolver (filled at runtime)
    pub resolved_room_id: Option<String>,

    /// Display label used in logs and the room list
    pub remark: String,

    /// Directory the recording is written to
    pub save_path: PathBuf,

    /// Whether the recorder should persist comments alongside the media
    pub download_comments: bool,

    /// Whether this room is currently being recorded
    #[serde(default)]
    pub is_running: bool,

    /// Human-readable status, empty when idle
    #[serde(default)]
    pub status: RoomStatus,
}

impl RoomInfo {
    /// Create a new room record
    pub fn new(room_id: impl Into<String>, remark: impl Into<String>, save_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            resolved_room_id: None,
            remark: remark.into(),
            save_path,
            download_comments: true,
            is_running: false,
            status: RoomStatus::Idle,
        }
    }
}

/// Per-room orchestration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Restart the recorder when the broadcaster goes live again
    #[serde(default = "default_auto_restart")]
    pub auto_restart: bool,

    /// Delay before the one-shot liveness probe (milliseconds)
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,

    /// First reconnect delay after a comment channel drop (milliseconds)
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_delay_ms: u64,

    /// Cap for the doubling reconnect delay (milliseconds)
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_auto_restart() -> bool {
    true
}

fn default_probe_delay_ms() -> u64 {
    2000
}

fn default_reconnect_base_ms() -> u64 {
    1000
}

fn default_reconnect_max_ms() -> u64 {
    60_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_restart: default_auto_restart(),
            probe_delay_ms: default_probe_delay_ms(),
            reconnect_base_delay_ms: default_reconnect_base_ms(),
            reconnect_max_delay_ms: default_reconnect_max_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// Liveness probe delay as a `Duration`
    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    /// Reconnect delay for the given consecutive failure count
    ///
    /// Doubles per failure, capped at `reconnect_max_delay_ms`. Zero
    /// failures means reconnect immediately.
    pub fn reconnect_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exp = failures.saturating_sub(1).min(31);
        let delay = self
            .reconnect_base_delay_ms
            .saturating_mul(1u64 << exp)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Severity of an emitted log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Resting state the caller's start/stop affordance should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiSignal {
    /// A start is in flight
    Processing,
    /// The room id resolved and the run is underway
    Started,
    /// The room is back at rest
    Stopped,
}

/// Events emitted by the orchestrator
///
/// Delivered on a broadcast channel; any presentation layer (GUI, CLI,
/// log file) subscribes and marshals to its own thread.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// The room record changed (running flag, status, resolved id)
    StatusChanged(RoomInfo),
    /// A room-labeled log line
    Log {
        timestamp: DateTime<Utc>,
        level: LogLevel,
        room: String,
        message: String,
    },
    /// UI affordance signal
    Ui(UiSignal),
    /// Cumulative bytes written by the recorder
    Progress { bytes: u64 },
    /// A chat or viewer-count event, forwarded untouched
    Comment(CommentEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_status_display() {
        assert_eq!(RoomStatus::Idle.to_string(), "");
        assert_eq!(RoomStatus::Live.to_string(), "live");
        assert_eq!(RoomStatus::NotLive.to_string(), "not live");
    }

    #[test]
    fn test_room_info_serde_camel_case() {
        let room = RoomInfo::new("12345", "my room", PathBuf::from("/tmp/rec"));
        let json = serde_json::to_string(&room).unwrap();

        assert!(json.contains("\"roomId\":\"12345\""));
        assert!(json.contains("\"downloadComments\":true"));
        assert!(json.contains("\"isRunning\":false"));

        let back: RoomInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, room.id);
        assert_eq!(back.room_id, "12345");
        assert_eq!(back.status, RoomStatus::Idle);
    }

    #[test]
    fn test_config_defaults() {
        let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
        assert!(config.auto_restart);
        assert_eq!(config.probe_delay_ms, 2000);
        assert_eq!(config.probe_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_reconnect_delay_doubles_and_caps() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.reconnect_delay(0), Duration::ZERO);
        assert_eq!(config.reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay(2), Duration::from_secs(2));
        assert_eq!(config.reconnect_delay(3), Duration::from_secs(4));
        assert_eq!(config.reconnect_delay(10), Duration::from_secs(60));
        // Shift amount is clamped, no overflow for absurd counts
        assert_eq!(config.reconnect_delay(u32::MAX), Duration::from_secs(60));
    }
}
