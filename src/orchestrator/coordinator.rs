//! Recording orchestrator
//!
//! Supervises one room's recording lifecycle: resolves the canonical room
//! id and stream address, starts and stops the stream recorder, keeps the
//! comment channel connected, and reacts to broadcast start/end events.
//!
//! `start()` and `stop()` never block the caller on network round-trips;
//! resolution and recorder startup run on a background task per room, and
//! outcomes surface through the broadcast event stream.

use crate::orchestrator::state::{
    LogLevel, OrchestratorConfig, OrchestratorEvent, RoomInfo, RoomStatus, UiSignal,
};
use crate::platform::comment::{ChannelEvent, CommentChannel, CommentChannelFactory, CommentEvent};
use crate::platform::resolver::RoomResolver;
use crate::platform::stream::{StreamRecorder, StreamRecorderFactory};
use crate::utils::error::{OrchestratorError, OrchestratorResult};
use crate::utils::format::format_size;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Collaborator instances owned by the current run
#[derive(Default)]
struct Session {
    recorder: Option<Box<dyn StreamRecorder>>,
    channel: Option<Box<dyn CommentChannel>>,
}

/// Per-room recording supervisor
///
/// Cheap to clone; clones share the same room, state and event stream.
/// At most one stream recorder is active per orchestrator at any time.
#[derive(Clone)]
pub struct RecordingOrchestrator {
    /// The caller-owned room record, mutated on every transition
    room: Arc<RwLock<RoomInfo>>,

    config: Arc<OrchestratorConfig>,
    resolver: Arc<dyn RoomResolver>,
    recorder_factory: Arc<dyn StreamRecorderFactory>,
    channel_factory: Arc<dyn CommentChannelFactory>,

    /// Authority for whether events may still mutate state
    running: Arc<AtomicBool>,

    /// Single-flight guard around stream-address refresh
    refresh_in_flight: Arc<AtomicBool>,

    /// Invalidates timers spawned by earlier runs
    epoch: Arc<AtomicU64>,

    /// Latest cumulative byte count reported by the recorder
    recorded_bytes: Arc<AtomicU64>,

    session: Arc<Mutex<Session>>,
    event_tx: broadcast::Sender<OrchestratorEvent>,
    run_task: Arc<parking_lot::Mutex<Option<JoinHandle<()>>>>,
}

impl RecordingOrchestrator {
    /// Create an orchestrator for one room
    pub fn new(
        room: RoomInfo,
        config: OrchestratorConfig,
        resolver: Arc<dyn RoomResolver>,
        recorder_factory: Arc<dyn StreamRecorderFactory>,
        channel_factory: Arc<dyn CommentChannelFactory>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            room: Arc::new(RwLock::new(room)),
            config: Arc::new(config),
            resolver,
            recorder_factory,
            channel_factory,
            running: Arc::new(AtomicBool::new(false)),
            refresh_in_flight: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            recorded_bytes: Arc::new(AtomicU64::new(0)),
            session: Arc::new(Mutex::new(Session::default())),
            event_tx,
            run_task: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Subscribe to orchestrator events
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.event_tx.subscribe()
    }

    /// Whether this room is currently being recorded
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the room record
    pub fn room(&self) -> RoomInfo {
        self.room.read().clone()
    }

    /// Latest cumulative byte count reported by the recorder
    pub fn recorded_bytes(&self) -> u64 {
        self.recorded_bytes.load(Ordering::SeqCst)
    }

    /// Begin recording this room
    ///
    /// Returns immediately; resolution and recorder startup proceed on a
    /// background task. Fails fast with an error log if already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        self.emit(OrchestratorEvent::Ui(UiSignal::Processing));
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.log_error("already running");
            return;
        }
        self.refresh_in_flight.store(false, Ordering::SeqCst);
        self.update_room(|room| {
            room.is_running = true;
            room.status = RoomStatus::Resolving;
        });

        let this = self.clone();
        let task = tokio::spawn(async move { this.run().await });
        *self.run_task.lock() = Some(task);
    }

    /// Stop recording this room
    ///
    /// Idempotent at the report level: stopping an already-stopped room
    /// logs an error but still resets the status fields. Always concludes
    /// with a `Stopped` UI signal.
    pub async fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.run_task.lock().take() {
            task.abort();
        }
        if was_running {
            self.teardown().await;
        } else {
            self.log_error("already stopped");
            self.update_room(|room| {
                room.is_running = false;
                room.status = RoomStatus::Idle;
            });
        }
        self.emit(OrchestratorEvent::Ui(UiSignal::Stopped));
    }

    /// Stop triggered from inside the run task
    ///
    /// Same teardown as `stop()` minus the task abort, so the event loop
    /// can unwind on its own after observing the cleared running flag.
    async fn stop_from_task(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.teardown().await;
            self.emit(OrchestratorEvent::Ui(UiSignal::Stopped));
        }
    }

    /// Discard the recorder, disconnect the channel, reset the room
    async fn teardown(&self) {
        let mut session = self.session.lock().await;
        if let Some(mut recorder) = session.recorder.take() {
            recorder.stop().await;
        }
        if let Some(mut channel) = session.channel.take() {
            channel.disconnect().await;
        }
        drop(session);

        self.recorded_bytes.store(0, Ordering::SeqCst);
        self.log_info("stopped");
        self.update_room(|room| {
            room.is_running = false;
            room.status = RoomStatus::Idle;
        });
    }

    /// Background task body: start pipeline, then the event loop
    async fn run(self) {
        if let Err(err) = self.run_pipeline().await {
            self.log_error(&err.to_string());
            self.stop_from_task().await;
        }
    }

    /// Resolve, connect, start the recorder, then consume channel events
    async fn run_pipeline(&self) -> OrchestratorResult<()> {
        // Canonical room id
        let identifier = self.room.read().room_id.clone();
        let resolved = self.resolver.resolve_room_id(&identifier).await?;
        if !self.is_running() {
            return Ok(());
        }
        let room_id = resolved.ok_or(OrchestratorError::RoomIdNotFound(identifier))?;
        self.log_info(&format!("room id resolved: {room_id}"));
        self.update_room(|room| room.resolved_room_id = Some(room_id.clone()));
        self.emit(OrchestratorEvent::Ui(UiSignal::Started));

        // Current stream address
        let address = self.resolver.resolve_stream_address(&room_id).await?;
        if !self.is_running() {
            return Ok(());
        }

        // Comment channel is best-effort: recording proceeds without chat
        let mut channel = self.channel_factory.create(&room_id);
        let events = match channel.connect().await {
            Ok(rx) => Some(rx),
            Err(err) => {
                let err = OrchestratorError::Channel(err);
                self.log_error(&format!("{err}, recording without chat"));
                None
            }
        };
        if !self.is_running() {
            channel.disconnect().await;
            return Ok(());
        }
        self.session.lock().await.channel = Some(channel);

        // Stream recorder
        let mut recorder = self.recorder_factory.create(&self.room.read().clone());
        recorder.start(&address).await?;
        let progress = recorder.progress();
        {
            let mut session = self.session.lock().await;
            if !self.is_running() {
                // Stopped while the recorder was starting; discard it
                recorder.stop().await;
                if let Some(mut channel) = session.channel.take() {
                    channel.disconnect().await;
                }
                return Ok(());
            }
            session.recorder = Some(recorder);
        }
        self.log_info(&format!("recorder started for {address}"));
        self.set_status(RoomStatus::Unknown);
        self.spawn_progress_forwarder(progress);
        self.spawn_liveness_probe();

        match events {
            Some(rx) => self.event_loop(rx).await,
            // No channel: nothing to react to, the recorder runs until stop()
            None => Ok(()),
        }
    }

    /// Consume channel events in arrival order, reconnecting on drops
    async fn event_loop(&self, mut rx: mpsc::Receiver<ChannelEvent>) -> OrchestratorResult<()> {
        let mut failures: u32 = 0;
        loop {
            match rx.recv().await {
                Some(ChannelEvent::Comment(event)) => {
                    if !self.is_running() {
                        return Ok(());
                    }
                    self.handle_comment(event).await?;
                }
                Some(ChannelEvent::Disconnected) | None => {
                    self.log_info("comment channel disconnected");
                    if !self.is_running() {
                        // Caller-triggered; log only
                        return Ok(());
                    }
                    match self.reconnect(&mut failures).await {
                        Some(new_rx) => rx = new_rx,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Reconnect the comment channel, backing off on repeated failures
    ///
    /// Returns `None` once the room stops or the channel is gone.
    async fn reconnect(&self, failures: &mut u32) -> Option<mpsc::Receiver<ChannelEvent>> {
        loop {
            let delay = self.config.reconnect_delay(*failures);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !self.is_running() {
                return None;
            }
            self.log_info("reconnecting comment channel");
            let mut session = self.session.lock().await;
            let channel = session.channel.as_mut()?;
            match channel.connect().await {
                Ok(rx) => {
                    *failures = 0;
                    return Some(rx);
                }
                Err(err) => {
                    *failures += 1;
                    drop(session);
                    self.log_error(&format!("comment channel reconnect failed: {err}"));
                }
            }
        }
    }

    /// React to one comment-protocol event
    async fn handle_comment(&self, event: CommentEvent) -> OrchestratorResult<()> {
        match event {
            CommentEvent::BroadcastEnded => self.on_broadcast_ended().await,
            CommentEvent::BroadcastStarted => self.on_broadcast_started().await,
            // Chat and viewer counts are forwarded, not acted on
            other => {
                self.emit(OrchestratorEvent::Comment(other));
                Ok(())
            }
        }
    }

    /// The broadcaster ended the stream
    async fn on_broadcast_ended(&self) -> OrchestratorResult<()> {
        self.log_info("broadcast ended");
        let mut session = self.session.lock().await;
        if let Some(recorder) = session.recorder.as_mut() {
            recorder.stop().await;
        }
        drop(session);

        if self.config.auto_restart {
            // Stay connected and wait for the broadcast to resume
            self.set_status(RoomStatus::NotLive);
        } else {
            self.stop_from_task().await;
        }
        Ok(())
    }

    /// The broadcaster went live (again)
    async fn on_broadcast_started(&self) -> OrchestratorResult<()> {
        self.log_info("broadcast started");
        if !self.config.auto_restart {
            return Ok(());
        }
        {
            let session = self.session.lock().await;
            let downloading = session
                .recorder
                .as_ref()
                .map(|r| r.is_downloading())
                .unwrap_or(false);
            if downloading {
                // Duplicate lifecycle event, the recorder is already pulling
                return Ok(());
            }
        }
        if self
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // A refresh is already in flight for this room
            return Ok(());
        }
        let result = self.refresh_and_restart().await;
        self.refresh_in_flight.store(false, Ordering::SeqCst);
        result
    }

    /// Resolve a fresh stream address and restart the recorder with it
    async fn refresh_and_restart(&self) -> OrchestratorResult<()> {
        let room_id = self
            .room
            .read()
            .resolved_room_id
            .clone()
            .ok_or_else(|| OrchestratorError::Unexpected("no resolved room id".into()))?;
        let address = self.resolver.resolve_stream_address(&room_id).await?;
        if !self.is_running() {
            return Ok(());
        }
        self.log_info("stream address refreshed");

        let mut session = self.session.lock().await;
        let Some(recorder) = session.recorder.as_mut() else {
            return Ok(());
        };
        recorder.start(&address).await?;
        if !self.is_running() {
            // Stopped while the recorder was restarting; discard the result
            recorder.stop().await;
            return Ok(());
        }
        drop(session);

        self.set_status(RoomStatus::Unknown);
        self.spawn_liveness_probe();
        Ok(())
    }

    /// Forward recorder progress onto the event stream
    ///
    /// Retires once the room stops or a newer run takes over.
    fn spawn_progress_forwarder(&self, mut progress: watch::Receiver<u64>) {
        let this = self.clone();
        let epoch = self.epoch.load(Ordering::SeqCst);
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                if !this.is_running() || this.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }
                let bytes = *progress.borrow();
                this.recorded_bytes.store(bytes, Ordering::SeqCst);
                this.emit(OrchestratorEvent::Progress { bytes });
            }
        });
    }

    /// One-shot liveness check, armed on every recorder start
    ///
    /// Fires once after the configured delay: a recorder that received at
    /// most one byte by then is treated as not broadcasting and stopped;
    /// otherwise the room is confirmed live. Never re-armed afterwards.
    fn spawn_liveness_probe(&self) {
        let this = self.clone();
        let epoch = self.epoch.load(Ordering::SeqCst);
        tokio::spawn(async move {
            tokio::time::sleep(this.config.probe_delay()).await;
            this.run_liveness_probe(epoch).await;
        });
    }

    async fn run_liveness_probe(&self, epoch: u64) {
        if !self.is_running() || self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        let mut session = self.session.lock().await;
        let Some(recorder) = session.recorder.as_mut() else {
            return;
        };
        let bytes = *recorder.progress().borrow();
        if bytes <= 1 {
            if recorder.is_downloading() {
                recorder.stop().await;
            }
            drop(session);
            self.log_info("not broadcasting");
            self.set_status(RoomStatus::NotLive);
        } else {
            drop(session);
            self.log_info(&format!("broadcasting, {} received", format_size(bytes)));
            self.set_status(RoomStatus::Live);
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Mutate the room record and broadcast the new snapshot
    fn update_room<F: FnOnce(&mut RoomInfo)>(&self, f: F) {
        let snapshot = {
            let mut room = self.room.write();
            f(&mut room);
            room.clone()
        };
        self.emit(OrchestratorEvent::StatusChanged(snapshot));
    }

    fn set_status(&self, status: RoomStatus) {
        self.update_room(|room| room.status = status);
    }

    fn log_info(&self, message: &str) {
        let room = self.room.read().remark.clone();
        tracing::info!(room = %room, "{message}");
        self.emit(OrchestratorEvent::Log {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            room,
            message: message.to_string(),
        });
    }

    fn log_error(&self, message: &str) {
        let room = self.room.read().remark.clone();
        tracing::error!(room = %room, "{message}");
        self.emit(OrchestratorEvent::Log {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            room,
            message: message.to_string(),
        });
    }
}
