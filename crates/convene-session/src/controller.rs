//! The session controller.
//!
//! [`SessionController`] owns every piece of session state. All mutation goes
//! through `&mut self`, one event at a time: user actions, remote activity and
//! the results of spawned acquisitions all arrive through a single inbox.
//! Renderers observe the session through a broadcast of [`Notification`]s and
//! drive it through a cloneable [`SessionHandle`].

use std::sync::Arc;

use convene_common::{ChatMessage, DisplaySource, Notification, Panel, Participant, RemoteEvent};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::MediaBackend;
use crate::chat::ChatLog;
use crate::clock::SessionClock;
use crate::device::MediaDeviceState;
use crate::error::{MediaAccessError, Result, SessionError, ShareError};
use crate::feed::RemoteFeed;
use crate::identity::SessionIdentity;
use crate::media::MediaStreamManager;
use crate::panel::PanelVisibility;
use crate::peer::PeerLinks;
use crate::roster::Roster;
use crate::stream::MediaStream;
use crate::types::{SessionConfig, SessionEvent, SessionPhase, UserAction};

pub const PERMISSION_REQUIRED_MESSAGE: &str =
    "Camera and microphone access is required to join the meeting. Allow access and retry.";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Missing meeting ID or token.";
pub const UNSUPPORTED_MESSAGE: &str =
    "Camera/Microphone access is not available in this environment.";

/// Cloneable sender for user actions.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    /// Queues an action. Returns `false` once the controller is gone.
    pub fn send(&self, action: UserAction) -> bool {
        self.tx.send(SessionEvent::User(action)).is_ok()
    }

    pub fn join(&self, meeting_id: impl Into<String>, token: impl Into<String>) -> bool {
        self.send(UserAction::Join {
            meeting_id: meeting_id.into(),
            token: token.into(),
        })
    }

    pub fn leave(&self) -> bool {
        self.send(UserAction::Leave)
    }
}

pub struct SessionController {
    config: SessionConfig,
    phase: SessionPhase,
    identity: Option<SessionIdentity>,

    devices: MediaDeviceState,
    media: MediaStreamManager,
    roster: Roster,
    chat: ChatLog,
    panels: PanelVisibility,
    clock: SessionClock,
    peers: PeerLinks,

    feed: Option<Box<dyn RemoteFeed>>,
    feed_task: Option<JoinHandle<()>>,
    capture_task: Option<JoinHandle<()>>,
    share_task: Option<JoinHandle<()>>,
    capture_attempt: u64,
    share_attempt: u64,
    ticker: Option<Interval>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    notify_tx: broadcast::Sender<Notification>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn MediaBackend>,
        feed: Box<dyn RemoteFeed>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notify_tx, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            config,
            phase: SessionPhase::Idle,
            identity: None,
            devices: MediaDeviceState::new(),
            media: MediaStreamManager::new(backend),
            roster: Roster::new(),
            chat: ChatLog::new(),
            panels: PanelVisibility::new(),
            clock: SessionClock::new(),
            peers: PeerLinks::new(),
            feed: Some(feed),
            feed_task: None,
            capture_task: None,
            share_task: None,
            capture_attempt: 0,
            share_attempt: 0,
            ticker: None,
            events_tx,
            events_rx,
            notify_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.events_tx.clone(),
        }
    }

    // -- accessors --

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn devices(&self) -> &MediaDeviceState {
        &self.devices
    }

    pub fn media(&self) -> &MediaStreamManager {
        &self.media
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.roster.participants()
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn open_panel_kind(&self) -> Option<Panel> {
        self.panels.current()
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn peers(&self) -> &PeerLinks {
        &self.peers
    }

    pub fn is_sharing(&self) -> bool {
        self.media.is_sharing()
    }

    pub fn display_source(&self) -> DisplaySource {
        self.media.display_source()
    }

    pub fn is_acquiring(&self) -> bool {
        self.capture_task.is_some()
    }

    // -- lifecycle --

    /// Validates credentials and starts capture acquisition.
    ///
    /// Allowed from `Idle`, and from `AwaitingPermission` to retry after a denial.
    pub fn initialize(&mut self, meeting_id: &str, token: &str) -> Result<()> {
        match &self.phase {
            SessionPhase::Idle | SessionPhase::AwaitingPermission => {}
            other => return Err(SessionError::InvalidPhase(other.clone())),
        }

        let identity = match SessionIdentity::new(meeting_id, token) {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "session credentials rejected");
                self.fail(MISSING_CREDENTIALS_MESSAGE.to_string());
                return Err(SessionError::MissingCredentials);
            }
        };

        info!(
            meeting_id = identity.meeting_id(),
            token = %identity.redacted_token(),
            "initializing session"
        );
        self.identity = Some(identity);
        self.request_capture();
        Ok(())
    }

    /// Re-runs capture acquisition after a permission denial.
    pub fn retry_permission(&mut self) -> Result<()> {
        if self.phase != SessionPhase::AwaitingPermission || self.identity.is_none() {
            return Err(SessionError::InvalidPhase(self.phase.clone()));
        }
        info!("retrying media permission");
        self.request_capture();
        Ok(())
    }

    fn request_capture(&mut self) {
        self.phase = SessionPhase::AcquiringMedia;
        self.capture_attempt += 1;
        let attempt = self.capture_attempt;
        debug!(attempt, constraints = ?self.config.capture, "requesting capture");

        let acquisition = self.media.acquire_capture(&self.config.capture);
        let tx = self.events_tx.clone();
        if let Some(previous) = self.capture_task.replace(tokio::spawn(async move {
            let result = acquisition.await;
            let _ = tx.send(SessionEvent::CaptureResolved { attempt, result });
        })) {
            previous.abort();
        }
    }

    fn on_capture_resolved(
        &mut self,
        attempt: u64,
        result: std::result::Result<MediaStream, MediaAccessError>,
    ) {
        if attempt == self.capture_attempt {
            self.capture_task = None;
        }
        if attempt != self.capture_attempt || self.phase != SessionPhase::AcquiringMedia {
            if let Ok(stream) = result {
                let stopped = stream.stop_all();
                warn!(attempt, stopped, phase = %self.phase, "discarding late capture stream");
            }
            return;
        }

        match result {
            Ok(stream) => self.activate(stream),
            Err(err) if err.is_retryable() => {
                warn!(error = %err, "media permission denied");
                self.phase = SessionPhase::AwaitingPermission;
                self.emit(Notification::PermissionRequired {
                    message: PERMISSION_REQUIRED_MESSAGE.to_string(),
                });
            }
            Err(MediaAccessError::Unsupported(detail)) => {
                warn!(%detail, "media capture unsupported");
                self.fail(UNSUPPORTED_MESSAGE.to_string());
            }
            Err(err) => {
                self.fail(format!("Failed to access camera or microphone: {err}"));
            }
        }
    }

    fn activate(&mut self, stream: MediaStream) {
        self.media.attach_capture(stream, &self.devices);
        self.phase = SessionPhase::Active;
        self.clock.start();

        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        self.roster
            .upsert_local(&self.config.display_name, &self.devices);

        let meeting_id = self
            .identity
            .as_ref()
            .map(|id| id.meeting_id().to_string())
            .unwrap_or_default();
        info!(%meeting_id, "session active");

        self.emit(Notification::SessionStarted { meeting_id });
        self.emit(Notification::MediaStatusChanged(self.devices.status()));
        self.emit_share_state();
        self.emit_roster();
        self.start_feed();
    }

    fn start_feed(&mut self) {
        let Some(mut feed) = self.feed.take() else {
            return;
        };
        let tx = self.events_tx.clone();
        self.feed_task = Some(tokio::spawn(async move {
            while let Some(event) = feed.next_event().await {
                if tx.send(SessionEvent::Remote(event)).is_err() {
                    return;
                }
            }
            let _ = tx.send(SessionEvent::FeedClosed);
        }));
    }

    fn fail(&mut self, message: String) {
        error!(%message, "session failed");
        self.phase = SessionPhase::Failed {
            message: message.clone(),
        };
        self.emit(Notification::Error {
            message,
            retryable: false,
        });
    }

    // -- media --

    /// Flips the audio flag. The flag is remembered even before capture is attached.
    pub fn toggle_audio(&mut self) -> bool {
        if self.phase == SessionPhase::Ended {
            return self.devices.audio_enabled();
        }
        let enabled = self.devices.toggle_audio();
        debug!(enabled, "audio toggled");
        self.after_device_toggle();
        enabled
    }

    pub fn toggle_video(&mut self) -> bool {
        if self.phase == SessionPhase::Ended {
            return self.devices.video_enabled();
        }
        let enabled = self.devices.toggle_video();
        debug!(enabled, "video toggled");
        self.after_device_toggle();
        enabled
    }

    fn after_device_toggle(&mut self) {
        self.media.apply_device_state(&self.devices);
        self.emit(Notification::MediaStatusChanged(self.devices.status()));
        if self.phase == SessionPhase::Active {
            self.roster
                .upsert_local(&self.config.display_name, &self.devices);
            self.emit_roster();
        }
    }

    /// Stops an active share, or requests a new one.
    pub fn toggle_screen_share(&mut self) {
        if self.phase != SessionPhase::Active {
            debug!(phase = %self.phase, "screen share ignored outside an active session");
            return;
        }
        if self.media.is_sharing() {
            self.stop_screen_share();
            return;
        }
        if self.share_task.is_some() {
            debug!("screen share request already pending");
            return;
        }

        self.share_attempt += 1;
        let attempt = self.share_attempt;
        let acquisition = self.media.request_screen_share(&self.config.display);
        let tx = self.events_tx.clone();
        self.share_task = Some(tokio::spawn(async move {
            let result = acquisition.await;
            let _ = tx.send(SessionEvent::ShareResolved { attempt, result });
        }));
    }

    fn on_share_resolved(
        &mut self,
        attempt: u64,
        result: std::result::Result<MediaStream, ShareError>,
    ) {
        if attempt == self.share_attempt {
            self.share_task = None;
        }
        if attempt != self.share_attempt || self.phase != SessionPhase::Active {
            if let Ok(stream) = result {
                let stopped = stream.stop_all();
                warn!(attempt, stopped, "discarding late screen share");
            }
            return;
        }

        match result {
            Ok(stream) => {
                let tx = self.events_tx.clone();
                self.media.start_screen_share(stream, move |stream_id| {
                    let _ = tx.send(SessionEvent::ShareEnded { stream_id });
                });
                self.emit_share_state();
            }
            Err(ShareError(err)) => {
                warn!(error = %err, "screen share failed");
                self.emit(Notification::Error {
                    message: format!("Failed to share screen: {err}"),
                    retryable: false,
                });
            }
        }
    }

    /// Single teardown path for both the manual stop and the host ending the track.
    pub fn stop_screen_share(&mut self) -> bool {
        if !self.media.stop_screen_share() {
            return false;
        }
        self.emit_share_state();
        true
    }

    fn on_share_ended(&mut self, stream_id: Uuid) {
        let current = self.media.screen_share().map(MediaStream::id);
        if current != Some(stream_id) {
            debug!(%stream_id, "ignoring end of a share that is no longer active");
            return;
        }
        info!(%stream_id, "screen share ended by host");
        self.stop_screen_share();
    }

    // -- chat & panels --

    /// Appends a local message. Blank text is ignored.
    pub fn send_chat_message(&mut self, text: &str) -> Option<ChatMessage> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        let message = self.chat.append(&self.config.display_name, text)?.clone();
        self.emit(Notification::ChatAppended(message.clone()));
        Some(message)
    }

    pub fn open_panel(&mut self, panel: Panel) {
        if self.panels.open(panel) {
            self.emit_panel();
        }
    }

    pub fn close_panel(&mut self, panel: Panel) {
        if self.panels.close(panel) {
            self.emit_panel();
        }
    }

    pub fn toggle_panel(&mut self, panel: Panel) {
        if self.panels.toggle(panel) {
            self.emit_panel();
        }
    }

    // -- remote activity --

    pub fn apply_remote(&mut self, event: RemoteEvent) -> Result<()> {
        if self.phase != SessionPhase::Active {
            debug!(phase = %self.phase, ?event, "remote event ignored");
            return Ok(());
        }

        match event {
            RemoteEvent::ParticipantJoined {
                id,
                name,
                audio_enabled,
                video_enabled,
            } => {
                self.roster
                    .add_remote(&id, &name, audio_enabled, video_enabled)?;
                self.peers.open(&id);
                info!(participant = %id, %name, "participant joined");
                self.emit_roster();
            }
            RemoteEvent::ParticipantLeft { id } => {
                if self.roster.remove_remote(&id).is_some() {
                    self.peers.close(&id);
                    info!(participant = %id, "participant left");
                    self.emit_roster();
                }
            }
            RemoteEvent::MediaStateChanged {
                id,
                audio_enabled,
                video_enabled,
            } => {
                if self.roster.update_remote(&id, audio_enabled, video_enabled) {
                    self.emit_roster();
                }
            }
            RemoteEvent::ChatReceived { sender, text } => {
                if let Some(message) = self.chat.append(&sender, &text).cloned() {
                    self.emit(Notification::ChatAppended(message));
                }
            }
        }
        Ok(())
    }

    // -- teardown --

    /// Ends the session. Only the first call has any effect.
    pub fn leave(&mut self) -> bool {
        if self.phase == SessionPhase::Ended {
            debug!("leave called on an ended session");
            return false;
        }
        info!(phase = %self.phase, "leaving session");
        self.phase = SessionPhase::Ended;

        for task in [
            self.capture_task.take(),
            self.share_task.take(),
            self.feed_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        self.feed = None;
        self.ticker = None;
        self.clock.stop();

        let was_sharing = self.media.is_sharing();
        let stopped = self.media.teardown_all();
        if was_sharing {
            self.emit_share_state();
        }
        let closed = self.peers.close_all();
        self.roster.clear();

        let elapsed = self.clock.label();
        info!(stopped, closed, %elapsed, "session ended");
        self.emit(Notification::SessionEnded { elapsed });
        true
    }

    fn tick(&mut self) {
        if self.clock.is_running() {
            self.emit(Notification::ClockTick {
                elapsed: self.clock.label(),
            });
        }
    }

    // -- dispatch --

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::User(action) => self.handle_action(action),
            SessionEvent::Remote(remote) => {
                if let Err(err) = self.apply_remote(remote) {
                    warn!(error = %err, "remote event rejected");
                }
            }
            SessionEvent::CaptureResolved { attempt, result } => {
                self.on_capture_resolved(attempt, result)
            }
            SessionEvent::ShareResolved { attempt, result } => {
                self.on_share_resolved(attempt, result)
            }
            SessionEvent::ShareEnded { stream_id } => self.on_share_ended(stream_id),
            SessionEvent::FeedClosed => {
                debug!("remote feed exhausted");
                self.feed_task = None;
            }
        }
    }

    pub fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::Join { meeting_id, token } => {
                if let Err(err) = self.initialize(&meeting_id, &token) {
                    warn!(error = %err, "join rejected");
                }
            }
            UserAction::RetryPermission => {
                if let Err(err) = self.retry_permission() {
                    warn!(error = %err, "permission retry rejected");
                }
            }
            UserAction::ToggleAudio => {
                self.toggle_audio();
            }
            UserAction::ToggleVideo => {
                self.toggle_video();
            }
            UserAction::ToggleScreenShare => self.toggle_screen_share(),
            UserAction::SendChat(text) => {
                self.send_chat_message(&text);
            }
            UserAction::OpenPanel(panel) => self.open_panel(panel),
            UserAction::ClosePanel(panel) => self.close_panel(panel),
            UserAction::TogglePanel(panel) => self.toggle_panel(panel),
            UserAction::Leave => {
                self.leave();
            }
        }
    }

    /// Waits for the next inbox event and handles it. Returns `false` if the
    /// inbox is closed.
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Runs until the session ends or fails.
    pub async fn run(self) -> Self {
        self.run_inner(None).await
    }

    /// Runs until the session ends or `shutdown_rx` fires, which leaves the session.
    pub async fn run_with_shutdown(self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.run_inner(Some(shutdown_rx)).await
    }

    async fn run_inner(mut self, mut shutdown_rx: Option<oneshot::Receiver<()>>) -> Self {
        while !self.phase.is_terminal() {
            tokio::select! {
                _ = async {
                    if let Some(rx) = &mut shutdown_rx {
                        let _ = rx.await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("session shutdown requested");
                    shutdown_rx = None;
                    self.leave();
                }

                _ = next_tick(&mut self.ticker) => self.tick(),

                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }

        // Acquisitions that finished before leave may still be queued.
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
        self
    }

    // -- notifications --

    fn emit(&self, notification: Notification) {
        debug!(kind = notification.kind(), "notify");
        // No subscribers is not an error.
        let _ = self.notify_tx.send(notification);
    }

    fn emit_roster(&self) {
        self.emit(Notification::RosterChanged {
            participants: self.roster.participants(),
        });
    }

    fn emit_panel(&self) {
        self.emit(Notification::PanelChanged {
            open: self.panels.current(),
        });
    }

    fn emit_share_state(&self) {
        self.emit(Notification::ShareStateChanged {
            sharing: self.media.is_sharing(),
            display_source: self.media.display_source(),
        });
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("identity", &self.identity)
            .field("devices", &self.devices)
            .field("media", &self.media)
            .field("participants", &self.roster.count())
            .field("messages", &self.chat.len())
            .finish()
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
