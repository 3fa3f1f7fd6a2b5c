//! Session controller
//!
//! Drives one operator's session through permission, device discovery, join
//! and leave. Every operation checks the current state first; a request the
//! state does not accept is rejected without side effects. Awaits never hold
//! the state lock, so a leave can land while a join is in flight and the join
//! cleans up after itself when it notices.

use crate::config::ControllerConfig;
use crate::event::{EventStream, SessionEvent};
use crate::room::{PreviewSink, RoomSessionManager, SessionHandle};
use crate::state::{Controls, SessionState};
use citycast_core::{CitycastError, SecureOrigin};
use citycast_diagnostics::SessionTrace;
use citycast_media::{
    CameraChoice, CapturePlatform, CaptureSelection, DeviceCatalog, DeviceCatalogBuilder,
    LocalCaptureHandles, MicrophoneChoice, PermissionManager, PermissionState, TrackFactory,
};
use citycast_signaling::{IdentityStore, OperatorSession, RoomTransport, TokenService};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

struct ControllerInner {
    state: SessionState,
    attempt: u64,
    // Bumped on every transition; async results started under an older
    // epoch are discarded.
    epoch: u64,
    catalog: DeviceCatalog,
    selection: CaptureSelection,
    session: Option<SessionHandle>,
    last_error: Option<CitycastError>,
    status: String,
    capture_disabled: bool,
}

/// Builder for [`SessionController`]
pub struct SessionControllerBuilder {
    config: ControllerConfig,
    platform: Option<Arc<dyn CapturePlatform>>,
    tokens: Option<Arc<dyn TokenService>>,
    transport: Option<Arc<dyn RoomTransport>>,
    identity: Option<Arc<dyn IdentityStore>>,
    preview: Option<Arc<dyn PreviewSink>>,
}

impl SessionControllerBuilder {
    /// Capture platform (required)
    pub fn platform(mut self, platform: Arc<dyn CapturePlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Token service (required)
    pub fn token_service(mut self, tokens: Arc<dyn TokenService>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Room transport (required)
    pub fn transport(mut self, transport: Arc<dyn RoomTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Identity store (required)
    pub fn identity(mut self, identity: Arc<dyn IdentityStore>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Local preview surface
    pub fn preview(mut self, preview: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Build the controller in [`SessionState::Idle`]
    pub fn build(self) -> Result<Arc<SessionController>, CitycastError> {
        let platform = self.platform.ok_or_else(|| missing("platform"))?;
        let tokens = self.tokens.ok_or_else(|| missing("token_service"))?;
        let transport = self.transport.ok_or_else(|| missing("transport"))?;
        let identity = self.identity.ok_or_else(|| missing("identity"))?;

        let mut rooms = RoomSessionManager::new(tokens, transport)
            .with_rights(self.config.publish, self.config.subscribe);
        if let Some(preview) = self.preview {
            rooms = rooms.with_preview(preview);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Arc::new(SessionController {
            permissions: PermissionManager::new(Arc::clone(&platform), &self.config.origin),
            catalogs: DeviceCatalogBuilder::new(Arc::clone(&platform)),
            tracks: TrackFactory::new(platform),
            rooms,
            identity,
            trace: SessionTrace::new(self.config.trace_capacity),
            events,
            inner: Mutex::new(ControllerInner {
                state: SessionState::Idle,
                attempt: 0,
                epoch: 0,
                catalog: DeviceCatalog::default(),
                selection: CaptureSelection::default(),
                session: None,
                last_error: None,
                status: String::new(),
                capture_disabled: false,
            }),
            config: self.config,
        }))
    }
}

fn missing(field: &str) -> CitycastError {
    CitycastError::MissingConfiguration {
        field: field.to_string(),
    }
}

/// Single authority over one operator's session
pub struct SessionController {
    config: ControllerConfig,
    permissions: PermissionManager,
    catalogs: DeviceCatalogBuilder,
    tracks: TrackFactory,
    rooms: RoomSessionManager,
    identity: Arc<dyn IdentityStore>,
    trace: SessionTrace,
    events: broadcast::Sender<SessionEvent>,
    inner: Mutex<ControllerInner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("room_name", &self.config.room_name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Start building a controller
    pub fn builder(config: ControllerConfig) -> SessionControllerBuilder {
        SessionControllerBuilder {
            config,
            platform: None,
            tokens: None,
            transport: None,
            identity: None,
            preview: None,
        }
    }

    /// Configuration the controller was built with
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Most recent error, cleared by the next successful transition into a
    /// ready state
    pub fn last_error(&self) -> Option<CitycastError> {
        self.inner.lock().last_error.clone()
    }

    /// Most recent status message
    pub fn status_message(&self) -> String {
        self.inner.lock().status.clone()
    }

    /// State name, followed by the last error kind when there is one
    pub fn status_line(&self) -> String {
        let inner = self.inner.lock();
        match &inner.last_error {
            Some(error) => format!("{} ({})", inner.state, error.kind()),
            None => inner.state.to_string(),
        }
    }

    /// Current device catalog
    pub fn catalog(&self) -> DeviceCatalog {
        self.inner.lock().catalog.clone()
    }

    /// Current capture selection
    pub fn selection(&self) -> CaptureSelection {
        self.inner.lock().selection.clone()
    }

    /// Which controls are enabled
    pub fn controls(&self) -> Controls {
        let inner = self.inner.lock();
        Controls::for_state(inner.state, inner.capture_disabled)
    }

    /// Check if capture was disabled by an insecure origin
    pub fn is_capture_disabled(&self) -> bool {
        self.inner.lock().capture_disabled
    }

    /// Id of the live session, if connected
    pub fn session_id(&self) -> Option<uuid::Uuid> {
        self.inner.lock().session.as_ref().map(|s| s.id())
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Transition history
    pub fn trace(&self) -> &SessionTrace {
        &self.trace
    }

    /// Boot the controller
    ///
    /// Checks the origin and, when configured, runs the permission probe
    /// without a user gesture. On an insecure origin capture is disabled for
    /// good and the controller stays idle.
    pub async fn boot(&self) -> Result<SessionState, CitycastError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Idle {
                return Err(invalid_state("Idle", inner.state));
            }
            if let Err(e) = SecureOrigin::check(&self.config.origin) {
                self.disable_capture(&mut inner, e.clone());
                return Err(e);
            }
            if !self.config.auto_probe {
                self.set_status(&mut inner, "Press Grant to allow camera and microphone");
                return Ok(inner.state);
            }
        }
        self.prepare(false).await
    }

    /// Run [`boot`](Self::boot) in the background
    pub fn spawn_boot(self: &Arc<Self>) -> JoinHandle<Result<SessionState, CitycastError>> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.boot().await })
    }

    /// Request permission under a user gesture, then rebuild the catalog
    pub async fn grant(&self) -> Result<SessionState, CitycastError> {
        {
            let inner = self.inner.lock();
            if let Some(e) = capture_disabled_error(&inner) {
                return Err(e);
            }
            if !inner.state.accepts_grant() {
                return Err(invalid_state(
                    "Idle, PermissionDenied or PermissionGranted",
                    inner.state,
                ));
            }
        }
        self.prepare(true).await
    }

    /// Rebuild the device catalog
    ///
    /// A listing that finishes after the session has moved on (a join or a
    /// new permission prompt) is dropped with [`CitycastError::InvalidState`].
    pub async fn refresh_devices(&self) -> Result<SessionState, CitycastError> {
        let epoch = {
            let mut inner = self.inner.lock();
            if !inner.state.accepts_refresh() {
                return Err(invalid_state(
                    "PermissionGranted, DevicesReady or JoinFailed",
                    inner.state,
                ));
            }
            if inner.state == SessionState::JoinFailed {
                self.transition(&mut inner, SessionState::DevicesReady);
            }
            inner.epoch
        };
        self.load_catalog(epoch).await
    }

    /// Choose the camera for the next join
    pub fn select_camera(&self, choice: CameraChoice) {
        debug!(camera = ?choice, "Camera selected");
        self.inner.lock().selection.camera = choice;
    }

    /// Choose the microphone for the next join
    pub fn select_microphone(&self, choice: MicrophoneChoice) {
        debug!(microphone = ?choice, "Microphone selected");
        self.inner.lock().selection.microphone = choice;
    }

    /// Apply raw selector values
    pub fn select_from_values(&self, camera: &str, microphone: &str) {
        let selection = CaptureSelection::new(
            CameraChoice::from_selector_value(camera),
            MicrophoneChoice::from_selector_value(microphone),
        );
        debug!(camera, microphone, "Selection updated");
        self.inner.lock().selection = selection;
    }

    /// Join the configured room with the current selection
    ///
    /// Accepted in [`SessionState::DevicesReady`] and
    /// [`SessionState::JoinFailed`]. Any failure releases every track created
    /// for the attempt and leaves the controller in
    /// [`SessionState::JoinFailed`]. A leave during the join cancels it and the
    /// join returns [`CitycastError::JoinCancelled`].
    pub async fn join(&self) -> Result<(), CitycastError> {
        let (attempt, selection) = {
            let mut inner = self.inner.lock();
            if let Some(e) = capture_disabled_error(&inner) {
                return Err(e);
            }
            if !inner.state.accepts_join() {
                return Err(invalid_state("DevicesReady or JoinFailed", inner.state));
            }
            if inner.state == SessionState::JoinFailed {
                self.transition(&mut inner, SessionState::DevicesReady);
            }
            inner.attempt += 1;
            inner.last_error = None;
            self.transition(&mut inner, SessionState::Joining);
            (inner.attempt, inner.selection.clone())
        };
        info!(attempt, room = %self.config.room_name, "Joining room");

        if let Err(e) = self.config.validate() {
            return Err(self.fail_join(attempt, e, None));
        }
        let identity = match self.resolve_identity() {
            Ok(identity) => identity,
            Err(e) => return Err(self.fail_join(attempt, e, None)),
        };

        self.emit_status("Creating local tracks...");
        let tracks = match self.tracks.create_tracks(&selection).await {
            Ok(tracks) => tracks,
            Err(e) => return Err(self.fail_join(attempt, e, None)),
        };
        if let Some(cancelled) = self.check_cancelled(attempt) {
            return Err(self.discard_tracks(cancelled, tracks));
        }

        self.emit_status("Fetching room token...");
        let token = match self
            .rooms
            .fetch_token(&identity, &self.config.room_name)
            .await
        {
            Ok(token) => token,
            Err(e) => return Err(self.fail_join(attempt, e, Some(tracks))),
        };
        if let Some(cancelled) = self.check_cancelled(attempt) {
            return Err(self.discard_tracks(cancelled, tracks));
        }

        self.emit_status("Connecting to room...");
        let mut session = match self
            .rooms
            .connect(&identity, &self.config.room_name, &token, tracks)
            .await
        {
            Ok(session) => session,
            Err(join_error) => {
                let error = join_error.error.clone();
                return Err(self.fail_join(attempt, error, Some(join_error.tracks)));
            }
        };

        let cancelled = {
            let mut inner = self.inner.lock();
            if inner.attempt == attempt && inner.state == SessionState::Joining {
                self.transition(&mut inner, SessionState::Connected);
                self.set_status(&mut inner, "Connected. Publishing camera and microphone.");
                inner.session = Some(session);
                return Ok(());
            }
            CitycastError::JoinCancelled { attempt }
        };

        debug!(attempt, "Join finished after cancellation, tearing session down");
        if let Err(e) = self.rooms.leave(&mut session).await {
            warn!(attempt, "Disconnect of cancelled session failed: {}", e);
        }
        Err(cancelled)
    }

    /// Leave the room, or cancel a join in flight
    ///
    /// Always ends in [`SessionState::Idle`] with every track stopped and the
    /// preview detached. A disconnect failure is logged and reported as the
    /// last error but does not fail the leave. In any other state this is a
    /// no-op.
    pub async fn leave(&self) -> Result<(), CitycastError> {
        let session = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Connected => {
                    self.transition(&mut inner, SessionState::Leaving);
                    self.set_status(&mut inner, "Leaving room...");
                    inner.session.take()
                }
                SessionState::Joining => {
                    info!(attempt = inner.attempt, "Cancelling join in flight");
                    self.transition(&mut inner, SessionState::Leaving);
                    self.transition(&mut inner, SessionState::Idle);
                    self.set_status(&mut inner, "Join cancelled");
                    return Ok(());
                }
                state => {
                    debug!(%state, "Leave ignored");
                    return Ok(());
                }
            }
        };

        let disconnect_error = match session {
            Some(mut session) => self.rooms.leave(&mut session).await.err(),
            None => None,
        };

        let mut inner = self.inner.lock();
        self.transition(&mut inner, SessionState::Idle);
        match disconnect_error {
            Some(e) => {
                self.record_error(&mut inner, e);
                self.set_status(&mut inner, "Left room (disconnect reported an error)");
            }
            None => self.set_status(&mut inner, "Left room"),
        }
        Ok(())
    }

    async fn prepare(&self, user_gesture: bool) -> Result<SessionState, CitycastError> {
        {
            let mut inner = self.inner.lock();
            self.transition(&mut inner, SessionState::PermissionPending);
            self.set_status(&mut inner, "Requesting camera and microphone permission...");
        }

        match self.permissions.request_permission(user_gesture).await {
            Ok(PermissionState::Granted) => {
                let epoch = {
                    let mut inner = self.inner.lock();
                    inner.last_error = None;
                    self.transition(&mut inner, SessionState::PermissionGranted);
                    self.set_status(&mut inner, "Camera and microphone permission granted");
                    inner.epoch
                };
                self.load_catalog(epoch).await
            }
            Ok(_) => {
                let reason = self
                    .permissions
                    .last_denial()
                    .unwrap_or_else(|| "permission not granted".to_string());
                let error = CitycastError::PermissionDenied { reason };
                let epoch = {
                    let mut inner = self.inner.lock();
                    self.record_error(&mut inner, error.clone());
                    self.transition(&mut inner, SessionState::PermissionDenied);
                    self.set_status(
                        &mut inner,
                        "Camera or microphone permission denied. Press Grant to try again.",
                    );
                    inner.epoch
                };
                // Selectors still show positional fallback names before a grant.
                if let Ok(catalog) = self.catalogs.build_catalog().await {
                    let mut inner = self.inner.lock();
                    if inner.epoch == epoch {
                        inner.catalog = catalog;
                    } else {
                        debug!(state = %inner.state, "Discarding pre-grant device listing");
                    }
                }
                Err(error)
            }
            Err(e) => {
                let mut inner = self.inner.lock();
                if matches!(e, CitycastError::InsecureContext { .. }) {
                    self.transition(&mut inner, SessionState::Idle);
                    self.disable_capture(&mut inner, e.clone());
                } else {
                    self.record_error(&mut inner, e.clone());
                    self.transition(&mut inner, SessionState::PermissionDenied);
                }
                Err(e)
            }
        }
    }

    /// Build the catalog and settle in `DevicesReady`
    ///
    /// The result only applies while the controller is still in the epoch
    /// the listing started in.
    async fn load_catalog(&self, epoch: u64) -> Result<SessionState, CitycastError> {
        self.emit_status("Loading devices...");
        let built = self.catalogs.build_catalog().await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(state = %inner.state, "Discarding stale device listing");
            return Err(invalid_state(
                "PermissionGranted, DevicesReady or JoinFailed",
                inner.state,
            ));
        }
        match built {
            Ok(catalog) => {
                info!(
                    cameras = catalog.cameras().len(),
                    microphones = catalog.microphones().len(),
                    "Devices ready"
                );
                inner.catalog = catalog;
                inner.last_error = None;
                if inner.state != SessionState::DevicesReady {
                    self.transition(&mut inner, SessionState::DevicesReady);
                }
                self.set_status(&mut inner, "Ready to join");
                Ok(inner.state)
            }
            Err(e) => {
                if inner.state == SessionState::DevicesReady {
                    self.transition(&mut inner, SessionState::PermissionGranted);
                }
                self.record_error(&mut inner, e.clone());
                self.set_status(&mut inner, "Could not list devices. Try refreshing.");
                Err(e)
            }
        }
    }

    fn resolve_identity(&self) -> Result<OperatorSession, CitycastError> {
        let session = self
            .identity
            .session()
            .ok_or_else(|| CitycastError::Unauthenticated {
                reason: "no operator signed in".to_string(),
            })?;

        if let Some(required) = &self.config.required_role {
            if &session.role != required {
                return Err(CitycastError::Unauthenticated {
                    reason: format!("role '{}' required, operator has '{}'", required, session.role),
                });
            }
        }
        Ok(session)
    }

    fn check_cancelled(&self, attempt: u64) -> Option<CitycastError> {
        let inner = self.inner.lock();
        if inner.attempt == attempt && inner.state == SessionState::Joining {
            None
        } else {
            Some(CitycastError::JoinCancelled { attempt })
        }
    }

    fn discard_tracks(
        &self,
        cancelled: CitycastError,
        mut tracks: LocalCaptureHandles,
    ) -> CitycastError {
        debug!("Releasing tracks of a cancelled join");
        tracks.release();
        cancelled
    }

    fn fail_join(
        &self,
        attempt: u64,
        error: CitycastError,
        tracks: Option<LocalCaptureHandles>,
    ) -> CitycastError {
        if let Some(mut tracks) = tracks {
            tracks.release();
        }

        let mut inner = self.inner.lock();
        if inner.attempt != attempt || inner.state != SessionState::Joining {
            debug!(attempt, "Join failed after cancellation: {}", error);
            return CitycastError::JoinCancelled { attempt };
        }

        warn!(attempt, code = error.error_code(), "Join failed: {}", error);
        self.record_error(&mut inner, error.clone());
        self.transition(&mut inner, SessionState::JoinFailed);
        let message = format!("Join failed: {}", error);
        self.set_status(&mut inner, &message);
        error
    }

    fn disable_capture(&self, inner: &mut ControllerInner, error: CitycastError) {
        warn!("Capture disabled: {}", error);
        inner.capture_disabled = true;
        self.record_error(inner, error);
        self.set_status(inner, "Camera and microphone need a secure (https) origin");
    }

    fn transition(&self, inner: &mut ControllerInner, to: SessionState) {
        let from = inner.state;
        inner.state = to;
        inner.epoch += 1;
        info!(%from, %to, "Session state changed");
        self.trace
            .record(from, to, inner.last_error.as_ref().map(|e| e.kind()));
        let _ = self.events.send(SessionEvent::StateChanged { from, to });
    }

    fn record_error(&self, inner: &mut ControllerInner, error: CitycastError) {
        let _ = self.events.send(SessionEvent::Error {
            kind: error.kind(),
            message: error.to_string(),
        });
        inner.last_error = Some(error);
    }

    fn set_status(&self, inner: &mut ControllerInner, message: &str) {
        info!(target: "city", state = %inner.state, "{}", message);
        inner.status = message.to_string();
        let _ = self.events.send(SessionEvent::Status {
            message: message.to_string(),
        });
    }

    fn emit_status(&self, message: &str) {
        let mut inner = self.inner.lock();
        self.set_status(&mut inner, message);
    }
}

fn invalid_state(expected: &str, actual: SessionState) -> CitycastError {
    CitycastError::InvalidState {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn capture_disabled_error(inner: &ControllerInner) -> Option<CitycastError> {
    if !inner.capture_disabled {
        return None;
    }
    Some(
        inner
            .last_error
            .clone()
            .filter(|e| matches!(e, CitycastError::InsecureContext { .. }))
            .unwrap_or(CitycastError::InsecureContext {
                origin: String::new(),
            }),
    )
}
