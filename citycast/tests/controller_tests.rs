//! End-to-end tests for the session controller
//!
//! The capture side runs on the simulated platform; the token service, room
//! transport and preview are in-memory doubles that record what they saw.

use async_trait::async_trait;
use citycast::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// TEST DOUBLES
// ============================================================================

#[derive(Default)]
struct FakeTokens {
    requests: Mutex<Vec<(TokenRequest, String)>>,
    fail: Mutex<Option<CitycastError>>,
    gated: Mutex<bool>,
    entered: Notify,
    release: Notify,
}

impl FakeTokens {
    fn fail_with(&self, error: Option<CitycastError>) {
        *self.fail.lock() = error;
    }

    fn gate(&self) {
        *self.gated.lock() = true;
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TokenService for FakeTokens {
    async fn issue_token(
        &self,
        request: &TokenRequest,
        credential: &str,
    ) -> Result<RoomConnectionToken, CitycastError> {
        self.requests
            .lock()
            .push((request.clone(), credential.to_string()));

        let gated = *self.gated.lock();
        if gated {
            self.entered.notify_one();
            self.release.notified().await;
        }

        if let Some(error) = self.fail.lock().clone() {
            return Err(error);
        }
        Ok(RoomConnectionToken {
            url: "wss://rooms.example/rtc".to_string(),
            token: format!("jwt-for-{}", request.identity),
        })
    }
}

struct FakeTransport {
    platform: Arc<SimulatedPlatform>,
    fail_connect: Mutex<bool>,
    fail_disconnect: Mutex<bool>,
    connects: AtomicUsize,
    published: Mutex<Vec<TrackInfo>>,
    disconnects: Arc<AtomicUsize>,
    live_at_disconnect: Arc<AtomicUsize>,
}

impl FakeTransport {
    fn new(platform: Arc<SimulatedPlatform>) -> Self {
        Self {
            platform,
            fail_connect: Mutex::new(false),
            fail_disconnect: Mutex::new(false),
            connects: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
            disconnects: Arc::new(AtomicUsize::new(0)),
            live_at_disconnect: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoomTransport for FakeTransport {
    async fn connect(
        &self,
        token: &RoomConnectionToken,
        tracks: &LocalCaptureHandles,
    ) -> Result<Box<dyn RoomConnection>, CitycastError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if *self.fail_connect.lock() {
            return Err(CitycastError::RoomConnectFailed {
                url: token.url.clone(),
                reason: "connection refused".to_string(),
            });
        }

        *self.published.lock() = tracks.track_infos();
        Ok(Box::new(FakeConnection {
            url: token.url.clone(),
            open: true,
            fail: *self.fail_disconnect.lock(),
            platform: Arc::clone(&self.platform),
            disconnects: Arc::clone(&self.disconnects),
            live_at_disconnect: Arc::clone(&self.live_at_disconnect),
        }))
    }
}

struct FakeConnection {
    url: String,
    open: bool,
    fail: bool,
    platform: Arc<SimulatedPlatform>,
    disconnects: Arc<AtomicUsize>,
    live_at_disconnect: Arc<AtomicUsize>,
}

#[async_trait]
impl RoomConnection for FakeConnection {
    fn url(&self) -> &str {
        &self.url
    }

    fn is_connected(&self) -> bool {
        self.open
    }

    async fn disconnect(&mut self) -> Result<(), CitycastError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.live_at_disconnect
            .store(self.platform.live_handles(), Ordering::SeqCst);
        if self.fail {
            return Err(CitycastError::RoomConnectFailed {
                url: self.url.clone(),
                reason: "socket reset".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakePreview {
    attached: Mutex<Option<(String, String)>>,
    detaches: AtomicUsize,
}

impl PreviewSink for FakePreview {
    fn attach(&self, track: &dyn CaptureHandle) {
        *self.attached.lock() = Some((track.id().to_string(), track.device_id().to_string()));
    }

    fn detach(&self) {
        *self.attached.lock() = None;
        self.detaches.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    platform: Arc<SimulatedPlatform>,
    tokens: Arc<FakeTokens>,
    transport: Arc<FakeTransport>,
    preview: Arc<FakePreview>,
    identity: Arc<StaticIdentityStore>,
    controller: Arc<SessionController>,
}

fn operator(role: &str) -> OperatorSession {
    OperatorSession {
        username: "operator-7".to_string(),
        token: "bearer-1".to_string(),
        role: role.to_string(),
    }
}

fn config(origin: &str) -> ControllerConfig {
    ControllerConfig {
        origin: origin.to_string(),
        ..ControllerConfig::default()
    }
    .with_room("old-town")
}

fn desk() -> SimulatedPlatform {
    SimulatedPlatform::new()
        .with_camera("cam-1", "Desk Camera", Some(FacingMode::User))
        .with_camera("cam-2", "Street Camera", None)
        .with_microphone("mic-1", "Desk Microphone")
}

fn harness_with(platform: SimulatedPlatform, config: ControllerConfig) -> Harness {
    let platform = Arc::new(platform);
    let tokens = Arc::new(FakeTokens::default());
    let transport = Arc::new(FakeTransport::new(Arc::clone(&platform)));
    let preview = Arc::new(FakePreview::default());
    let identity = Arc::new(StaticIdentityStore::new(operator("city")));

    let controller = SessionController::builder(config)
        .platform(platform.clone())
        .token_service(tokens.clone())
        .transport(transport.clone())
        .identity(identity.clone())
        .preview(preview.clone())
        .build()
        .unwrap();

    Harness {
        platform,
        tokens,
        transport,
        preview,
        identity,
        controller,
    }
}

fn harness(platform: SimulatedPlatform) -> Harness {
    harness_with(platform, config("https://city.example"))
}

async fn ready(platform: SimulatedPlatform) -> Harness {
    let h = harness(platform);
    assert_eq!(h.controller.boot().await.unwrap(), SessionState::DevicesReady);
    h
}

// ============================================================================
// FULL SESSION
// ============================================================================

#[tokio::test]
async fn test_denied_then_granted_join_and_leave() -> anyhow::Result<()> {
    let h = harness(desk().require_gesture());

    // Probe without a gesture is refused
    let booted = h.controller.boot().await;
    assert!(matches!(booted, Err(CitycastError::PermissionDenied { .. })));
    assert_eq!(h.controller.state(), SessionState::PermissionDenied);
    assert_eq!(h.controller.status_line(), "PermissionDenied (PermissionDenied)");
    let controls = h.controller.controls();
    assert!(controls.grant && !controls.join && !controls.leave);

    // Selectors already list the cameras under fallback names
    let catalog = h.controller.catalog();
    assert_eq!(catalog.cameras().len(), 2);
    assert_eq!(catalog.cameras()[0].display_label(), "Camera 1 (default)");
    assert_eq!(catalog.microphones()[0].display_label(), "Default microphone");

    // Grant under a gesture
    assert_eq!(h.controller.grant().await?, SessionState::DevicesReady);
    assert_eq!(h.controller.status_line(), "DevicesReady");
    let catalog = h.controller.catalog();
    assert_eq!(catalog.cameras()[1].display_label(), "Street Camera");
    assert_eq!(h.platform.live_handles(), 0);

    h.controller.select_from_values("cam-2", "");
    h.controller.join().await?;
    assert_eq!(h.controller.state(), SessionState::Connected);
    assert!(h.controller.session_id().is_some());
    assert_eq!(h.platform.live_handles(), 2);

    let (request, credential) = h.tokens.requests.lock()[0].clone();
    assert_eq!(request.room_name, "old-town");
    assert_eq!(request.identity, "operator-7");
    assert!(request.publish && request.subscribe);
    assert_eq!(credential, "bearer-1");

    let published = h.transport.published.lock().clone();
    assert_eq!(published.len(), 2);
    let (_, previewed_device) = h.preview.attached.lock().clone().unwrap();
    assert_eq!(previewed_device, "cam-2");

    h.controller.leave().await?;
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.controller.status_line(), "Idle");
    assert!(h.controller.session_id().is_none());
    assert_eq!(h.platform.live_handles(), 0);
    assert_eq!(h.transport.live_at_disconnect.load(Ordering::SeqCst), 2);
    assert!(h.preview.attached.lock().is_none());
    assert_eq!(h.preview.detaches.load(Ordering::SeqCst), 1);

    let path = h.controller.trace().path();
    assert_eq!(
        path,
        vec![
            "PermissionPending",
            "PermissionDenied",
            "PermissionPending",
            "PermissionGranted",
            "DevicesReady",
            "Joining",
            "Connected",
            "Leaving",
            "Idle",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_boot_after_leave_does_not_prompt_again() {
    let h = ready(desk()).await;
    h.controller.join().await.unwrap();
    h.controller.leave().await.unwrap();

    assert_eq!(h.controller.boot().await.unwrap(), SessionState::DevicesReady);
    assert_eq!(h.platform.prompt_count(), 1);
    h.controller.join().await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_auto_probe_disabled_waits_for_grant() {
    let mut config = config("https://city.example");
    config.auto_probe = false;
    let h = harness_with(desk(), config);

    assert_eq!(h.controller.boot().await.unwrap(), SessionState::Idle);
    assert_eq!(h.platform.prompt_count(), 0);
    assert!(h.controller.controls().grant);

    assert_eq!(h.controller.grant().await.unwrap(), SessionState::DevicesReady);
    assert_eq!(h.platform.prompt_count(), 1);
}

#[tokio::test]
async fn test_spawned_boot_reaches_ready() {
    let h = harness(desk());
    let booted = h.controller.spawn_boot().await.unwrap();
    assert_eq!(booted.unwrap(), SessionState::DevicesReady);
}

// ============================================================================
// LEAVE AND CANCELLATION
// ============================================================================

#[tokio::test]
async fn test_double_leave_disconnects_once() {
    let h = ready(desk()).await;
    h.controller.join().await.unwrap();

    h.controller.leave().await.unwrap();
    h.controller.leave().await.unwrap();

    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.transport.disconnects(), 1);
    assert_eq!(h.preview.detaches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_leave_when_idle_is_noop() {
    let h = harness(desk());
    tokio_test::assert_ok!(h.controller.leave().await);
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert!(h.controller.trace().records().is_empty());
}

#[tokio::test]
async fn test_failed_disconnect_still_releases_everything() {
    let h = ready(desk()).await;
    *h.transport.fail_disconnect.lock() = true;
    h.controller.join().await.unwrap();

    h.controller.leave().await.unwrap();

    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.platform.live_handles(), 0);
    assert_eq!(h.preview.detaches.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.status_line(), "Idle (RoomConnectFailed)");
}

#[tokio::test]
async fn test_leave_during_join_cancels_it() {
    let h = ready(desk()).await;
    h.tokens.gate();

    let join = tokio::spawn({
        let controller = Arc::clone(&h.controller);
        async move { controller.join().await }
    });

    h.tokens.entered.notified().await;
    assert_eq!(h.controller.state(), SessionState::Joining);
    assert!(h.controller.controls().leave);

    h.controller.leave().await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Idle);

    h.tokens.release.notify_one();
    let result = join.await.unwrap();
    assert!(matches!(result, Err(CitycastError::JoinCancelled { attempt: 1 })));

    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.transport.connects(), 0);
    assert_eq!(h.platform.live_handles(), 0);
}

#[tokio::test]
async fn test_second_join_rejected_while_joining() {
    let h = ready(desk()).await;
    h.tokens.gate();

    let join = tokio::spawn({
        let controller = Arc::clone(&h.controller);
        async move { controller.join().await }
    });
    h.tokens.entered.notified().await;

    let second = h.controller.join().await;
    assert!(matches!(second, Err(CitycastError::InvalidState { .. })));

    h.tokens.release.notify_one();
    join.await.unwrap().unwrap();

    assert_eq!(h.controller.state(), SessionState::Connected);
    assert_eq!(h.tokens.calls(), 1);
    assert_eq!(h.platform.live_handles(), 2);
}

#[tokio::test]
async fn test_slow_refresh_does_not_undo_join() {
    let h = ready(desk().with_enumeration_delay(Duration::from_millis(200))).await;

    let refresh = tokio::spawn({
        let controller = Arc::clone(&h.controller);
        async move { controller.refresh_devices().await }
    });
    while h.controller.status_message() != "Loading devices..." {
        tokio::task::yield_now().await;
    }

    h.controller.join().await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Connected);

    let refreshed = refresh.await.unwrap();
    assert!(matches!(refreshed, Err(CitycastError::InvalidState { .. })));
    assert_eq!(h.controller.state(), SessionState::Connected);
    assert!(h.controller.session_id().is_some());
    assert!(h.controller.controls().leave);

    h.controller.leave().await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.transport.disconnects(), 1);
    assert_eq!(h.transport.connects(), 1);
    assert_eq!(h.platform.live_handles(), 0);
}

#[tokio::test]
async fn test_join_rejected_before_devices_ready() {
    let h = harness(desk());
    let result = h.controller.join().await;
    assert!(matches!(result, Err(CitycastError::InvalidState { .. })));
    assert_eq!(h.controller.state(), SessionState::Idle);
    assert_eq!(h.platform.created_handles(), 0);
}

// ============================================================================
// JOIN FAILURES
// ============================================================================

#[tokio::test]
async fn test_token_failure_releases_tracks_and_allows_retry() {
    let h = ready(desk()).await;
    h.tokens.fail_with(Some(CitycastError::TokenExchangeFailed {
        room: "old-town".to_string(),
        status: Some(403),
        reason: "forbidden".to_string(),
    }));

    let result = h.controller.join().await;
    assert!(matches!(
        result,
        Err(CitycastError::TokenExchangeFailed {
            status: Some(403),
            ..
        })
    ));
    assert_eq!(h.controller.state(), SessionState::JoinFailed);
    assert_eq!(h.controller.status_line(), "JoinFailed (TokenExchangeFailed)");
    assert_eq!(h.platform.live_handles(), 0);
    assert!(h.controller.controls().join);

    h.tokens.fail_with(None);
    h.controller.join().await.unwrap();
    assert_eq!(h.controller.state(), SessionState::Connected);
    assert_eq!(h.controller.status_line(), "Connected");

    let path = h.controller.trace().path();
    assert_eq!(
        path[path.len() - 4..].to_vec(),
        vec!["JoinFailed", "DevicesReady", "Joining", "Connected"]
    );
}

#[tokio::test]
async fn test_connect_failure_releases_tracks() {
    let h = ready(desk()).await;
    *h.transport.fail_connect.lock() = true;

    let result = h.controller.join().await;
    assert!(matches!(result, Err(CitycastError::RoomConnectFailed { .. })));
    assert_eq!(h.controller.state(), SessionState::JoinFailed);
    assert_eq!(h.platform.live_handles(), 0);
    assert!(h.preview.attached.lock().is_none());
}

#[tokio::test]
async fn test_unavailable_back_camera_fails_join() {
    let h = ready(
        SimulatedPlatform::new()
            .with_camera("cam-1", "FaceTime HD Camera", Some(FacingMode::User))
            .with_microphone("mic-1", "MacBook Microphone"),
    )
    .await;

    h.controller.select_camera(CameraChoice::Back);
    let result = h.controller.join().await;

    assert!(matches!(
        result,
        Err(CitycastError::CaptureConstraintError { .. })
    ));
    assert_eq!(h.controller.state(), SessionState::JoinFailed);
    assert_eq!(h.tokens.calls(), 0);
    assert_eq!(h.platform.live_handles(), 0);
}

#[tokio::test]
async fn test_busy_camera_reported() {
    let h = ready(desk()).await;
    h.platform.set_busy("cam-1", true);

    let result = h.controller.join().await;
    assert!(matches!(result, Err(CitycastError::CaptureDeviceBusy { .. })));
    assert_eq!(h.controller.status_line(), "JoinFailed (CaptureDeviceBusy)");
}

#[tokio::test]
async fn test_operator_without_city_role_rejected() {
    let h = ready(desk()).await;
    h.identity.set(operator("viewer"));

    let result = h.controller.join().await;
    assert!(matches!(result, Err(CitycastError::Unauthenticated { .. })));
    assert_eq!(h.controller.state(), SessionState::JoinFailed);
    assert_eq!(h.tokens.calls(), 0);

    h.identity.clear();
    let result = h.controller.join().await;
    assert!(matches!(result, Err(CitycastError::Unauthenticated { .. })));
}

// ============================================================================
// ORIGIN AND DEVICE DISCOVERY
// ============================================================================

#[tokio::test]
async fn test_insecure_origin_disables_capture() {
    let h = harness_with(desk(), config("http://city.example"));

    let booted = h.controller.boot().await;
    assert!(matches!(booted, Err(CitycastError::InsecureContext { .. })));
    assert!(h.controller.is_capture_disabled());
    assert_eq!(h.controller.controls(), Controls::default());
    assert_eq!(h.platform.prompt_count(), 0);

    assert!(matches!(
        h.controller.grant().await,
        Err(CitycastError::InsecureContext { .. })
    ));
    assert!(matches!(
        h.controller.join().await,
        Err(CitycastError::InsecureContext { .. })
    ));
    assert_eq!(h.controller.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_hidden_cameras_get_synthetic_entries() {
    let h = harness(
        SimulatedPlatform::new()
            .with_camera("cam-front", "Front Camera", Some(FacingMode::User))
            .with_camera("cam-back", "Back Camera", Some(FacingMode::Environment))
            .with_microphone("mic-1", "Phone Microphone")
            .hide_cameras_until_granted()
            .require_gesture(),
    );

    let _ = h.controller.boot().await;
    let catalog = h.controller.catalog();
    assert!(catalog.has_synthetic_cameras());
    let labels: Vec<&str> = catalog.cameras().iter().map(|c| c.display_label()).collect();
    assert_eq!(labels, vec!["Front camera", "Back camera"]);
    assert_eq!(catalog.cameras()[1].selector_value(), "environment");

    h.controller.grant().await.unwrap();
    let catalog = h.controller.catalog();
    assert!(!catalog.has_synthetic_cameras());
    assert_eq!(catalog.cameras()[1].display_label(), "Back Camera");
}

#[tokio::test]
async fn test_late_pre_grant_listing_keeps_granted_catalog() {
    let h = harness(
        desk()
            .hide_cameras_until_granted()
            .require_gesture()
            .with_enumeration_delay(Duration::from_millis(200)),
    );

    let boot = h.controller.spawn_boot();
    while h.controller.state() != SessionState::PermissionDenied {
        tokio::task::yield_now().await;
    }

    h.platform.set_enumeration_delay(None);
    assert_eq!(h.controller.grant().await.unwrap(), SessionState::DevicesReady);

    let booted = boot.await.unwrap();
    assert!(matches!(booted, Err(CitycastError::PermissionDenied { .. })));

    assert_eq!(h.controller.state(), SessionState::DevicesReady);
    let catalog = h.controller.catalog();
    assert!(!catalog.has_synthetic_cameras());
    assert_eq!(catalog.cameras().len(), 2);
    assert_eq!(catalog.cameras()[1].display_label(), "Street Camera");
}

#[tokio::test]
async fn test_enumeration_unavailable_stays_granted() {
    let h = harness(desk().without_enumeration());

    let booted = h.controller.boot().await;
    assert!(matches!(
        booted,
        Err(CitycastError::EnumerationUnavailable { .. })
    ));
    assert_eq!(h.controller.state(), SessionState::PermissionGranted);
    assert_eq!(
        h.controller.status_line(),
        "PermissionGranted (EnumerationUnavailable)"
    );
    assert!(h.controller.controls().grant);
    assert!(!h.controller.controls().join);

    let refreshed = h.controller.refresh_devices().await;
    assert!(refreshed.is_err());
    assert_eq!(h.controller.state(), SessionState::PermissionGranted);
}

#[tokio::test]
async fn test_back_camera_selected_by_facing() {
    let h = ready(
        SimulatedPlatform::new()
            .with_camera("cam-front", "Front Camera", Some(FacingMode::User))
            .with_camera("cam-back", "Back Camera", Some(FacingMode::Environment))
            .with_microphone("mic-1", "Phone Microphone")
            .hide_cameras_until_granted(),
    )
    .await;

    assert_eq!(h.controller.catalog().cameras().len(), 2);
    assert!(!h.controller.catalog().has_synthetic_cameras());

    h.controller.select_from_values("environment", "");
    h.controller.join().await.unwrap();
    let (_, device) = h.preview.attached.lock().clone().unwrap();
    assert_eq!(device, "cam-back");
}

// ============================================================================
// EVENTS AND CONTROLS
// ============================================================================

#[tokio::test]
async fn test_events_follow_transitions() {
    let h = harness(desk());
    let mut events = h.controller.subscribe();

    h.controller.boot().await.unwrap();
    let received = events.drain();

    let transitions: Vec<(SessionState, SessionState)> = received
        .iter()
        .filter_map(|e| match e {
            SessionEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (SessionState::Idle, SessionState::PermissionPending),
            (SessionState::PermissionPending, SessionState::PermissionGranted),
            (SessionState::PermissionGranted, SessionState::DevicesReady),
        ]
    );
    assert!(received
        .iter()
        .any(|e| matches!(e, SessionEvent::Status { message } if message == "Ready to join")));
    assert!(!received.iter().any(|e| e.is_error_event()));
}

#[tokio::test]
async fn test_join_failure_emits_error_event() {
    let h = ready(desk()).await;
    let mut events = h.controller.subscribe();
    *h.transport.fail_connect.lock() = true;

    let _ = h.controller.join().await;
    let errors: Vec<ErrorKind> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Error { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![ErrorKind::RoomConnectFailed]);
}

#[tokio::test]
async fn test_control_panel_binds_once() {
    let h = ready(desk()).await;
    let panel = ControlPanel::new(Arc::clone(&h.controller));

    assert!(panel.activate(Control::Join).await.is_none());
    assert!(!panel.enabled(Control::Join));

    assert!(panel.attach(Control::Join));
    assert!(!panel.attach(Control::Join));
    assert!(panel.enabled(Control::Join));

    panel.activate(Control::Join).await.unwrap().unwrap();
    assert_eq!(h.controller.state(), SessionState::Connected);
    assert_eq!(h.tokens.calls(), 1);
    assert!(!panel.enabled(Control::Join));

    // Leave is not bound yet
    assert!(!panel.enabled(Control::Leave));
    panel.attach(Control::Leave);
    assert!(panel.enabled(Control::Leave));
    panel.activate(Control::Leave).await.unwrap().unwrap();
    assert_eq!(h.controller.state(), SessionState::Idle);

    assert!(panel.detach(Control::Join));
    assert!(!panel.detach(Control::Join));
}

#[tokio::test]
async fn test_control_panel_grant_after_denial() {
    let h = harness(desk().require_gesture());
    let panel = ControlPanel::with_all(Arc::clone(&h.controller));

    let _ = h.controller.boot().await;
    assert!(panel.enabled(Control::Grant));
    assert!(!panel.enabled(Control::Join));

    panel.activate(Control::Grant).await.unwrap().unwrap();
    assert_eq!(h.controller.state(), SessionState::DevicesReady);
    assert!(panel.enabled(Control::Join));
}
