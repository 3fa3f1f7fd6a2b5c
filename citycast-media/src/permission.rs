//! Capture permission negotiation
//!
//! The manager probes the platform once (audio and video together), releases
//! the probe streams immediately, and remembers the outcome. Concurrent callers
//! share one underlying prompt.

use crate::capture::{CapturePlatform, PermissionRequest};
use crate::error::MediaError;
use citycast_core::{CitycastError, SecureOrigin};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capture permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// Never asked
    Unknown,
    /// A prompt is in flight
    Pending,
    /// Capture allowed
    Granted,
    /// Capture refused; a fresh request may try again
    Denied,
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Unknown => write!(f, "unknown"),
            PermissionState::Pending => write!(f, "pending"),
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
        }
    }
}

type PermissionOutcome = Result<PermissionState, CitycastError>;
type SharedPrompt = Shared<BoxFuture<'static, PermissionOutcome>>;

struct PermissionInner {
    state: PermissionState,
    last_denial: Option<String>,
    in_flight: Option<SharedPrompt>,
}

/// Negotiates capture permission with the platform
pub struct PermissionManager {
    platform: Arc<dyn CapturePlatform>,
    origin: String,
    inner: Arc<Mutex<PermissionInner>>,
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("origin", &self.origin)
            .field("state", &self.state())
            .finish()
    }
}

impl PermissionManager {
    /// Create a manager for pages served from `origin`
    pub fn new(platform: Arc<dyn CapturePlatform>, origin: &str) -> Self {
        Self {
            platform,
            origin: origin.to_string(),
            inner: Arc::new(Mutex::new(PermissionInner {
                state: PermissionState::Unknown,
                last_denial: None,
                in_flight: None,
            })),
        }
    }

    /// Get the current permission state
    pub fn state(&self) -> PermissionState {
        self.inner.lock().state
    }

    /// Reason given by the platform for the most recent denial
    pub fn last_denial(&self) -> Option<String> {
        self.inner.lock().last_denial.clone()
    }

    /// Request capture permission
    ///
    /// Resolves to [`PermissionState::Granted`] or [`PermissionState::Denied`].
    /// Returns immediately when permission is already granted, and joins the
    /// in-flight prompt when one exists. Fails with
    /// [`CitycastError::InsecureContext`] without prompting when the origin is
    /// not a secure context.
    pub async fn request_permission(&self, user_gesture: bool) -> PermissionOutcome {
        SecureOrigin::check(&self.origin)?;

        let prompt = {
            let mut inner = self.inner.lock();
            if inner.state == PermissionState::Granted {
                debug!("Permission already granted, skipping prompt");
                return Ok(PermissionState::Granted);
            }

            match &inner.in_flight {
                Some(prompt) => {
                    debug!("Joining in-flight permission prompt");
                    prompt.clone()
                }
                None => {
                    inner.state = PermissionState::Pending;
                    let prompt = Self::prompt(
                        Arc::clone(&self.platform),
                        Arc::clone(&self.inner),
                        user_gesture,
                    );
                    inner.in_flight = Some(prompt.clone());
                    prompt
                }
            }
        };

        prompt.await
    }

    fn prompt(
        platform: Arc<dyn CapturePlatform>,
        inner: Arc<Mutex<PermissionInner>>,
        user_gesture: bool,
    ) -> SharedPrompt {
        async move {
            info!(user_gesture, "Requesting camera/microphone permission");
            let request = PermissionRequest::probe(user_gesture);
            let result = platform.request_permission(&request).await;

            let (state, denial) = match result {
                Ok(probe) => {
                    // The probe only surfaces labels and records the grant.
                    for handle in &probe {
                        handle.stop();
                    }
                    info!(released = probe.len(), "Capture permission granted");
                    (PermissionState::Granted, None)
                }
                Err(error) => {
                    let reason = match &error {
                        MediaError::NotAllowed { reason } => reason.clone(),
                        other => other.to_string(),
                    };
                    warn!(%reason, "Capture permission denied");
                    (PermissionState::Denied, Some(reason))
                }
            };

            let mut inner = inner.lock();
            inner.state = state;
            inner.last_denial = denial;
            inner.in_flight = None;
            Ok(state)
        }
        .boxed()
        .shared()
    }
}
