//! In-process capture backend
//!
//! Behaves like a browser capture stack: labels stay hidden until permission
//! is granted, some configurations require a user gesture, devices can be held
//! by another process, and every live handle is counted so tests can check
//! that nothing keeps a camera open.

use super::{
    AudioConstraint, CaptureConstraints, CaptureHandle, CapturePlatform, DeviceKind, FacingMode,
    PermissionRequest, PlatformDevice, VideoConstraint,
};
use crate::error::MediaError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A device known to the simulated platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedDevice {
    /// Device identifier
    pub id: String,
    /// Hardware label
    pub label: String,
    /// Orientation, for cameras that report one
    pub facing: Option<FacingMode>,
}

#[derive(Debug, Default)]
struct SimulatedState {
    cameras: Vec<SimulatedDevice>,
    microphones: Vec<SimulatedDevice>,
    granted: bool,
    deny: bool,
    require_gesture: bool,
    enumeration: bool,
    hide_cameras_until_granted: bool,
    busy: HashSet<String>,
    prompt_delay: Option<Duration>,
    capture_delay: Option<Duration>,
    enumeration_delay: Option<Duration>,
}

/// Simulated capture platform
#[derive(Debug)]
pub struct SimulatedPlatform {
    state: Mutex<SimulatedState>,
    prompts: AtomicUsize,
    created: AtomicUsize,
    live: Arc<AtomicUsize>,
    next_track: AtomicU64,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    /// Create a platform with no devices and enumeration support
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                enumeration: true,
                ..SimulatedState::default()
            }),
            prompts: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            next_track: AtomicU64::new(1),
        }
    }

    /// Add a camera
    pub fn with_camera(self, id: &str, label: &str, facing: Option<FacingMode>) -> Self {
        self.state.lock().cameras.push(SimulatedDevice {
            id: id.to_string(),
            label: label.to_string(),
            facing,
        });
        self
    }

    /// Add a microphone
    pub fn with_microphone(self, id: &str, label: &str) -> Self {
        self.state.lock().microphones.push(SimulatedDevice {
            id: id.to_string(),
            label: label.to_string(),
            facing: None,
        });
        self
    }

    /// Refuse every permission request
    pub fn deny_permission(self) -> Self {
        self.set_deny(true);
        self
    }

    /// Refuse permission requests that lack a user gesture
    pub fn require_gesture(self) -> Self {
        self.state.lock().require_gesture = true;
        self
    }

    /// Report no enumeration capability
    pub fn without_enumeration(self) -> Self {
        self.state.lock().enumeration = false;
        self
    }

    /// List no cameras at all until permission is granted
    pub fn hide_cameras_until_granted(self) -> Self {
        self.state.lock().hide_cameras_until_granted = true;
        self
    }

    /// Start with permission already granted
    pub fn pre_granted(self) -> Self {
        self.state.lock().granted = true;
        self
    }

    /// Delay every permission prompt
    pub fn with_prompt_delay(self, delay: Duration) -> Self {
        self.state.lock().prompt_delay = Some(delay);
        self
    }

    /// Delay every capture request
    pub fn with_capture_delay(self, delay: Duration) -> Self {
        self.state.lock().capture_delay = Some(delay);
        self
    }

    /// Delay every device listing; the listing reflects the moment of the call
    pub fn with_enumeration_delay(self, delay: Duration) -> Self {
        self.set_enumeration_delay(Some(delay));
        self
    }

    /// Change the device listing delay
    pub fn set_enumeration_delay(&self, delay: Option<Duration>) {
        self.state.lock().enumeration_delay = delay;
    }

    /// Toggle blanket permission refusal
    pub fn set_deny(&self, deny: bool) {
        self.state.lock().deny = deny;
    }

    /// Mark a device as held by another process
    pub fn set_busy(&self, device_id: &str, busy: bool) {
        let mut state = self.state.lock();
        if busy {
            state.busy.insert(device_id.to_string());
        } else {
            state.busy.remove(device_id);
        }
    }

    /// Unplug a device
    pub fn remove_device(&self, device_id: &str) {
        let mut state = self.state.lock();
        state.cameras.retain(|d| d.id != device_id);
        state.microphones.retain(|d| d.id != device_id);
    }

    /// Check if permission has been granted
    pub fn is_granted(&self) -> bool {
        self.state.lock().granted
    }

    /// Number of permission prompts shown
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Number of capture handles ever opened
    pub fn created_handles(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of capture handles currently holding a device
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn snapshot_devices(&self) -> Result<(Vec<PlatformDevice>, Option<Duration>), MediaError> {
        let state = self.state.lock();
        if !state.enumeration {
            return Err(MediaError::Unsupported {
                capability: "enumerateDevices".to_string(),
            });
        }

        let reveal = |device: &SimulatedDevice, kind: DeviceKind| PlatformDevice {
            kind,
            device_id: device.id.clone(),
            label: if state.granted {
                device.label.clone()
            } else {
                String::new()
            },
        };

        let mut devices = Vec::new();
        if state.granted || !state.hide_cameras_until_granted {
            devices.extend(state.cameras.iter().map(|d| reveal(d, DeviceKind::Camera)));
        }
        devices.extend(
            state
                .microphones
                .iter()
                .map(|d| reveal(d, DeviceKind::Microphone)),
        );
        Ok((devices, state.enumeration_delay))
    }

    fn open(&self, kind: DeviceKind, device: &SimulatedDevice) -> Box<dyn CaptureHandle> {
        let seq = self.next_track.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated {} opened: {} (track {})", kind, device.id, seq);
        Box::new(SimulatedHandle {
            id: format!("{}-{}", kind, seq),
            kind,
            device_id: device.id.clone(),
            label: device.label.clone(),
            live: AtomicBool::new(true),
            counter: Arc::clone(&self.live),
        })
    }

    fn resolve_camera(
        state: &SimulatedState,
        constraint: &VideoConstraint,
    ) -> Result<SimulatedDevice, MediaError> {
        let found = match constraint {
            VideoConstraint::Any => state.cameras.first(),
            VideoConstraint::Device(id) => state.cameras.iter().find(|d| &d.id == id),
            VideoConstraint::Facing { mode, exact } => {
                let facing = state.cameras.iter().find(|d| d.facing == Some(*mode));
                match (facing, exact) {
                    (Some(device), _) => Some(device),
                    (None, true) => {
                        return Err(MediaError::Overconstrained {
                            constraint: constraint.to_string(),
                        })
                    }
                    (None, false) => state.cameras.first(),
                }
            }
        };

        found.cloned().ok_or_else(|| MediaError::NotFound {
            constraint: constraint.to_string(),
        })
    }

    fn resolve_microphone(
        state: &SimulatedState,
        constraint: &AudioConstraint,
    ) -> Result<SimulatedDevice, MediaError> {
        let found = match constraint {
            AudioConstraint::Any => state.microphones.first(),
            AudioConstraint::Device(id) => state.microphones.iter().find(|d| &d.id == id),
        };

        found.cloned().ok_or_else(|| MediaError::NotFound {
            constraint: constraint.to_string(),
        })
    }

    fn check_readable(state: &SimulatedState, device: &SimulatedDevice) -> Result<(), MediaError> {
        if state.busy.contains(&device.id) {
            return Err(MediaError::NotReadable {
                device_id: device.id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CapturePlatform for SimulatedPlatform {
    async fn request_permission(
        &self,
        request: &PermissionRequest,
    ) -> Result<Vec<Box<dyn CaptureHandle>>, MediaError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let delay = self.state.lock().prompt_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let (camera, microphone) = {
            let mut state = self.state.lock();
            if state.deny {
                return Err(MediaError::NotAllowed {
                    reason: "permission dismissed".to_string(),
                });
            }
            if state.require_gesture && !request.user_gesture {
                return Err(MediaError::NotAllowed {
                    reason: "user gesture required".to_string(),
                });
            }
            state.granted = true;
            (
                state.cameras.first().cloned().filter(|_| request.video),
                state.microphones.first().cloned().filter(|_| request.audio),
            )
        };

        let mut handles = Vec::new();
        if let Some(camera) = camera {
            handles.push(self.open(DeviceKind::Camera, &camera));
        }
        if let Some(microphone) = microphone {
            handles.push(self.open(DeviceKind::Microphone, &microphone));
        }
        Ok(handles)
    }

    async fn enumerate_devices(&self) -> Result<Vec<PlatformDevice>, MediaError> {
        let (devices, delay) = self.snapshot_devices()?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(devices)
    }

    async fn create_tracks(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Vec<Box<dyn CaptureHandle>>, MediaError> {
        let delay = self.state.lock().capture_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Resolve and check both devices before opening either one.
        let (camera, microphone) = {
            let state = self.state.lock();
            if !state.granted {
                return Err(MediaError::NotAllowed {
                    reason: "permission not granted".to_string(),
                });
            }
            let camera = Self::resolve_camera(&state, &constraints.video)?;
            let microphone = Self::resolve_microphone(&state, &constraints.audio)?;
            Self::check_readable(&state, &camera)?;
            Self::check_readable(&state, &microphone)?;
            (camera, microphone)
        };

        Ok(vec![
            self.open(DeviceKind::Camera, &camera),
            self.open(DeviceKind::Microphone, &microphone),
        ])
    }
}

#[derive(Debug)]
struct SimulatedHandle {
    id: String,
    kind: DeviceKind,
    device_id: String,
    label: String,
    live: AtomicBool,
    counter: Arc<AtomicUsize>,
}

impl CaptureHandle for SimulatedHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
