//! Capture platform seam
//!
//! The platform owns the actual devices. It is asked for three things: a
//! permission probe, a device listing, and live capture for a set of
//! constraints.

pub mod simulated;

pub use simulated::{SimulatedDevice, SimulatedPlatform};

use crate::error::MediaError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Video input
    Camera,
    /// Audio input
    Microphone,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Camera => write!(f, "camera"),
            DeviceKind::Microphone => write!(f, "microphone"),
        }
    }
}

/// Logical camera orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Facing the operator
    User,
    /// Facing away from the operator
    Environment,
}

impl FacingMode {
    /// Value a camera selector carries for this orientation
    pub fn selector_value(&self) -> &'static str {
        match self {
            FacingMode::User => "front",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// A device as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    /// Device kind
    pub kind: DeviceKind,
    /// Opaque identifier, empty for the system default
    pub device_id: String,
    /// Hardware label, empty while the platform hides labels
    pub label: String,
}

/// Permission probe parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequest {
    /// Probe video capture
    pub video: bool,
    /// Probe audio capture
    pub audio: bool,
    /// Whether the request runs under a genuine user gesture
    pub user_gesture: bool,
}

impl PermissionRequest {
    /// Audio and video probe
    pub fn probe(user_gesture: bool) -> Self {
        Self {
            video: true,
            audio: true,
            user_gesture,
        }
    }
}

/// Video constraint passed to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoConstraint {
    /// Any available camera
    Any,
    /// A logical orientation; `exact` forbids substituting another camera
    Facing {
        /// Requested orientation
        mode: FacingMode,
        /// Hard requirement
        exact: bool,
    },
    /// One specific device
    Device(String),
}

impl fmt::Display for VideoConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoConstraint::Any => write!(f, "video=any"),
            VideoConstraint::Facing { mode, exact: true } => {
                write!(f, "facingMode={} (exact)", mode)
            }
            VideoConstraint::Facing { mode, exact: false } => write!(f, "facingMode={}", mode),
            VideoConstraint::Device(id) => write!(f, "video deviceId={}", id),
        }
    }
}

/// Audio constraint passed to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioConstraint {
    /// Any available microphone
    Any,
    /// One specific device
    Device(String),
}

impl fmt::Display for AudioConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioConstraint::Any => write!(f, "audio=any"),
            AudioConstraint::Device(id) => write!(f, "audio deviceId={}", id),
        }
    }
}

/// Full capture request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Video part
    pub video: VideoConstraint,
    /// Audio part
    pub audio: AudioConstraint,
}

/// A live capture stream
///
/// Stopping a handle releases the underlying device. `stop` must be safe to
/// call more than once.
pub trait CaptureHandle: Send + Sync + fmt::Debug {
    /// Unique track identifier
    fn id(&self) -> &str;
    /// Kind of device feeding this handle
    fn kind(&self) -> DeviceKind;
    /// Device identifier feeding this handle
    fn device_id(&self) -> &str;
    /// Device label
    fn label(&self) -> &str;
    /// Release the device
    fn stop(&self);
    /// Check if the handle still holds the device
    fn is_live(&self) -> bool;
}

/// Capture platform backend
///
/// Implementations must not leak devices: when a call fails, any handle
/// opened during that call is stopped before the error is returned.
#[async_trait]
pub trait CapturePlatform: Send + Sync {
    /// Open capture momentarily to obtain permission
    async fn request_permission(
        &self,
        request: &PermissionRequest,
    ) -> Result<Vec<Box<dyn CaptureHandle>>, MediaError>;

    /// List capture devices in platform order
    async fn enumerate_devices(&self) -> Result<Vec<PlatformDevice>, MediaError>;

    /// Open live capture for `constraints`
    async fn create_tracks(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Vec<Box<dyn CaptureHandle>>, MediaError>;
}
