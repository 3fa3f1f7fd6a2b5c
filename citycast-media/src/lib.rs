//! # citycast media
//!
//! Local capture for the citycast session controller: negotiating capture
//! permission, enumerating cameras and microphones into a selectable catalog,
//! and turning an operator's selection into live capture handles.
//!
//! All platform access goes through the [`capture::CapturePlatform`] trait so
//! the same components drive a browser bridge, a native backend, or the
//! [`capture::SimulatedPlatform`] used in tests.

#![warn(clippy::all)]

pub mod capture;
pub mod catalog;
pub mod error;
pub mod permission;
pub mod selection;
pub mod tracks;

// Re-export main types
pub use capture::{
    AudioConstraint, CaptureConstraints, CaptureHandle, CapturePlatform, DeviceKind, FacingMode,
    PermissionRequest, PlatformDevice, SimulatedPlatform, VideoConstraint,
};
pub use catalog::{DeviceCatalog, DeviceCatalogBuilder, DeviceDescriptor, DeviceSource};
pub use error::{MediaError, MediaResult};
pub use permission::{PermissionManager, PermissionState};
pub use selection::{CameraChoice, CaptureSelection, MicrophoneChoice};
pub use tracks::{LocalCaptureHandles, TrackFactory, TrackInfo};
