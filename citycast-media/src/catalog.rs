//! Capture device catalog
//!
//! The catalog is rebuilt from scratch on every enumeration. Before permission
//! is granted most platforms hide labels (and some hide cameras entirely), so
//! entries fall back to positional names and an empty camera list is replaced
//! by two orientation-based entries.

use crate::capture::{CapturePlatform, DeviceKind, FacingMode, PlatformDevice};
use citycast_core::CitycastError;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a catalog entry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// A device the platform enumerated; an empty id means the system default
    Hardware {
        /// Opaque device identifier
        device_id: String,
    },
    /// A logical camera selected by orientation
    Synthetic(FacingMode),
}

/// One selectable capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    kind: DeviceKind,
    source: DeviceSource,
    display_label: String,
}

impl DeviceDescriptor {
    fn hardware(kind: DeviceKind, position: usize, device: &PlatformDevice) -> Self {
        let label = device.label.trim();
        let display_label = if label.is_empty() {
            fallback_label(kind, position)
        } else {
            label.to_string()
        };

        Self {
            kind,
            source: DeviceSource::Hardware {
                device_id: device.device_id.clone(),
            },
            display_label,
        }
    }

    fn synthetic(facing: FacingMode) -> Self {
        let display_label = match facing {
            FacingMode::User => "Front camera",
            FacingMode::Environment => "Back camera",
        };

        Self {
            kind: DeviceKind::Camera,
            source: DeviceSource::Synthetic(facing),
            display_label: display_label.to_string(),
        }
    }

    /// Get device kind
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Get entry source
    pub fn source(&self) -> &DeviceSource {
        &self.source
    }

    /// Device identifier, empty for synthetic entries and the system default
    pub fn id(&self) -> &str {
        match &self.source {
            DeviceSource::Hardware { device_id } => device_id,
            DeviceSource::Synthetic(_) => "",
        }
    }

    /// Get the label shown to the operator
    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    /// Check if this entry is an orientation rather than a device
    pub fn is_synthetic(&self) -> bool {
        matches!(self.source, DeviceSource::Synthetic(_))
    }

    /// Orientation of a synthetic entry
    pub fn facing(&self) -> Option<FacingMode> {
        match self.source {
            DeviceSource::Synthetic(facing) => Some(facing),
            DeviceSource::Hardware { .. } => None,
        }
    }

    /// Value a selector option carries for this entry
    pub fn selector_value(&self) -> String {
        match &self.source {
            DeviceSource::Hardware { device_id } => device_id.clone(),
            DeviceSource::Synthetic(facing) => facing.selector_value().to_string(),
        }
    }
}

fn fallback_label(kind: DeviceKind, position: usize) -> String {
    match (kind, position) {
        (DeviceKind::Camera, 0) => "Camera 1 (default)".to_string(),
        (DeviceKind::Camera, n) => format!("Camera {}", n + 1),
        (DeviceKind::Microphone, 0) => "Default microphone".to_string(),
        (DeviceKind::Microphone, n) => format!("Microphone {}", n + 1),
    }
}

/// Cameras and microphones in platform order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCatalog {
    cameras: Vec<DeviceDescriptor>,
    microphones: Vec<DeviceDescriptor>,
}

impl DeviceCatalog {
    /// Build a catalog from a raw platform listing
    pub fn from_devices(devices: &[PlatformDevice]) -> Self {
        let mut cameras = Vec::new();
        let mut microphones = Vec::new();

        for device in devices {
            match device.kind {
                DeviceKind::Camera => {
                    let position = cameras.len();
                    cameras.push(DeviceDescriptor::hardware(device.kind, position, device));
                }
                DeviceKind::Microphone => {
                    let position = microphones.len();
                    microphones.push(DeviceDescriptor::hardware(device.kind, position, device));
                }
            }
        }

        if cameras.is_empty() {
            cameras.push(DeviceDescriptor::synthetic(FacingMode::User));
            cameras.push(DeviceDescriptor::synthetic(FacingMode::Environment));
        }

        Self {
            cameras,
            microphones,
        }
    }

    /// Get camera entries
    pub fn cameras(&self) -> &[DeviceDescriptor] {
        &self.cameras
    }

    /// Get microphone entries
    pub fn microphones(&self) -> &[DeviceDescriptor] {
        &self.microphones
    }

    /// Camera used when the operator makes no explicit choice
    pub fn default_camera(&self) -> Option<&DeviceDescriptor> {
        self.cameras.first()
    }

    /// Microphone used when the operator makes no explicit choice
    pub fn default_microphone(&self) -> Option<&DeviceDescriptor> {
        self.microphones.first()
    }

    /// Check if the camera list is made of orientation entries only
    pub fn has_synthetic_cameras(&self) -> bool {
        self.cameras.iter().any(DeviceDescriptor::is_synthetic)
    }

    /// Check if the catalog has no entries at all
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty() && self.microphones.is_empty()
    }
}

/// Enumerates capture devices into a [`DeviceCatalog`]
pub struct DeviceCatalogBuilder {
    platform: Arc<dyn CapturePlatform>,
}

impl DeviceCatalogBuilder {
    /// Create a builder over `platform`
    pub fn new(platform: Arc<dyn CapturePlatform>) -> Self {
        Self { platform }
    }

    /// Enumerate devices and build a fresh catalog
    ///
    /// Safe to call before permission is granted. Fails with
    /// [`CitycastError::EnumerationUnavailable`] when the platform cannot
    /// enumerate devices.
    pub async fn build_catalog(&self) -> Result<DeviceCatalog, CitycastError> {
        let devices = self.platform.enumerate_devices().await.map_err(|e| {
            CitycastError::EnumerationUnavailable {
                reason: e.to_string(),
            }
        })?;
        debug!("Platform reported {} capture devices", devices.len());

        let catalog = DeviceCatalog::from_devices(&devices);
        info!(
            cameras = catalog.cameras().len(),
            microphones = catalog.microphones().len(),
            synthetic = catalog.has_synthetic_cameras(),
            "Device catalog built"
        );
        Ok(catalog)
    }
}
