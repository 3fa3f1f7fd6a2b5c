//! Local capture handles and the track factory

use crate::capture::{CaptureHandle, CapturePlatform, DeviceKind};
use crate::selection::CaptureSelection;
use citycast_core::CitycastError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Description of a local track, as published to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    /// Track identifier
    pub track_id: String,
    /// Track kind
    pub kind: DeviceKind,
    /// Device feeding the track
    pub device_id: String,
    /// Device label
    pub label: String,
}

/// Live capture streams owned by one session
///
/// Never empty while live. Every handle is stopped by [`release`](Self::release);
/// handles dropped without an explicit release are stopped on drop.
#[derive(Debug)]
pub struct LocalCaptureHandles {
    handles: Vec<Box<dyn CaptureHandle>>,
    released: bool,
}

impl LocalCaptureHandles {
    /// Take ownership of `handles`; returns `None` for an empty set
    pub fn from_handles(handles: Vec<Box<dyn CaptureHandle>>) -> Option<Self> {
        if handles.is_empty() {
            return None;
        }
        Some(Self {
            handles,
            released: false,
        })
    }

    /// Number of handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Always false: an empty set is never constructed
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Iterate over handles
    pub fn iter(&self) -> impl Iterator<Item = &dyn CaptureHandle> {
        self.handles.iter().map(|h| h.as_ref())
    }

    /// First video handle, used for local preview
    pub fn video(&self) -> Option<&dyn CaptureHandle> {
        self.iter().find(|h| h.kind() == DeviceKind::Camera)
    }

    /// First audio handle
    pub fn audio(&self) -> Option<&dyn CaptureHandle> {
        self.iter().find(|h| h.kind() == DeviceKind::Microphone)
    }

    /// Publishable description of every handle
    pub fn track_infos(&self) -> Vec<TrackInfo> {
        self.iter()
            .map(|h| TrackInfo {
                track_id: h.id().to_string(),
                kind: h.kind(),
                device_id: h.device_id().to_string(),
                label: h.label().to_string(),
            })
            .collect()
    }

    /// Check if every handle has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of handles still holding a device
    pub fn live_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_live()).count()
    }

    /// Stop every handle; repeated calls are no-ops
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for handle in &self.handles {
            debug!("Stopping local {} track {}", handle.kind(), handle.id());
            handle.stop();
        }
        self.released = true;
        info!("Released {} local capture handles", self.handles.len());
    }
}

impl Drop for LocalCaptureHandles {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "Local capture handles dropped without release, stopping {} tracks",
                self.handles.len()
            );
            self.release();
        }
    }
}

/// Turns a device selection into live capture handles
pub struct TrackFactory {
    platform: Arc<dyn CapturePlatform>,
}

impl TrackFactory {
    /// Create a factory over `platform`
    pub fn new(platform: Arc<dyn CapturePlatform>) -> Self {
        Self { platform }
    }

    /// Acquire capture for `selection`
    ///
    /// Fails with [`CitycastError::CaptureConstraintError`] when the platform
    /// rejects the resolved constraints and with
    /// [`CitycastError::CaptureDeviceBusy`] when a device is held elsewhere.
    /// On failure nothing is left open. On success the caller owns the handles.
    pub async fn create_tracks(
        &self,
        selection: &CaptureSelection,
    ) -> Result<LocalCaptureHandles, CitycastError> {
        let constraints = selection.resolve();
        info!(video = %constraints.video, audio = %constraints.audio, "Creating local tracks");

        let handles = self
            .platform
            .create_tracks(&constraints)
            .await
            .map_err(|e| {
                warn!("Local track creation failed: {}", e);
                CitycastError::from(e)
            })?;

        LocalCaptureHandles::from_handles(handles).ok_or_else(|| {
            CitycastError::CaptureConstraintError {
                reason: format!("platform produced no tracks for {}", constraints.video),
            }
        })
    }
}
