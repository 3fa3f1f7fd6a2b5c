//! Platform capture error types
//!
//! These mirror the failure kinds capture platforms report. Components in this
//! crate translate them into the session-level [`CitycastError`] taxonomy.

use citycast_core::CitycastError;
use thiserror::Error;

/// Error reported by a [`CapturePlatform`](crate::capture::CapturePlatform)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The platform or the user refused access
    #[error("Not allowed: {reason}")]
    NotAllowed {
        /// Reason reported by the platform
        reason: String,
    },

    /// No device satisfies the requested constraint
    #[error("No device found for {constraint}")]
    NotFound {
        /// Constraint that matched nothing
        constraint: String,
    },

    /// A hard constraint could not be met
    #[error("Overconstrained: {constraint}")]
    Overconstrained {
        /// Constraint that could not be met
        constraint: String,
    },

    /// The device exists but could not be read, usually because another
    /// process holds it
    #[error("Device not readable: {device_id}")]
    NotReadable {
        /// Device identifier
        device_id: String,
    },

    /// The platform does not offer the requested capability
    #[error("Unsupported capability: {capability}")]
    Unsupported {
        /// Capability name
        capability: String,
    },

    /// The request was interrupted before completing
    #[error("Aborted: {reason}")]
    Aborted {
        /// Reason for the abort
        reason: String,
    },
}

/// Result type alias for platform capture operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if retrying the same request might succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::NotReadable { .. } => true,
            MediaError::Aborted { .. } => true,
            MediaError::NotAllowed { .. } => true,
            MediaError::NotFound { .. } => false,
            MediaError::Overconstrained { .. } => false,
            MediaError::Unsupported { .. } => false,
        }
    }
}

impl From<MediaError> for CitycastError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::NotAllowed { reason } => CitycastError::PermissionDenied { reason },
            MediaError::NotFound { constraint } => CitycastError::CaptureConstraintError {
                reason: format!("no device found for {}", constraint),
            },
            MediaError::Overconstrained { constraint } => CitycastError::CaptureConstraintError {
                reason: format!("cannot satisfy {}", constraint),
            },
            MediaError::NotReadable { device_id } => {
                CitycastError::CaptureDeviceBusy { device: device_id }
            }
            MediaError::Unsupported { capability } => CitycastError::EnumerationUnavailable {
                reason: format!("platform lacks {}", capability),
            },
            MediaError::Aborted { reason } => CitycastError::CaptureConstraintError { reason },
        }
    }
}
