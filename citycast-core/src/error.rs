//! Error types for citycast

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for session controller operations
///
/// Every variant is recoverable from the operator's point of view except
/// [`CitycastError::InsecureContext`], which disables capture until the page
/// is served from a secure origin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CitycastError {
    /// The active origin is neither loopback nor transport-encrypted
    #[error("Capture requires a secure origin, got {origin}")]
    InsecureContext {
        /// Origin that failed the check
        origin: String,
    },

    /// The platform refused capture permission
    #[error("Capture permission denied: {reason}")]
    PermissionDenied {
        /// Reason reported by the platform
        reason: String,
    },

    /// The platform exposes no device enumeration
    #[error("Device enumeration unavailable: {reason}")]
    EnumerationUnavailable {
        /// Reason reported by the platform
        reason: String,
    },

    /// Resolved capture constraints were rejected
    #[error("Capture constraints rejected: {reason}")]
    CaptureConstraintError {
        /// Reason reported by the platform
        reason: String,
    },

    /// The capture device is held by another process context
    #[error("Capture device busy: {device}")]
    CaptureDeviceBusy {
        /// Device that could not be opened
        device: String,
    },

    /// The token service returned a non-success response
    #[error("Token exchange failed for room {room}: {reason}")]
    TokenExchangeFailed {
        /// Room the token was requested for
        room: String,
        /// HTTP status, when the service answered at all
        status: Option<u16>,
        /// Failure reason
        reason: String,
    },

    /// The room transport rejected or dropped the connection
    #[error("Room connection failed for {url}: {reason}")]
    RoomConnectFailed {
        /// Room URL that was dialled
        url: String,
        /// Failure reason
        reason: String,
    },

    /// An operation was requested in a state that does not accept it
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// States that would have accepted the operation
        expected: String,
        /// State the controller was in
        actual: String,
    },

    /// No signed-in operator, or the operator lacks the required role
    #[error("Not authenticated: {reason}")]
    Unauthenticated {
        /// Why the session was rejected
        reason: String,
    },

    /// A join attempt was abandoned by a concurrent leave
    #[error("Join attempt {attempt} cancelled")]
    JoinCancelled {
        /// Attempt counter of the abandoned join
        attempt: u64,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },
}

impl CitycastError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            CitycastError::InsecureContext { .. } => "INSECURE_CONTEXT".to_string(),
            CitycastError::PermissionDenied { .. } => "PERMISSION_DENIED".to_string(),
            CitycastError::EnumerationUnavailable { .. } => "ENUMERATION_UNAVAILABLE".to_string(),
            CitycastError::CaptureConstraintError { .. } => "CAPTURE_CONSTRAINT_ERROR".to_string(),
            CitycastError::CaptureDeviceBusy { .. } => "CAPTURE_DEVICE_BUSY".to_string(),
            CitycastError::TokenExchangeFailed { .. } => "TOKEN_EXCHANGE_FAILED".to_string(),
            CitycastError::RoomConnectFailed { .. } => "ROOM_CONNECT_FAILED".to_string(),
            CitycastError::InvalidState { .. } => "INVALID_STATE".to_string(),
            CitycastError::Unauthenticated { .. } => "UNAUTHENTICATED".to_string(),
            CitycastError::JoinCancelled { .. } => "JOIN_CANCELLED".to_string(),
            CitycastError::MissingConfiguration { .. } => "MISSING_CONFIGURATION".to_string(),
        }
    }

    /// Fieldless kind, used for the status line
    pub fn kind(&self) -> ErrorKind {
        match self {
            CitycastError::InsecureContext { .. } => ErrorKind::InsecureContext,
            CitycastError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            CitycastError::EnumerationUnavailable { .. } => ErrorKind::EnumerationUnavailable,
            CitycastError::CaptureConstraintError { .. } => ErrorKind::CaptureConstraintError,
            CitycastError::CaptureDeviceBusy { .. } => ErrorKind::CaptureDeviceBusy,
            CitycastError::TokenExchangeFailed { .. } => ErrorKind::TokenExchangeFailed,
            CitycastError::RoomConnectFailed { .. } => ErrorKind::RoomConnectFailed,
            CitycastError::InvalidState { .. } => ErrorKind::InvalidState,
            CitycastError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            CitycastError::JoinCancelled { .. } => ErrorKind::JoinCancelled,
            CitycastError::MissingConfiguration { .. } => ErrorKind::MissingConfiguration,
        }
    }

    /// Check if the operator can recover without reloading
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CitycastError::InsecureContext { .. })
    }

    /// Check if this error belongs to the join pipeline
    ///
    /// Join-stage errors route the controller through `JoinFailed`.
    pub fn is_join_stage(&self) -> bool {
        matches!(
            self,
            CitycastError::CaptureConstraintError { .. }
                | CitycastError::CaptureDeviceBusy { .. }
                | CitycastError::TokenExchangeFailed { .. }
                | CitycastError::RoomConnectFailed { .. }
                | CitycastError::Unauthenticated { .. }
        )
    }
}

/// Error kinds without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`CitycastError::InsecureContext`]
    InsecureContext,
    /// See [`CitycastError::PermissionDenied`]
    PermissionDenied,
    /// See [`CitycastError::EnumerationUnavailable`]
    EnumerationUnavailable,
    /// See [`CitycastError::CaptureConstraintError`]
    CaptureConstraintError,
    /// See [`CitycastError::CaptureDeviceBusy`]
    CaptureDeviceBusy,
    /// See [`CitycastError::TokenExchangeFailed`]
    TokenExchangeFailed,
    /// See [`CitycastError::RoomConnectFailed`]
    RoomConnectFailed,
    /// See [`CitycastError::InvalidState`]
    InvalidState,
    /// See [`CitycastError::Unauthenticated`]
    Unauthenticated,
    /// See [`CitycastError::JoinCancelled`]
    JoinCancelled,
    /// See [`CitycastError::MissingConfiguration`]
    MissingConfiguration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InsecureContext => "InsecureContext",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::EnumerationUnavailable => "EnumerationUnavailable",
            ErrorKind::CaptureConstraintError => "CaptureConstraintError",
            ErrorKind::CaptureDeviceBusy => "CaptureDeviceBusy",
            ErrorKind::TokenExchangeFailed => "TokenExchangeFailed",
            ErrorKind::RoomConnectFailed => "RoomConnectFailed",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::JoinCancelled => "JoinCancelled",
            ErrorKind::MissingConfiguration => "MissingConfiguration",
        };
        f.write_str(name)
    }
}
