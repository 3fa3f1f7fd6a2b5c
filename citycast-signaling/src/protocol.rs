//! Wire types for the token service and the room transport

use citycast_media::{DeviceKind, TrackInfo};
use serde::{Deserialize, Serialize};

/// Body of a token request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// Room to join
    pub room_name: String,
    /// Participant identity
    pub identity: String,
    /// Request publish rights
    pub publish: bool,
    /// Request subscribe rights
    pub subscribe: bool,
}

/// Credential for one room connection
///
/// Issued per join attempt and never cached across sessions.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConnectionToken {
    /// Room transport URL
    pub url: String,
    /// Access token
    pub token: String,
}

impl std::fmt::Debug for RoomConnectionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomConnectionToken")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Local track as announced to the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPublication {
    /// Track identifier
    pub track_id: String,
    /// `audio` or `video`
    pub kind: String,
    /// Device label
    pub name: String,
}

impl From<&TrackInfo> for TrackPublication {
    fn from(info: &TrackInfo) -> Self {
        let kind = match info.kind {
            DeviceKind::Camera => "video",
            DeviceKind::Microphone => "audio",
        };
        Self {
            track_id: info.track_id.clone(),
            kind: kind.to_string(),
            name: info.label.clone(),
        }
    }
}

/// Frames the client sends over the room transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomSignal {
    /// Announce local tracks
    Publish {
        /// Tracks to publish
        tracks: Vec<TrackPublication>,
    },
    /// Leave the room
    Leave,
}
