//! Room session management
//!
//! A join exchanges the operator's identity for a room token, connects with
//! the local tracks, and attaches the camera to the preview. The resulting
//! [`SessionHandle`] owns the connection and the tracks until `leave`.

use chrono::{DateTime, Utc};
use citycast_core::CitycastError;
use citycast_media::{CaptureHandle, LocalCaptureHandles};
use citycast_signaling::{
    OperatorSession, RoomConnection, RoomConnectionToken, RoomTransport, TokenRequest,
    TokenService,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Local preview surface for the published camera
pub trait PreviewSink: Send + Sync {
    /// Show `track`
    fn attach(&self, track: &dyn CaptureHandle);

    /// Stop showing whatever is attached
    fn detach(&self);
}

/// A failed join
///
/// The tracks handed to the join come back unreleased so the caller decides
/// what happens to them.
#[derive(Error)]
#[error("{error}")]
pub struct JoinError {
    /// What went wrong
    pub error: CitycastError,
    /// Tracks passed in to the join
    pub tracks: LocalCaptureHandles,
}

impl std::fmt::Debug for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinError")
            .field("error", &self.error)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

impl JoinError {
    /// Release the tracks and keep the error
    pub fn release(mut self) -> CitycastError {
        self.tracks.release();
        self.error
    }
}

/// A live room session
pub struct SessionHandle {
    id: Uuid,
    room_name: String,
    identity: String,
    connection: Option<Box<dyn RoomConnection>>,
    tracks: LocalCaptureHandles,
    preview: Option<Arc<dyn PreviewSink>>,
    connected_at: DateTime<Utc>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("room_name", &self.room_name)
            .field("identity", &self.identity)
            .field("connected", &self.is_connected())
            .field("tracks", &self.tracks.len())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

impl SessionHandle {
    /// Session id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Room name
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    /// Identity the session joined as
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Published tracks
    pub fn tracks(&self) -> &LocalCaptureHandles {
        &self.tracks
    }

    /// When the connection was established
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Check if the room connection is still held
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .map(|c| c.is_connected())
            .unwrap_or(false)
    }

    /// Check if the session has been torn down
    pub fn is_closed(&self) -> bool {
        self.connection.is_none() && self.tracks.is_released()
    }
}

/// Joins and leaves media rooms
pub struct RoomSessionManager {
    tokens: Arc<dyn TokenService>,
    transport: Arc<dyn RoomTransport>,
    preview: Option<Arc<dyn PreviewSink>>,
    publish: bool,
    subscribe: bool,
}

impl std::fmt::Debug for RoomSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSessionManager")
            .field("preview", &self.preview.is_some())
            .field("publish", &self.publish)
            .field("subscribe", &self.subscribe)
            .finish()
    }
}

impl RoomSessionManager {
    /// Create a manager that requests publish and subscribe rights
    pub fn new(tokens: Arc<dyn TokenService>, transport: Arc<dyn RoomTransport>) -> Self {
        Self {
            tokens,
            transport,
            preview: None,
            publish: true,
            subscribe: true,
        }
    }

    /// Attach the camera of every new session to `preview`
    pub fn with_preview(mut self, preview: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Set the rights requested from the token service
    pub fn with_rights(mut self, publish: bool, subscribe: bool) -> Self {
        self.publish = publish;
        self.subscribe = subscribe;
        self
    }

    /// Exchange `identity` for a token to `room_name`
    pub async fn fetch_token(
        &self,
        identity: &OperatorSession,
        room_name: &str,
    ) -> Result<RoomConnectionToken, CitycastError> {
        let request = TokenRequest {
            room_name: room_name.to_string(),
            identity: identity.username.clone(),
            publish: self.publish,
            subscribe: self.subscribe,
        };
        debug!(room = room_name, identity = %identity.username, "Requesting room token");
        self.tokens.issue_token(&request, &identity.token).await
    }

    /// Connect with `token` and publish `tracks`
    ///
    /// Ownership of `tracks` moves into the returned handle, or back to the
    /// caller inside the [`JoinError`].
    pub async fn connect(
        &self,
        identity: &OperatorSession,
        room_name: &str,
        token: &RoomConnectionToken,
        tracks: LocalCaptureHandles,
    ) -> Result<SessionHandle, JoinError> {
        let connection = match self.transport.connect(token, &tracks).await {
            Ok(connection) => connection,
            Err(error) => return Err(JoinError { error, tracks }),
        };

        let preview = self.preview.clone();
        if let (Some(sink), Some(video)) = (&preview, tracks.video()) {
            sink.attach(video);
        }

        let handle = SessionHandle {
            id: Uuid::new_v4(),
            room_name: room_name.to_string(),
            identity: identity.username.clone(),
            connection: Some(connection),
            tracks,
            preview,
            connected_at: Utc::now(),
        };
        info!(
            session = %handle.id,
            room = room_name,
            url = %token.url,
            tracks = handle.tracks.len(),
            "Connected to room"
        );
        Ok(handle)
    }

    /// Join `room_name` as `identity`, publishing `tracks`
    pub async fn join(
        &self,
        identity: &OperatorSession,
        room_name: &str,
        tracks: LocalCaptureHandles,
    ) -> Result<SessionHandle, JoinError> {
        let token = match self.fetch_token(identity, room_name).await {
            Ok(token) => token,
            Err(error) => return Err(JoinError { error, tracks }),
        };
        self.connect(identity, room_name, &token, tracks).await
    }

    /// Tear `session` down
    ///
    /// Disconnects first, then stops every track, then detaches the preview.
    /// Tracks are released and the preview detached even when the disconnect
    /// fails; that failure is returned afterwards. Calling it again is a no-op.
    pub async fn leave(&self, session: &mut SessionHandle) -> Result<(), CitycastError> {
        let Some(mut connection) = session.connection.take() else {
            debug!(session = %session.id, "Session already closed");
            return Ok(());
        };

        let disconnected = connection.disconnect().await;
        if let Err(e) = &disconnected {
            warn!(session = %session.id, "Room disconnect failed: {}", e);
        }

        session.tracks.release();
        if let Some(preview) = session.preview.take() {
            preview.detach();
        }

        info!(session = %session.id, room = %session.room_name, "Left room");
        disconnected
    }
}
