//! Media room transport

use crate::protocol::{RoomConnectionToken, RoomSignal, TrackPublication};
use async_trait::async_trait;
use citycast_core::CitycastError;
use citycast_media::LocalCaptureHandles;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use tungstenite::Message;
use url::Url;

/// An open room connection
#[async_trait]
pub trait RoomConnection: Send {
    /// Room URL this connection was opened against
    fn url(&self) -> &str;

    /// Check if the connection is still open
    fn is_connected(&self) -> bool;

    /// Close the connection; a second call is a no-op
    async fn disconnect(&mut self) -> Result<(), CitycastError>;
}

/// Opens room connections
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Connect with `token` and publish `tracks`
    ///
    /// The transport only reads `tracks`; ownership stays with the caller.
    async fn connect(
        &self,
        token: &RoomConnectionToken,
        tracks: &LocalCaptureHandles,
    ) -> Result<Box<dyn RoomConnection>, CitycastError>;
}

/// Room transport over a WebSocket signalling channel
#[derive(Debug, Clone, Default)]
pub struct WsRoomTransport;

impl WsRoomTransport {
    /// Create a transport
    pub fn new() -> Self {
        Self
    }

    /// Room URL with the `access_token` query parameter
    pub fn access_url(url: &str, token: &str) -> Result<Url, CitycastError> {
        let mut parsed = Url::parse(url).map_err(|e| CitycastError::RoomConnectFailed {
            url: url.to_string(),
            reason: format!("invalid room url: {}", e),
        })?;

        let has_token = parsed.query_pairs().any(|(key, _)| key == "access_token");
        if !has_token {
            parsed.query_pairs_mut().append_pair("access_token", token);
        }
        Ok(parsed)
    }
}

#[async_trait]
impl RoomTransport for WsRoomTransport {
    async fn connect(
        &self,
        token: &RoomConnectionToken,
        tracks: &LocalCaptureHandles,
    ) -> Result<Box<dyn RoomConnection>, CitycastError> {
        let failed = |reason: String| CitycastError::RoomConnectFailed {
            url: token.url.clone(),
            reason,
        };

        let endpoint = Self::access_url(&token.url, &token.token)?;
        info!(url = %token.url, "Connecting to room");
        let (mut stream, _response) = connect_async(endpoint.as_str())
            .await
            .map_err(|e| failed(e.to_string()))?;

        let publish = RoomSignal::Publish {
            tracks: tracks
                .track_infos()
                .iter()
                .map(TrackPublication::from)
                .collect(),
        };
        let frame = serde_json::to_string(&publish).map_err(|e| failed(e.to_string()))?;

        if let Err(e) = stream.send(Message::Text(frame)).await {
            let _ = stream.close(None).await;
            return Err(failed(format!("publish rejected: {}", e)));
        }
        debug!("Published {} local tracks", tracks.len());

        Ok(Box::new(WsRoomConnection {
            url: token.url.clone(),
            stream: Some(stream),
        }))
    }
}

struct WsRoomConnection {
    url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[async_trait]
impl RoomConnection for WsRoomConnection {
    fn url(&self) -> &str {
        &self.url
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn disconnect(&mut self) -> Result<(), CitycastError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        info!(url = %self.url, "Disconnecting from room");
        let leave = serde_json::to_string(&RoomSignal::Leave).unwrap_or_default();
        if let Err(e) = stream.send(Message::Text(leave)).await {
            warn!("Leave signal not delivered: {}", e);
        }

        stream
            .close(None)
            .await
            .map_err(|e| CitycastError::RoomConnectFailed {
                url: self.url.clone(),
                reason: format!("close failed: {}", e),
            })
    }
}
