//! Room token exchange

use crate::protocol::{RoomConnectionToken, TokenRequest};
use async_trait::async_trait;
use citycast_core::CitycastError;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Issues room-connection credentials
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Exchange `request` for a token, authenticating with `credential`
    async fn issue_token(
        &self,
        request: &TokenRequest,
        credential: &str,
    ) -> Result<RoomConnectionToken, CitycastError>;
}

/// Token service reached over HTTP
///
/// Sends `POST <endpoint>` with a JSON [`TokenRequest`] body and a bearer
/// credential; expects a JSON [`RoomConnectionToken`] back.
#[derive(Debug, Clone)]
pub struct HttpTokenService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTokenService {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for `endpoint`
    pub fn new(endpoint: &str) -> Result<Self, CitycastError> {
        Self::with_timeout(endpoint, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client for `endpoint` with a custom request timeout
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, CitycastError> {
        url::Url::parse(endpoint).map_err(|_| CitycastError::MissingConfiguration {
            field: "token_endpoint".to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CitycastError::MissingConfiguration {
                field: format!("token_endpoint (http client: {})", e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenService for HttpTokenService {
    async fn issue_token(
        &self,
        request: &TokenRequest,
        credential: &str,
    ) -> Result<RoomConnectionToken, CitycastError> {
        let failed = |status: Option<u16>, reason: String| CitycastError::TokenExchangeFailed {
            room: request.room_name.clone(),
            status,
            reason,
        };

        info!(room = %request.room_name, identity = %request.identity, "Fetching room token");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| failed(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token service refused request");
            return Err(failed(
                Some(status.as_u16()),
                format!("unexpected status {} {}", status, body.trim()),
            ));
        }

        let token: RoomConnectionToken = response
            .json()
            .await
            .map_err(|e| failed(Some(status.as_u16()), format!("malformed token response: {}", e)))?;

        if token.url.is_empty() || token.token.is_empty() {
            return Err(failed(
                Some(status.as_u16()),
                "token response missing url or token".to_string(),
            ));
        }

        debug!(url = %token.url, "Room token issued");
        Ok(token)
    }
}
