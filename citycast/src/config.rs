//! Configuration types and defaults

use citycast_core::CitycastError;
use citycast_diagnostics::DebugLogger;
use serde::Deserialize;
use url::Url;

/// Session controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Origin the page is served from
    pub origin: String,
    /// Room to join
    pub room_name: String,
    /// Token service URL
    pub token_endpoint: String,
    /// Request publish rights
    pub publish: bool,
    /// Request subscribe rights
    pub subscribe: bool,
    /// Run the gesture-less permission probe on boot
    pub auto_probe: bool,
    /// Role the signed-in operator must hold
    pub required_role: Option<String>,
    /// Default tracing filter
    pub log_filter: String,
    /// Transitions kept in the session trace
    pub trace_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            room_name: String::new(),
            token_endpoint: "http://localhost/api/token".to_string(),
            publish: true,
            subscribe: true,
            auto_probe: true,
            required_role: Some("city".to_string()),
            log_filter: "info".to_string(),
            trace_capacity: 64,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON configuration document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, CitycastError> {
        serde_json::from_str(json).map_err(|e| CitycastError::MissingConfiguration {
            field: format!("config ({})", e),
        })
    }

    /// Derive origin, room, and token endpoint from the page URL
    ///
    /// The room comes from the `room` query parameter; the token endpoint is
    /// `/api/token` on the same origin.
    pub fn from_page_url(page_url: &str) -> Result<Self, CitycastError> {
        let url = Url::parse(page_url).map_err(|_| CitycastError::MissingConfiguration {
            field: "page_url".to_string(),
        })?;

        let origin = url.origin().ascii_serialization();
        let room_name = url
            .query_pairs()
            .find(|(key, _)| key == "room")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        Ok(Self {
            token_endpoint: format!("{}/api/token", origin),
            origin,
            room_name,
            ..Self::default()
        })
    }

    /// Set the room name
    pub fn with_room(mut self, room_name: &str) -> Self {
        self.room_name = room_name.to_string();
        self
    }

    /// Install the global tracing subscriber with `log_filter` as the default
    /// filter; `RUST_LOG` still wins. Returns `false` if one was already set.
    pub fn init_logging(&self) -> bool {
        DebugLogger::init_logging(&self.log_filter)
    }

    /// Check the fields a join depends on
    pub fn validate(&self) -> Result<(), CitycastError> {
        if self.room_name.trim().is_empty() {
            return Err(CitycastError::MissingConfiguration {
                field: "room_name".to_string(),
            });
        }
        if Url::parse(&self.token_endpoint).is_err() {
            return Err(CitycastError::MissingConfiguration {
                field: "token_endpoint".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert!(config.publish && config.subscribe && config.auto_probe);
        assert_eq!(config.required_role.as_deref(), Some("city"));
        assert!(matches!(
            config.validate(),
            Err(CitycastError::MissingConfiguration { .. })
        ));
    }

    #[test]
    fn test_from_page_url() {
        let config =
            ControllerConfig::from_page_url("https://cast.example.org/city.html?room=old-town")
                .unwrap();
        assert_eq!(config.origin, "https://cast.example.org");
        assert_eq!(config.room_name, "old-town");
        assert_eq!(config.token_endpoint, "https://cast.example.org/api/token");
        assert!(config.validate().is_ok());

        let no_room = ControllerConfig::from_page_url("http://localhost:3000/city.html").unwrap();
        assert_eq!(no_room.room_name, "");
        assert_eq!(no_room.origin, "http://localhost:3000");
    }

    #[test]
    fn test_from_json() {
        let config = ControllerConfig::from_json_str(
            r#"{"room_name":"r1","auto_probe":false,"required_role":null}"#,
        )
        .unwrap();
        assert_eq!(config.room_name, "r1");
        assert!(!config.auto_probe);
        assert!(config.required_role.is_none());
        assert_eq!(config.log_filter, "info");

        assert!(ControllerConfig::from_json_str("[").is_err());
    }
}
