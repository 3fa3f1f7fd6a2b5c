//! Secure-origin checks
//!
//! Capture devices are only offered to pages served from a secure context:
//! either a transport-encrypted scheme or a loopback host.

use crate::error::CitycastError;
use std::net::IpAddr;
use url::Url;

/// A page origin that has passed the secure-context check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureOrigin {
    url: Url,
}

impl SecureOrigin {
    /// Parse `origin` and verify it is a secure context
    pub fn parse(origin: &str) -> Result<Self, CitycastError> {
        let url = Url::parse(origin).map_err(|_| CitycastError::InsecureContext {
            origin: origin.to_string(),
        })?;

        if is_secure(&url) {
            Ok(Self { url })
        } else {
            Err(CitycastError::InsecureContext {
                origin: origin.to_string(),
            })
        }
    }

    /// Check an origin without keeping it
    pub fn check(origin: &str) -> Result<(), CitycastError> {
        Self::parse(origin).map(|_| ())
    }

    /// Get the verified origin URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Check if the origin is transport-encrypted rather than loopback
    pub fn is_encrypted(&self) -> bool {
        matches!(self.url.scheme(), "https" | "wss")
    }
}

fn is_secure(url: &Url) -> bool {
    if matches!(url.scheme(), "https" | "wss") {
        return true;
    }

    match url.host() {
        Some(url::Host::Domain(domain)) => {
            domain.eq_ignore_ascii_case("localhost") || domain.ends_with(".localhost")
        }
        Some(url::Host::Ipv4(addr)) => IpAddr::V4(addr).is_loopback(),
        Some(url::Host::Ipv6(addr)) => IpAddr::V6(addr).is_loopback(),
        None => false,
    }
}
