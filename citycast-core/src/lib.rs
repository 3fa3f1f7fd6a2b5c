//! # citycast core
//!
//! Shared building blocks for the citycast session controller: the error
//! taxonomy every component reports through, and the secure-origin check that
//! gates access to capture devices.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod origin;

// Re-export main types
pub use error::{CitycastError, ErrorKind};
pub use origin::SecureOrigin;

/// Result alias used across the citycast crates
pub type Result<T, E = CitycastError> = std::result::Result<T, E>;
