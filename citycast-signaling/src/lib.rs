//! # citycast signaling
//!
//! The remote side of a join: exchanging the signed-in operator's identity
//! for a room-connection token, and opening the media room transport with
//! that token.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod identity;
pub mod protocol;
pub mod token;
pub mod transport;

// Re-export main types
pub use identity::{IdentityStore, JsonFileIdentityStore, OperatorSession, StaticIdentityStore};
pub use protocol::{RoomConnectionToken, RoomSignal, TokenRequest, TrackPublication};
pub use token::{HttpTokenService, TokenService};
pub use transport::{RoomConnection, RoomTransport, WsRoomTransport};
