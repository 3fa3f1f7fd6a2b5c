//! # citycast
//!
//! Session lifecycle controller for a city operator publishing a local camera
//! and microphone into a media room.
//!
//! The controller owns the whole session: it negotiates capture permission
//! (once, shared between concurrent callers), builds the device catalog with
//! fallbacks for cameras that are hidden before a grant, resolves the
//! operator's selection into capture constraints, exchanges the signed-in
//! identity for a room token, and tears everything down again on leave.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use citycast::{
//!     ControllerConfig, HttpTokenService, JsonFileIdentityStore, SessionController,
//!     SimulatedPlatform, WsRoomTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::from_page_url("https://cast.example.org/city.html?room=old-town")?;
//!
//!     let controller = SessionController::builder(config.clone())
//!         .platform(Arc::new(SimulatedPlatform::new()))
//!         .token_service(Arc::new(HttpTokenService::new(&config.token_endpoint)?))
//!         .transport(Arc::new(WsRoomTransport::new()))
//!         .identity(Arc::new(JsonFileIdentityStore::new("session.json")))
//!         .build()?;
//!
//!     let mut events = controller.subscribe();
//!     controller.boot().await.ok();
//!     controller.select_from_values("environment", "");
//!     controller.join().await?;
//!
//!     while let Some(event) = events.try_next() {
//!         println!("{:?}", event);
//!     }
//!
//!     controller.leave().await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export the building blocks
pub use citycast_core::{CitycastError, ErrorKind, Result, SecureOrigin};

pub use citycast_media::{
    CameraChoice, CaptureHandle, CapturePlatform, CaptureSelection, DeviceCatalog,
    DeviceDescriptor, DeviceKind, FacingMode, LocalCaptureHandles, MediaError, MicrophoneChoice,
    PermissionManager, PermissionState, SimulatedPlatform, TrackInfo,
};

pub use citycast_signaling::{
    HttpTokenService, IdentityStore, JsonFileIdentityStore, OperatorSession, RoomConnection,
    RoomConnectionToken, RoomTransport, StaticIdentityStore, TokenRequest, TokenService,
    WsRoomTransport,
};

pub use citycast_diagnostics::{DebugLogger, SessionTrace, TransitionRecord};

// Public API modules
pub mod config;
pub mod controller;
pub mod controls;
pub mod event;
pub mod room;
pub mod state;

// Re-export main API types
pub use config::ControllerConfig;
pub use controller::{SessionController, SessionControllerBuilder};
pub use controls::{Control, ControlPanel};
pub use event::{EventStream, SessionEvent};
pub use room::{JoinError, PreviewSink, RoomSessionManager, SessionHandle};
pub use state::{Controls, SessionState};
