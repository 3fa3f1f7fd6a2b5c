//! # citycast diagnostics
//!
//! Logging setup and a bounded record of session state transitions.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod session_trace;

// Re-export main types
pub use debug_logger::DebugLogger;
pub use session_trace::{SessionTrace, TransitionRecord};
