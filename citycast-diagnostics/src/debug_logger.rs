//! Structured logging setup

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs the process-wide tracing subscriber
#[derive(Debug, Default)]
pub struct DebugLogger;

impl DebugLogger {
    /// Create new debug logger
    pub fn new() -> Self {
        Self
    }

    /// Initialize logging
    ///
    /// `RUST_LOG` wins when set; otherwise `default_filter` is used. Returns
    /// whether this call installed the subscriber. Later calls, or a
    /// subscriber installed elsewhere, leave logging untouched.
    pub fn init_logging(default_filter: &str) -> bool {
        *INSTALLED.get_or_init(|| {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_filter))
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .try_init()
                .is_ok()
        })
    }

    /// Check if [`init_logging`](Self::init_logging) has run
    pub fn is_initialized() -> bool {
        INSTALLED.get().is_some()
    }
}
