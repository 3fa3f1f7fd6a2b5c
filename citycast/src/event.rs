//! Session events broadcast to the UI

use crate::state::SessionState;
use citycast_core::ErrorKind;
use tokio::sync::broadcast;

/// Something the operator's UI should reflect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The controller moved between states
    StateChanged {
        /// State left
        from: SessionState,
        /// State entered
        to: SessionState,
    },
    /// Human-readable progress message
    Status {
        /// Message text
        message: String,
    },
    /// An operation failed
    Error {
        /// Error kind
        kind: ErrorKind,
        /// Error message
        message: String,
    },
}

impl SessionEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "state_changed",
            SessionEvent::Status { .. } => "status",
            SessionEvent::Error { .. } => "error",
        }
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(self, SessionEvent::Error { .. })
    }
}

/// Receiver side of the session event channel
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event; `None` once the controller is gone
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Get the next event without waiting
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Drain every queued event
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
