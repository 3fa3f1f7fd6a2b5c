//! Signed-in operator session
//!
//! The login flow owns the session; this crate only reads it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Operator session persisted by the login flow
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSession {
    /// Operator name, used as the room identity
    pub username: String,
    /// Bearer credential for the token service
    pub token: String,
    /// Operator role, e.g. `city`
    #[serde(default)]
    pub role: String,
}

impl std::fmt::Debug for OperatorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSession")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Source of the signed-in operator's session
pub trait IdentityStore: Send + Sync {
    /// Current session, if an operator is signed in
    fn session(&self) -> Option<OperatorSession>;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct StaticIdentityStore {
    session: RwLock<Option<OperatorSession>>,
}

impl StaticIdentityStore {
    /// Store holding `session`
    pub fn new(session: OperatorSession) -> Self {
        let store = Self::default();
        store.set(session);
        store
    }

    /// Replace the session
    pub fn set(&self, session: OperatorSession) {
        *self.session.write() = Some(session);
    }

    /// Sign the operator out
    pub fn clear(&self) {
        *self.session.write() = None;
    }
}

impl IdentityStore for StaticIdentityStore {
    fn session(&self) -> Option<OperatorSession> {
        self.session.read().clone()
    }
}

/// Session document written to disk by the login flow
///
/// Read on every call; a missing, unreadable, or malformed file reads as
/// "no session".
#[derive(Debug, Clone)]
pub struct JsonFileIdentityStore {
    path: PathBuf,
}

impl JsonFileIdentityStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentityStore for JsonFileIdentityStore {
    fn session(&self) -> Option<OperatorSession> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No operator session at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring malformed session file {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
