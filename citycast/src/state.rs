//! Session lifecycle states and the control snapshot derived from them

use std::fmt;

/// Lifecycle state of the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing acquired; the permission probe starts from here
    Idle,
    /// A permission prompt is in flight
    PermissionPending,
    /// Permission granted, catalog not built yet
    PermissionGranted,
    /// Permission refused; the grant control retries under a user gesture
    PermissionDenied,
    /// Catalog built, ready to join
    DevicesReady,
    /// Join in progress
    Joining,
    /// Publishing into the room
    Connected,
    /// Tearing the session down
    Leaving,
    /// The last join attempt failed; accepts a new join
    JoinFailed,
}

impl SessionState {
    /// Check if a join request is accepted in this state
    pub fn accepts_join(&self) -> bool {
        matches!(self, SessionState::DevicesReady | SessionState::JoinFailed)
    }

    /// Check if a leave request has anything to do in this state
    pub fn accepts_leave(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Joining)
    }

    /// Check if a gesture-driven permission request is accepted
    pub fn accepts_grant(&self) -> bool {
        matches!(
            self,
            SessionState::Idle | SessionState::PermissionDenied | SessionState::PermissionGranted
        )
    }

    /// Check if the device catalog may be rebuilt
    pub fn accepts_refresh(&self) -> bool {
        matches!(
            self,
            SessionState::PermissionGranted | SessionState::DevicesReady | SessionState::JoinFailed
        )
    }

    /// State name as shown on the status line
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::PermissionPending => "PermissionPending",
            SessionState::PermissionGranted => "PermissionGranted",
            SessionState::PermissionDenied => "PermissionDenied",
            SessionState::DevicesReady => "DevicesReady",
            SessionState::Joining => "Joining",
            SessionState::Connected => "Connected",
            SessionState::Leaving => "Leaving",
            SessionState::JoinFailed => "JoinFailed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which controls the operator may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    /// Permission grant control
    pub grant: bool,
    /// Join control
    pub join: bool,
    /// Leave control
    pub leave: bool,
    /// Camera and microphone selectors
    pub selectors: bool,
}

impl Controls {
    /// Controls for `state`; everything capture-related is off once the
    /// origin has failed the secure-context check
    pub fn for_state(state: SessionState, capture_disabled: bool) -> Self {
        if capture_disabled {
            return Self::default();
        }
        Self {
            grant: state.accepts_grant(),
            join: state.accepts_join(),
            leave: state.accepts_leave(),
            selectors: state.accepts_join(),
        }
    }
}
