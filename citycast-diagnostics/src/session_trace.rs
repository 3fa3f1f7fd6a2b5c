//! Bounded history of session state transitions

use chrono::{DateTime, Utc};
use citycast_core::ErrorKind;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    /// State left
    pub from: String,
    /// State entered
    pub to: String,
    /// Error that caused the transition, if any
    pub error: Option<ErrorKind>,
    /// When the transition happened
    pub at: DateTime<Utc>,
}

/// Keeps the most recent transitions, oldest first
#[derive(Debug)]
pub struct SessionTrace {
    capacity: usize,
    records: Mutex<VecDeque<TransitionRecord>>,
}

impl SessionTrace {
    /// Trace keeping at most `capacity` records (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record a transition
    pub fn record(&self, from: impl ToString, to: impl ToString, error: Option<ErrorKind>) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(TransitionRecord {
            from: from.to_string(),
            to: to.to_string(),
            error,
            at: Utc::now(),
        });
    }

    /// Snapshot of recorded transitions
    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Names of the states entered, in order
    pub fn path(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.to.clone()).collect()
    }

    /// Most recent transition
    pub fn last(&self) -> Option<TransitionRecord> {
        self.records.lock().back().cloned()
    }

    /// Drop all records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for SessionTrace {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_is_bounded() {
        let trace = SessionTrace::new(2);
        trace.record("Idle", "PermissionPending", None);
        trace.record("PermissionPending", "PermissionDenied", Some(ErrorKind::PermissionDenied));
        trace.record("PermissionDenied", "PermissionPending", None);

        assert_eq!(trace.path(), vec!["PermissionDenied", "PermissionPending"]);
        assert_eq!(trace.records()[0].error, Some(ErrorKind::PermissionDenied));
        assert_eq!(trace.last().map(|r| r.from), Some("PermissionDenied".to_string()));

        trace.clear();
        assert!(trace.records().is_empty());
    }
}
