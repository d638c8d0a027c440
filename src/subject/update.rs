//! # State-change notification delivered to targets.
//!
//! [`Update`] is the unit of delivery: the subject name, the version
//! assigned at publish time, and a shared handle to the payload. One
//! `Update` is built per publish and shared across every target of the
//! pass; cloning is cheap (two `Arc` bumps).
//!
//! ## Staleness
//! Versions are strictly increasing per subject. When dispatch passes
//! overlap (concurrent mode), a target may observe version `n + 1` before
//! version `n`; compare [`Update::version`] against the last applied one
//! and discard stale updates. [`VersionTracker`](crate::VersionTracker)
//! implements that pattern.

use std::sync::Arc;
use std::time::SystemTime;

/// A versioned state-change notification.
pub struct Update<T> {
    subject: Arc<str>,
    version: u64,
    payload: Arc<T>,
    at: SystemTime,
}

impl<T> Update<T> {
    /// Builds the update for one publish. Called by the subject only;
    /// targets never construct updates.
    pub(crate) fn new(subject: Arc<str>, version: u64, payload: Arc<T>) -> Self {
        Self {
            subject,
            version,
            payload,
            at: SystemTime::now(),
        }
    }

    /// Name of the subject that published this update.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Version assigned at publish time. Strictly increasing per subject.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Borrows the payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Returns a shared handle to the payload, for targets that keep it.
    pub fn payload_arc(&self) -> Arc<T> {
        Arc::clone(&self.payload)
    }

    /// Wall-clock timestamp taken at publish time (for logs/metrics).
    pub fn at(&self) -> SystemTime {
        self.at
    }
}

// Manual impl: `T` does not need to be `Clone`, the payload is shared.
impl<T> Clone for Update<T> {
    fn clone(&self) -> Self {
        Self {
            subject: Arc::clone(&self.subject),
            version: self.version,
            payload: Arc::clone(&self.payload),
            at: self.at,
        }
    }
}

impl<T> std::fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Update")
            .field("subject", &self.subject)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let u = Update::new(Arc::from("s"), 7, Arc::new("x".to_string()));
        let c = u.clone();
        assert_eq!(c.version(), 7);
        assert_eq!(c.subject(), "s");
        assert!(Arc::ptr_eq(&u.payload_arc(), &c.payload_arc()));
    }
}
