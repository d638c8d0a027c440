//! # Stateful target that keeps only the newest version.
//!
//! [`VersionTracker`] applies an update only when its version is newer
//! than the last applied one. When dispatch passes overlap (concurrent
//! mode, pipelined publishes), deliveries can arrive out of version
//! order; the tracker rejects the stale ones and counts both outcomes.
//!
//! ## Rules
//! - Updates with `version <= last_version` are **rejected** (stale)
//! - Rejection is not an error: the delivery still reports as delivered
//! - `applied`/`stale` counters are monotonic over the tracker's lifetime
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! # use notibus::{Subject, VersionTracker};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let subject = Subject::<String>::builder("config").build();
//! let tracker = Arc::new(VersionTracker::new());
//! subject.subscribe(0, &tracker)?;
//!
//! subject.publish("a".to_string()).await?;
//! subject.publish("b".to_string()).await?;
//! assert_eq!(tracker.last_version(), 2);
//! assert_eq!(tracker.latest().as_deref(), Some(&"b".to_string()));
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::ReceiveError;
use crate::subject::Update;

use super::Receive;

#[derive(Debug)]
struct TrackerState<T> {
    last_version: u64,
    latest: Option<Arc<T>>,
    applied: u64,
    stale: u64,
}

/// Thread-safe newest-version cell.
///
/// ### Responsibilities
/// - Holds the payload of the newest version seen so far
/// - Rejects stale deliveries using the update version
/// - Counts applied vs. stale deliveries for diagnostics
pub struct VersionTracker<T> {
    state: Mutex<TrackerState<T>>,
}

impl<T> VersionTracker<T> {
    /// Creates an empty tracker (no version seen yet).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                last_version: 0,
                latest: None,
                applied: 0,
                stale: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Version of the newest applied update, or 0 if none yet.
    pub fn last_version(&self) -> u64 {
        self.lock().last_version
    }

    /// Payload of the newest applied update.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.lock().latest.clone()
    }

    /// Number of deliveries that advanced the tracked version.
    pub fn applied(&self) -> u64 {
        self.lock().applied
    }

    /// Number of deliveries rejected as stale.
    pub fn stale(&self) -> u64 {
        self.lock().stale
    }
}

impl<T> Default for VersionTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Receive<T> for VersionTracker<T> {
    async fn receive(&self, update: &Update<T>) -> Result<(), ReceiveError> {
        let mut state = self.lock();
        if update.version() <= state.last_version {
            state.stale += 1;
            return Ok(());
        }
        state.last_version = update.version();
        state.latest = Some(update.payload_arc());
        state.applied += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "version-tracker"
    }
}
