//! # Subscription registry: the ordered set of live subscribers.
//!
//! [`Registry`] owns the mapping from one subject to its subscriber
//! entries and hands out [`Snapshot`]s for dispatch passes.
//!
//! ## Architecture
//! ```text
//! subscribe(priority, target) ──► BTreeMap<(priority, id), Entry>
//! unsubscribe(&handle)        ──►        (short-held Mutex)
//!                                              │
//! snapshot() ── upgrade Weak + probe is_alive ─┤
//!     │                                        │
//!     ├─► live entries  → ordered Snapshot (copy, lock released)
//!     └─► dead entries  → removed from the map (mark and sweep on use)
//! ```
//!
//! ## Rules
//! - Iteration order is **priority ascending, then subscription order**,
//!   stable under concurrent add/remove.
//! - The lock is held only for map mutation and snapshot copying, never
//!   across a dispatch pass or any `.await`. Target callbacks may call
//!   `subscribe`/`unsubscribe` on the same registry without deadlocking.
//! - A dispatch pass sees exactly the snapshot it was given: targets
//!   subscribed mid-pass are not notified by that pass; targets
//!   unsubscribed mid-pass may still receive it (at-most-once-late-removal,
//!   documented, not a bug).
//! - Entries whose target was dropped (or reports `is_alive() == false`)
//!   are reaped lazily at the next snapshot, not eagerly tracked.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::SubjectError;
use crate::targets::Receive;

use super::{Handle, SubscriptionId};

/// Ordering key: priority first, then subscription order.
type OrderKey = (i32, u64);

struct Entry<T> {
    name: Arc<str>,
    target: Weak<dyn Receive<T>>,
}

/// Ordered collection of subscriber entries for one subject.
///
/// Holds targets as **weak** references: the subscriber's owner is
/// external code, not the registry. The registry only probes liveness and
/// resolves entries to live delivery capabilities at snapshot time.
pub struct Registry<T> {
    subject: Arc<str>,
    entries: Mutex<BTreeMap<OrderKey, Entry<T>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl<T: Send + Sync + 'static> Registry<T> {
    /// Creates an empty registry for the named subject.
    pub fn new(subject: impl Into<Arc<str>>) -> Self {
        Self {
            subject: subject.into(),
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<OrderKey, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a new subscription for `target` at the given priority.
    ///
    /// Lower priority values are delivered earlier; ties are broken by
    /// subscription order (FIFO). The registry keeps only a weak
    /// reference - the caller's `Arc` decides the target's lifetime.
    ///
    /// Fails with [`SubjectError::RegistryClosed`] once the owning
    /// subject was closed.
    pub fn subscribe<R>(&self, priority: i32, target: &Arc<R>) -> Result<Handle, SubjectError>
    where
        R: Receive<T>,
    {
        let target: Arc<dyn Receive<T>> = target.clone();
        self.subscribe_dyn(priority, &target)
    }

    /// Type-erased variant of [`Registry::subscribe`] for callers that
    /// already hold an `Arc<dyn Receive<T>>`.
    pub fn subscribe_dyn(
        &self,
        priority: i32,
        target: &Arc<dyn Receive<T>>,
    ) -> Result<Handle, SubjectError> {
        let entry = Entry {
            name: Arc::from(target.name()),
            target: Arc::downgrade(target),
        };

        // Closed check and insert under the same lock: a racing `close`
        // either sees this entry and clears it, or rejects us here.
        let mut entries = self.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(SubjectError::RegistryClosed {
                subject: self.subject.to_string(),
            });
        }
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        entries.insert((priority, id.0), entry);
        Ok(Handle { id, priority })
    }

    /// Removes the subscription, if it still exists.
    ///
    /// Idempotent: unsubscribing an unknown or already-removed handle is
    /// a no-op, not an error (supports concurrent double-unsubscribe).
    pub fn unsubscribe(&self, handle: &Handle) {
        self.lock().remove(&(handle.priority, handle.id.0));
    }

    /// Returns an immutable, ordered copy of the currently-live entries.
    ///
    /// Every dispatch pass runs against a snapshot, never against the
    /// live map. While copying, entries whose target no longer upgrades
    /// (or reports itself not alive) are removed from the registry.
    pub fn snapshot(&self) -> Snapshot<T> {
        let mut entries = self.lock();
        let mut live = Vec::with_capacity(entries.len());
        let mut dead: Vec<OrderKey> = Vec::new();

        for (key, entry) in entries.iter() {
            match entry.target.upgrade() {
                Some(target) if target.is_alive() => live.push(LiveTarget {
                    id: SubscriptionId(key.1),
                    priority: key.0,
                    name: Arc::clone(&entry.name),
                    target,
                }),
                _ => dead.push(*key),
            }
        }
        for key in dead {
            entries.remove(&key);
        }

        Snapshot { entries: live }
    }

    /// Number of entries currently registered (live or not yet reaped).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Name of the owning subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Closes the registry: rejects new subscriptions and drops all
    /// entries. Idempotent. Called by the owning subject on `close`.
    pub fn close(&self) {
        let mut entries = self.lock();
        self.closed.store(true, Ordering::Release);
        entries.clear();
    }

    /// True once [`Registry::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// One resolved, live entry of a snapshot.
///
/// Holds a strong reference for the duration of the pass, so a target
/// cannot disappear between snapshot and delivery.
pub(crate) struct LiveTarget<T> {
    pub(crate) id: SubscriptionId,
    pub(crate) priority: i32,
    pub(crate) name: Arc<str>,
    pub(crate) target: Arc<dyn Receive<T>>,
}

/// Immutable, ordered copy of the live subscriber set.
///
/// Externally a snapshot exposes identity and ordering only; the resolved
/// delivery capabilities inside are crate-private, so delivery always
/// goes through the dispatcher's failure boundary.
pub struct Snapshot<T> {
    entries: Vec<LiveTarget<T>>,
}

impl<T> Snapshot<T> {
    /// Number of live entries in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot contains no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles of the snapshotted entries, in delivery order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.iter().map(|e| Handle {
            id: e.id,
            priority: e.priority,
        })
    }

    pub(crate) fn into_entries(self) -> Vec<LiveTarget<T>> {
        self.entries
    }
}
