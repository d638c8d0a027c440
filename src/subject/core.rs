//! # Subject: versioned state with a publish contract.
//!
//! The [`Subject`] owns the registry and the dispatcher and wires them
//! together: a publish assigns the next version under a short-held lock,
//! snapshots the registry, then dispatches outside the lock and hands the
//! report back to the caller.
//!
//! ## High-level architecture
//! ```text
//! publish(payload):
//!   ├─ closed? ──► Err(SubjectError::Closed)
//!   ├─ lock state:  version += 1, store payload, registry.snapshot()
//!   ├─ unlock       (the lock is never held across the dispatch)
//!   └─ dispatcher.dispatch(snapshot, Update{version, payload}, cancel)
//!          │
//!          └──► DispatchReport (one result per snapshotted target)
//! ```
//!
//! ## Rules
//! - Version assignment is total-order per subject: no two publishes get
//!   the same version, and versions never decrease.
//! - Dispatch passes for different versions may overlap in concurrent
//!   mode (pipelining); updates carry versions so targets can discard
//!   stale ones.
//! - Target callbacks may call `subscribe`, `unsubscribe`, or `publish`
//!   on the same subject: passes run against snapshots and the state
//!   lock is released before delivery, so a re-entrant publish simply
//!   starts an independent pass.
//! - `close` is idempotent, rejects new publishes/subscriptions, and
//!   lets in-flight passes complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::SubjectError;
use crate::registry::{Handle, Registry, Snapshot};
use crate::targets::Receive;

use super::{Config, SubjectBuilder, Update};

struct State<T> {
    version: u64,
    latest: Option<Arc<T>>,
}

/// Versioned state holder that notifies its subscribers on change.
///
/// Create one with [`Subject::builder`]; share it as an `Arc`. The
/// subject never owns its subscribers - it holds weak entries in its
/// registry and resolves them per pass.
pub struct Subject<T> {
    name: Arc<str>,
    cfg: Config,
    registry: Registry<T>,
    dispatcher: Dispatcher,
    state: Mutex<State<T>>,
    closed: AtomicBool,
}

impl<T: Send + Sync + 'static> Subject<T> {
    /// Starts building a subject with the given name.
    pub fn builder(name: impl Into<Arc<str>>) -> SubjectBuilder<T> {
        SubjectBuilder::new(name)
    }

    /// Creates a subject with explicit configuration.
    pub fn new(name: impl Into<Arc<str>>, cfg: Config) -> Arc<Self> {
        let name = name.into();
        Arc::new(Self {
            registry: Registry::new(Arc::clone(&name)),
            dispatcher: Dispatcher::new(cfg.mode, cfg.delivery_timeout()),
            name,
            cfg,
            state: Mutex::new(State {
                version: 0,
                latest: None,
            }),
            closed: AtomicBool::new(false),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a new state value and awaits the dispatch pass.
    ///
    /// Assigns the next version, stores the payload as the latest state,
    /// and delivers `(version, payload)` to the snapshot of currently
    /// live subscribers. The returned report is complete and
    /// non-throwing: per-target failures are recorded, never raised.
    ///
    /// Fails only structurally, with [`SubjectError::Closed`] after
    /// [`Subject::close`]; the state is left untouched in that case.
    pub async fn publish(&self, payload: T) -> Result<DispatchReport, SubjectError> {
        self.publish_with(payload, &CancellationToken::new()).await
    }

    /// Like [`Subject::publish`], with a caller-supplied cancellation
    /// token for the pass.
    ///
    /// Cancelling the token stops issuing further per-target invocations;
    /// targets not yet invoked get a `delivery_cancelled` outcome in the
    /// report. An invocation already issued always runs to completion.
    pub async fn publish_with(
        &self,
        payload: T,
        cancel: &CancellationToken,
    ) -> Result<DispatchReport, SubjectError> {
        if self.is_closed() {
            return Err(SubjectError::Closed {
                subject: self.name.to_string(),
            });
        }

        let payload = Arc::new(payload);
        // Version assignment and snapshot under one short-held lock:
        // concurrent publishes serialize here and nowhere else.
        let (version, snapshot) = {
            let mut state = self.lock_state();
            state.version += 1;
            state.latest = Some(Arc::clone(&payload));
            (state.version, self.registry.snapshot())
        };

        let update = Update::new(Arc::clone(&self.name), version, payload);
        Ok(self.dispatcher.dispatch(snapshot, update, cancel).await)
    }

    /// Subscribes `target` at the given priority.
    ///
    /// Lower priorities are delivered earlier; ties go in subscription
    /// order. The subject keeps only a weak reference - dropping the
    /// caller's `Arc` unsubscribes lazily at the next pass.
    ///
    /// Fails with [`SubjectError::Closed`] after [`Subject::close`].
    pub fn subscribe<R>(&self, priority: i32, target: &Arc<R>) -> Result<Handle, SubjectError>
    where
        R: Receive<T>,
    {
        if self.is_closed() {
            return Err(SubjectError::Closed {
                subject: self.name.to_string(),
            });
        }
        self.registry.subscribe(priority, target)
    }

    /// Type-erased variant of [`Subject::subscribe`].
    pub fn subscribe_dyn(
        &self,
        priority: i32,
        target: &Arc<dyn Receive<T>>,
    ) -> Result<Handle, SubjectError> {
        if self.is_closed() {
            return Err(SubjectError::Closed {
                subject: self.name.to_string(),
            });
        }
        self.registry.subscribe_dyn(priority, target)
    }

    /// Removes a subscription. Idempotent; unknown handles are a no-op.
    ///
    /// A pass that already snapshotted the handle may still deliver to it
    /// once (at-most-once-late-removal).
    pub fn unsubscribe(&self, handle: &Handle) {
        self.registry.unsubscribe(handle);
    }

    /// Returns an ordered snapshot of the currently-live subscriber set,
    /// pruning dead entries as a side effect.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.registry.snapshot()
    }

    /// Closes the subject.
    ///
    /// Idempotent. Subsequent `publish`/`subscribe` calls fail with
    /// [`SubjectError::Closed`]; in-flight passes complete normally.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.registry.close();
        }
    }

    /// True once [`Subject::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Subject name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current version: 0 before the first publish, then the version of
    /// the most recent publish.
    pub fn version(&self) -> u64 {
        self.lock_state().version
    }

    /// Latest published payload, if any.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.lock_state().latest.clone()
    }

    /// Number of registered subscriptions (dead ones included until the
    /// next pass reaps them).
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// The delivery configuration this subject runs with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchMode;
    use crate::error::ReceiveError;
    use crate::targets::ReceiveFn;
    use std::sync::atomic::AtomicBool as StdAtomicBool;
    use std::sync::Mutex as StdMutex;

    type Seen = Arc<StdMutex<Vec<(u64, String)>>>;

    fn recording(
        name: &'static str,
    ) -> (
        Arc<
            ReceiveFn<
                impl Fn(Update<String>) -> futures::future::Ready<Result<(), ReceiveError>>
                    + Send
                    + Sync
                    + 'static,
            >,
        >,
        Seen,
    ) {
        let seen: Seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let target = ReceiveFn::arc(name, move |u: Update<String>| {
            sink.lock()
                .unwrap()
                .push((u.version(), u.payload().clone()));
            futures::future::ready(Ok(()))
        });
        (target, seen)
    }

    #[tokio::test]
    async fn test_publish_unsubscribe_close_scenario() {
        let subject = Subject::<String>::builder("news").build();
        let (a, seen_a) = recording("a");
        let (b, seen_b) = recording("b");

        let handle_a = subject.subscribe(1, &a).unwrap();
        subject.subscribe(2, &b).unwrap();
        assert_eq!(subject.version(), 0);

        let report = subject.publish("x".to_string()).await.unwrap();
        assert_eq!(report.version(), 1);
        assert_eq!(report.len(), 2);
        assert!(report.all_delivered());

        subject.unsubscribe(&handle_a);
        let report = subject.publish("y".to_string()).await.unwrap();
        assert_eq!(report.version(), 2);
        assert_eq!(report.len(), 1);

        subject.close();
        let err = subject.publish("z".to_string()).await.unwrap_err();
        assert_eq!(err.as_label(), "subject_closed");

        assert_eq!(
            *seen_a.lock().unwrap(),
            vec![(1, "x".to_string())]
        );
        assert_eq!(
            *seen_b.lock().unwrap(),
            vec![(1, "x".to_string()), (2, "y".to_string())]
        );
    }

    #[tokio::test]
    async fn test_closed_subject_rejects_and_leaves_state_unchanged() {
        let subject = Subject::<String>::builder("s").build();
        subject.publish("x".to_string()).await.unwrap();
        subject.close();
        subject.close(); // idempotent

        assert!(subject.publish("y".to_string()).await.is_err());
        let (t, _) = recording("late");
        assert!(subject.subscribe(0, &t).is_err());

        assert_eq!(subject.version(), 1);
        assert_eq!(subject.latest().as_deref(), Some(&"x".to_string()));
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_get_unique_increasing_versions() {
        let subject = Subject::<u32>::builder("counter").build();

        let mut joins = Vec::new();
        for task in 0..8_u32 {
            let subject = Arc::clone(&subject);
            joins.push(tokio::spawn(async move {
                let mut versions = Vec::new();
                for i in 0..5 {
                    let report = subject.publish(task * 100 + i).await.unwrap();
                    versions.push(report.version());
                }
                versions
            }));
        }

        let mut all = Vec::new();
        for join in joins {
            let versions = join.await.unwrap();
            // Versions observed by one publisher task are increasing.
            assert!(versions.windows(2).all(|w| w[0] < w[1]));
            all.extend(versions);
        }

        all.sort_unstable();
        let expected: Vec<u64> = (1..=40).collect();
        assert_eq!(all, expected, "40 publishes, no duplicates, no gaps");
        assert_eq!(subject.version(), 40);
    }

    #[tokio::test]
    async fn test_reentrant_publish_from_callback() {
        let subject = Subject::<String>::builder("s").build();
        let fired = Arc::new(StdAtomicBool::new(false));

        let inner_subject = Arc::clone(&subject);
        let fired_in = Arc::clone(&fired);
        let reentrant = ReceiveFn::arc("reentrant", move |u: Update<String>| {
            let subject = Arc::clone(&inner_subject);
            let fired = Arc::clone(&fired_in);
            async move {
                if !fired.swap(true, Ordering::SeqCst) {
                    // Publishing from inside a pass starts a new,
                    // independent pass instead of deadlocking.
                    subject
                        .publish(format!("echo-{}", u.payload()))
                        .await
                        .map_err(|e| ReceiveError::new(e.as_message()))?;
                }
                Ok(())
            }
        });
        let (observer, seen) = recording("observer");

        subject.subscribe(0, &reentrant).unwrap();
        subject.subscribe(1, &observer).unwrap();

        let report = subject.publish("x".to_string()).await.unwrap();
        assert!(report.all_delivered());

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(2, "echo-x".to_string()), (1, "x".to_string())],
            "inner pass completes while the outer one is mid-flight"
        );
    }

    #[tokio::test]
    async fn test_target_subscribed_mid_pass_misses_that_pass() {
        let subject = Subject::<String>::builder("s").build();
        let (late, seen_late) = recording("late");

        let subject_in = Arc::clone(&subject);
        let late_in = Arc::clone(&late);
        let added = Arc::new(StdAtomicBool::new(false));
        let added_in = Arc::clone(&added);
        let joiner = ReceiveFn::arc("joiner", move |_u: Update<String>| {
            let subject = Arc::clone(&subject_in);
            let late = Arc::clone(&late_in);
            let added = Arc::clone(&added_in);
            async move {
                if !added.swap(true, Ordering::SeqCst) {
                    subject
                        .subscribe(5, &late)
                        .map_err(|e| ReceiveError::new(e.as_message()))?;
                }
                Ok(())
            }
        });
        subject.subscribe(0, &joiner).unwrap();

        let first = subject.publish("one".to_string()).await.unwrap();
        assert_eq!(first.len(), 1, "snapshot taken before the new entry");
        assert!(seen_late.lock().unwrap().is_empty());

        let second = subject.publish("two".to_string()).await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(
            *seen_late.lock().unwrap(),
            vec![(2, "two".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delivery_count_matches_registered_window() {
        let subject = Subject::<String>::builder("s").build();
        let (t, seen) = recording("windowed");

        subject.publish("before".to_string()).await.unwrap();
        let handle = subject.subscribe(0, &t).unwrap();
        subject.publish("one".to_string()).await.unwrap();
        subject.publish("two".to_string()).await.unwrap();
        subject.unsubscribe(&handle);
        subject.publish("after".to_string()).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(2, "one".to_string()), (3, "two".to_string())],
            "deliveries equal publishes made while registered"
        );
    }

    #[tokio::test]
    async fn test_concurrent_mode_still_reports_every_target() {
        let subject = Subject::<String>::builder("s")
            .with_mode(DispatchMode::Concurrent)
            .build();
        let (a, seen_a) = recording("a");
        let (b, seen_b) = recording("b");
        subject.subscribe(1, &a).unwrap();
        subject.subscribe(2, &b).unwrap();

        let report = subject.publish("x".to_string()).await.unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.all_delivered());
        assert_eq!(seen_a.lock().unwrap().len(), 1);
        assert_eq!(seen_b.lock().unwrap().len(), 1);
    }
}
