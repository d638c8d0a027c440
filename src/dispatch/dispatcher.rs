//! # Dispatcher: executes one notification pass over a snapshot.
//!
//! Every delivery runs inside an individual failure boundary; one bad
//! target can neither break the pass nor starve the other targets. This
//! is the property separating a production dispatcher from the naive
//! notify loop.
//!
//! ## Invocation boundary
//! ```text
//! for each snapshot entry (priority order):
//!   cancelled? ──────────────► record Cancelled, skip invocation
//!   │
//!   receive(&update) ── wrapped in catch_unwind ── wrapped in timeout
//!       │
//!       ├─ Ok(())        → delivered
//!       ├─ Err(recv err) → DeliveryError::Failed     (pass continues)
//!       ├─ panic caught  → DeliveryError::Panicked   (pass continues)
//!       └─ deadline hit  → DeliveryError::Timeout    (pass continues)
//! ```
//!
//! ## Modes
//! - [`DispatchMode::Sequential`]: strict snapshot order, one invocation
//!   at a time. A slow target delays the ones after it; the per-target
//!   timeout bounds how long (documented trade-off).
//! - [`DispatchMode::Concurrent`]: all invocations fan out on a
//!   [`JoinSet`] and the pass returns after every one joined. Delivery
//!   order across targets is not defined; a slow target cannot stall the
//!   pass beyond its own deadline.
//!
//! ## Rules
//! - Exactly one result per snapshot entry, reported in snapshot order.
//! - An invocation, once issued, is atomic from the dispatcher's view:
//!   it runs to completion or to its own timeout, never half-recorded.
//! - Cancellation stops *issuing* invocations; it never interrupts one.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::DeliveryError;
use crate::registry::{LiveTarget, Snapshot};
use crate::subject::Update;

use super::report::{DispatchReport, DispatchResult};

/// How a pass walks its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Invoke targets one by one, in priority-then-FIFO order. The only
    /// mode with deterministic delivery ordering.
    #[default]
    Sequential,
    /// Fan out all invocations and join them before returning. Unordered
    /// but complete.
    Concurrent,
}

/// Executes notification passes.
///
/// Stateless apart from its configuration; one dispatcher is shared by
/// all passes of a subject.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    mode: DispatchMode,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher with the given mode and optional per-target
    /// deadline.
    pub fn new(mode: DispatchMode, timeout: Option<Duration>) -> Self {
        Self { mode, timeout }
    }

    /// The configured mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// The configured per-target deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs one pass: delivers `update` to every snapshot entry and
    /// returns one result per entry, in snapshot order.
    ///
    /// Never fails: per-target problems are recorded in the report, and
    /// an empty snapshot yields an empty report.
    pub async fn dispatch<T>(
        &self,
        snapshot: Snapshot<T>,
        update: Update<T>,
        cancel: &CancellationToken,
    ) -> DispatchReport
    where
        T: Send + Sync + 'static,
    {
        let version = update.version();
        let update = Arc::new(update);
        let results = match self.mode {
            DispatchMode::Sequential => self.run_sequential(snapshot, update, cancel).await,
            DispatchMode::Concurrent => self.run_concurrent(snapshot, update, cancel).await,
        };
        DispatchReport::new(version, results)
    }

    async fn run_sequential<T>(
        &self,
        snapshot: Snapshot<T>,
        update: Arc<Update<T>>,
        cancel: &CancellationToken,
    ) -> Vec<DispatchResult>
    where
        T: Send + Sync + 'static,
    {
        let entries = snapshot.into_entries();
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            if cancel.is_cancelled() {
                results.push(DispatchResult::failed(
                    entry.id,
                    entry.name,
                    DeliveryError::Cancelled,
                ));
                continue;
            }
            results.push(deliver_once(entry, Arc::clone(&update), self.timeout).await);
        }
        results
    }

    async fn run_concurrent<T>(
        &self,
        snapshot: Snapshot<T>,
        update: Arc<Update<T>>,
        cancel: &CancellationToken,
    ) -> Vec<DispatchResult>
    where
        T: Send + Sync + 'static,
    {
        let entries = snapshot.into_entries();
        let meta: Vec<_> = entries
            .iter()
            .map(|e| (e.id, Arc::clone(&e.name)))
            .collect();
        let mut slots: Vec<Option<DispatchResult>> = Vec::new();
        slots.resize_with(entries.len(), || None);

        let mut set = JoinSet::new();
        for (idx, entry) in entries.into_iter().enumerate() {
            if cancel.is_cancelled() {
                slots[idx] = Some(DispatchResult::failed(
                    entry.id,
                    entry.name,
                    DeliveryError::Cancelled,
                ));
                continue;
            }
            let update = Arc::clone(&update);
            let timeout = self.timeout;
            set.spawn(async move { (idx, deliver_once(entry, update, timeout).await) });
        }

        // Join semantics: the pass returns only after every issued
        // invocation completed, even if the token fired meanwhile.
        while let Some(joined) = set.join_next().await {
            if let Ok((idx, result)) = joined {
                slots[idx] = Some(result);
            }
        }

        // A join error would mean the invocation task itself died; the
        // target panic inside it is already caught, so this only covers
        // runtime-level aborts.
        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    let (id, name) = (meta[idx].0, Arc::clone(&meta[idx].1));
                    DispatchResult::failed(
                        id,
                        name,
                        DeliveryError::Panicked {
                            reason: "invocation task aborted".to_string(),
                        },
                    )
                })
            })
            .collect()
    }
}

impl Default for Dispatcher {
    /// Sequential mode, no per-target deadline.
    fn default() -> Self {
        Self::new(DispatchMode::Sequential, None)
    }
}

/// Invokes one target inside the failure boundary and maps the outcome.
async fn deliver_once<T>(
    entry: LiveTarget<T>,
    update: Arc<Update<T>>,
    timeout: Option<Duration>,
) -> DispatchResult
where
    T: Send + Sync + 'static,
{
    let LiveTarget {
        id, name, target, ..
    } = entry;

    let fut = async move { target.receive(update.as_ref()).await };
    let fut = std::panic::AssertUnwindSafe(fut).catch_unwind();

    let outcome = match timeout {
        Some(deadline) => match time::timeout(deadline, fut).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                return DispatchResult::failed(
                    id,
                    name,
                    DeliveryError::Timeout { timeout: deadline },
                );
            }
        },
        None => fut.await,
    };

    match outcome {
        Ok(Ok(())) => DispatchResult::delivered(id, name),
        Ok(Err(err)) => DispatchResult::failed(
            id,
            name,
            DeliveryError::Failed {
                error: err.to_string(),
            },
        ),
        Err(panic) => DispatchResult::failed(
            id,
            name,
            DeliveryError::Panicked {
                reason: panic_reason(panic.as_ref()),
            },
        ),
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "target panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReceiveError;
    use crate::registry::Registry;
    use crate::targets::ReceiveFn;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn update(version: u64, payload: &str) -> Update<String> {
        Update::new(Arc::from("s"), version, Arc::new(payload.to_string()))
    }

    fn recorder(
        name: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<
        ReceiveFn<
            impl Fn(Update<String>) -> futures::future::Ready<Result<(), ReceiveError>>
                + Send
                + Sync
                + 'static,
        >,
    > {
        let log = Arc::clone(log);
        ReceiveFn::arc(name, move |_u: Update<String>| {
            log.lock().unwrap().push(name);
            futures::future::ready(Ok(()))
        })
    }

    #[tokio::test]
    async fn test_sequential_order_is_deterministic() {
        let registry: Registry<String> = Registry::new("s");
        let log = Arc::new(Mutex::new(Vec::new()));

        let second = recorder("second", &log);
        let first = recorder("first", &log);
        let third = recorder("third", &log);
        registry.subscribe(5, &second).unwrap();
        registry.subscribe(1, &first).unwrap();
        registry.subscribe(9, &third).unwrap();

        let dispatcher = Dispatcher::default();
        for round in 1..=3 {
            log.lock().unwrap().clear();
            let report = dispatcher
                .dispatch(
                    registry.snapshot(),
                    update(round, "x"),
                    &CancellationToken::new(),
                )
                .await;
            assert!(report.all_delivered());
            assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
        }
    }

    #[tokio::test]
    async fn test_panicking_target_does_not_break_the_pass() {
        let registry: Registry<String> = Registry::new("s");
        let log = Arc::new(Mutex::new(Vec::new()));

        let before = recorder("before", &log);
        let after = recorder("after", &log);
        let bomb = ReceiveFn::arc("bomb", |_u: Update<String>| async move {
            if true {
                panic!("boom");
            }
            Ok(())
        });
        registry.subscribe(1, &before).unwrap();
        registry.subscribe(2, &bomb).unwrap();
        registry.subscribe(3, &after).unwrap();

        let report = Dispatcher::default()
            .dispatch(registry.snapshot(), update(1, "x"), &CancellationToken::new())
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
        assert_eq!(report.delivered_count(), 2);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name(), "bomb");
        assert_eq!(
            failures[0].error(),
            Some(&DeliveryError::Panicked {
                reason: "boom".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_erroring_target_is_recorded_not_fatal() {
        let registry: Registry<String> = Registry::new("s");
        let sour = ReceiveFn::arc("sour", |_u: Update<String>| async move {
            Err(ReceiveError::new("not today"))
        });
        let fine = ReceiveFn::arc("fine", |_u: Update<String>| async move { Ok(()) });
        registry.subscribe(1, &sour).unwrap();
        registry.subscribe(2, &fine).unwrap();

        let report = Dispatcher::default()
            .dispatch(registry.snapshot(), update(1, "x"), &CancellationToken::new())
            .await;

        assert_eq!(report.delivered_count(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].error(),
            Some(&DeliveryError::Failed {
                error: "not today".to_string()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_target_times_out_without_stalling_pass() {
        let registry: Registry<String> = Registry::new("s");
        let slow = ReceiveFn::arc("slow", |_u: Update<String>| async move {
            time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let quick = ReceiveFn::arc("quick", |_u: Update<String>| async move { Ok(()) });
        registry.subscribe(1, &slow).unwrap();
        registry.subscribe(2, &quick).unwrap();

        let dispatcher = Dispatcher::new(DispatchMode::Sequential, Some(Duration::from_secs(1)));
        let report = dispatcher
            .dispatch(registry.snapshot(), update(1, "x"), &CancellationToken::new())
            .await;

        assert_eq!(report.delivered_count(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures[0].name(), "slow");
        assert_eq!(
            failures[0].error(),
            Some(&DeliveryError::Timeout {
                timeout: Duration::from_secs(1)
            })
        );
    }

    #[tokio::test]
    async fn test_cancellation_marks_remaining_targets() {
        let registry: Registry<String> = Registry::new("s");
        let cancel = CancellationToken::new();

        let trip = cancel.clone();
        let tripper = ReceiveFn::arc("tripper", move |_u: Update<String>| {
            let trip = trip.clone();
            async move {
                trip.cancel();
                Ok(())
            }
        });
        let skipped = ReceiveFn::arc("skipped", |_u: Update<String>| async move { Ok(()) });
        registry.subscribe(1, &tripper).unwrap();
        registry.subscribe(2, &skipped).unwrap();

        let report = Dispatcher::default()
            .dispatch(registry.snapshot(), update(1, "x"), &cancel)
            .await;

        // The tripping target itself completed; the one after it was
        // never invoked.
        let results = report.results();
        assert!(results[0].is_delivered());
        assert_eq!(results[1].error(), Some(&DeliveryError::Cancelled));
    }

    #[tokio::test]
    async fn test_concurrent_pass_joins_all_and_keeps_report_order() {
        let registry: Registry<String> = Registry::new("s");
        let hits = Arc::new(AtomicU64::new(0));

        let targets: Vec<_> = (0..8)
            .map(|_| {
                let hits = Arc::clone(&hits);
                ReceiveFn::arc("worker", move |_u: Update<String>| {
                    let hits = Arc::clone(&hits);
                    async move {
                        time::sleep(Duration::from_millis(5)).await;
                        hits.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
            })
            .collect();
        let handles: Vec<_> = targets
            .iter()
            .enumerate()
            .map(|(i, t)| registry.subscribe(i as i32, t).unwrap())
            .collect();

        let dispatcher = Dispatcher::new(DispatchMode::Concurrent, None);
        let report = dispatcher
            .dispatch(registry.snapshot(), update(1, "x"), &CancellationToken::new())
            .await;

        // Everyone ran before dispatch returned (join semantics).
        assert_eq!(hits.load(Ordering::SeqCst), 8);
        assert!(report.all_delivered());
        let reported: Vec<_> = report.results().iter().map(|r| r.id()).collect();
        let expected: Vec<_> = handles.iter().map(|h| h.id()).collect();
        assert_eq!(reported, expected);
    }
}
