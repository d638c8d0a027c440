//! # Debounced delivery: coalesce rapid publishes into one pass.
//!
//! [`Debouncer`] sits in front of a subject and absorbs bursts of state
//! changes. Offers replace the pending payload; a background worker
//! publishes the latest one once per window.
//!
//! ## Architecture
//! ```text
//! offer(p1) offer(p2) offer(p3)          (replace pending, notify worker)
//!     └────────┴────────┴──► [pending: p3]
//!                                 │
//!                          worker: notified ─► sleep(window) ─► take latest
//!                                 │
//!                           subject.publish(p3) ──► DispatchReport
//!                                 │
//!                           reports channel (bounded, drop-on-full)
//! ```
//!
//! ## What it guarantees
//! - **At-least-the-final-state**: the last offered payload is always
//!   published (shutdown flushes a pending one first).
//! - **At most one dispatch per window** per subject.
//! - `offer` never blocks and never awaits.
//!
//! ## What it does **not** guarantee
//! - Intermediate states are not delivered; a burst collapses to its
//!   final payload.
//! - Reports are dropped for slow consumers (bounded channel); delivery
//!   to targets itself is unaffected.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::SubjectError;
use crate::subject::Subject;

use super::report::DispatchReport;

struct Pending<T> {
    latest: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> Pending<T> {
    fn put(&self, payload: T) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload);
        self.notify.notify_one();
    }

    fn take(&self) -> Option<T> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Coalescing front-end for a [`Subject`].
///
/// Owns a worker task. Dropping the debouncer cancels the worker (a
/// still-pending payload is flushed on its way out), but nothing awaits
/// its exit; prefer [`Debouncer::shutdown`] for a deterministic one.
pub struct Debouncer<T: Send + Sync + 'static> {
    subject: Arc<Subject<T>>,
    pending: Arc<Pending<T>>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    // Cancels the worker when the debouncer is dropped without shutdown.
    _guard: DropGuard,
}

impl<T: Send + Sync + 'static> Debouncer<T> {
    /// Spawns the debounce worker for `subject`.
    ///
    /// Returns the debouncer and the receiving end of its report channel.
    /// The channel is bounded by the subject's configured report
    /// capacity; when the consumer lags, reports are dropped (delivery
    /// itself is never affected).
    pub fn spawn(
        subject: Arc<Subject<T>>,
        window: Duration,
    ) -> (Self, mpsc::Receiver<DispatchReport>) {
        let (tx, rx) = mpsc::channel(subject.config().report_capacity_clamped());
        let pending = Arc::new(Pending {
            latest: Mutex::new(None),
            notify: Notify::new(),
        });
        let cancel = CancellationToken::new();

        let worker = tokio::spawn(run_worker(
            Arc::clone(&subject),
            Arc::clone(&pending),
            window,
            cancel.clone(),
            tx,
        ));

        (
            Self {
                subject,
                pending,
                _guard: cancel.clone().drop_guard(),
                cancel,
                worker,
            },
            rx,
        )
    }

    /// Replaces the pending payload with `payload`.
    ///
    /// The worker publishes the newest pending payload once the current
    /// window elapses; earlier payloads offered in the same window are
    /// coalesced away.
    ///
    /// Fails with [`SubjectError::Closed`] once the subject was closed.
    pub fn offer(&self, payload: T) -> Result<(), SubjectError> {
        if self.subject.is_closed() {
            return Err(SubjectError::Closed {
                subject: self.subject.name().to_string(),
            });
        }
        self.pending.put(payload);
        Ok(())
    }

    /// The subject this debouncer publishes through.
    pub fn subject(&self) -> &Arc<Subject<T>> {
        &self.subject
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// A payload still pending at shutdown is flushed (published) first,
    /// so the final state is not lost. If the subject was closed in the
    /// meantime, the flush is a no-op.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.pending.notify.notify_one();
        let _ = self.worker.await;
    }
}

async fn run_worker<T: Send + Sync + 'static>(
    subject: Arc<Subject<T>>,
    pending: Arc<Pending<T>>,
    window: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<DispatchReport>,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = pending.notify.notified() => {}
        }

        // Absorb the window; offers arriving meanwhile replace the
        // pending payload. Cancellation cuts the window short and falls
        // through to the final flush.
        let sleep = time::sleep(window);
        tokio::pin!(sleep);
        tokio::select! {
            _ = &mut sleep => {}
            _ = cancel.cancelled() => break,
        }

        flush(&subject, &pending, &tx).await;
    }

    // Final-state guarantee across shutdown.
    flush(&subject, &pending, &tx).await;
}

async fn flush<T: Send + Sync + 'static>(
    subject: &Subject<T>,
    pending: &Pending<T>,
    tx: &mpsc::Sender<DispatchReport>,
) {
    let Some(payload) = pending.take() else {
        return;
    };
    match subject.publish(payload).await {
        // Drop-on-full: a slow report consumer never blocks the worker.
        Ok(report) => {
            let _ = tx.try_send(report);
        }
        // Subject closed while we slept; its owner chose to stop
        // deliveries, so the pending payload is dropped with it.
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::VersionTracker;

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_final_state() {
        let subject = Subject::<u32>::builder("sensor").build();
        let tracker = Arc::new(VersionTracker::new());
        subject.subscribe(0, &tracker).unwrap();

        let (debouncer, mut reports) =
            Debouncer::spawn(Arc::clone(&subject), Duration::from_millis(100));

        debouncer.offer(1).unwrap();
        debouncer.offer(2).unwrap();
        debouncer.offer(3).unwrap();

        let report = reports.recv().await.expect("one coalesced dispatch");
        assert_eq!(report.version(), 1);
        assert!(report.all_delivered());
        assert_eq!(tracker.latest().as_deref(), Some(&3));
        assert_eq!(tracker.applied(), 1);

        debouncer.shutdown().await;
        assert!(reports.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_dispatch_separately() {
        let subject = Subject::<u32>::builder("sensor").build();
        let tracker = Arc::new(VersionTracker::new());
        subject.subscribe(0, &tracker).unwrap();

        let (debouncer, mut reports) =
            Debouncer::spawn(Arc::clone(&subject), Duration::from_millis(50));

        debouncer.offer(1).unwrap();
        let first = reports.recv().await.unwrap();
        debouncer.offer(2).unwrap();
        let second = reports.recv().await.unwrap();

        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
        assert_eq!(tracker.applied(), 2);
        assert_eq!(tracker.latest().as_deref(), Some(&2));

        debouncer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_payload() {
        let subject = Subject::<u32>::builder("sensor").build();
        let tracker = Arc::new(VersionTracker::new());
        subject.subscribe(0, &tracker).unwrap();

        let (debouncer, mut reports) =
            Debouncer::spawn(Arc::clone(&subject), Duration::from_secs(3600));

        debouncer.offer(7).unwrap();
        debouncer.shutdown().await;

        let report = reports.recv().await.expect("flushed on shutdown");
        assert_eq!(report.version(), 1);
        assert_eq!(tracker.latest().as_deref(), Some(&7));
        assert!(reports.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offer_after_close_is_rejected() {
        let subject = Subject::<u32>::builder("sensor").build();
        let (debouncer, _reports) =
            Debouncer::spawn(Arc::clone(&subject), Duration::from_millis(10));

        subject.close();
        let err = debouncer.offer(1).unwrap_err();
        assert_eq!(err.as_label(), "subject_closed");

        debouncer.shutdown().await;
    }
}
