//! # Example: debounced
//!
//! Coalesced delivery: a burst of rapid state changes collapses into one
//! dispatch per window carrying the latest value.
//!
//! ## Flow
//! ```text
//! offer(1..=5, 10ms apart) ──► Debouncer (100ms window)
//!                                   │
//!                              one publish with the newest value
//!                                   │
//!                              LogSink + VersionTracker
//! ```
//!
//! ## Run
//! Requires the `logging` feature for the built-in [`LogSink`].
//! ```bash
//! cargo run --example debounced --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use notibus::{Debouncer, LogSink, Subject, VersionTracker};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subject = Subject::<u32>::builder("progress").build();

    let log = Arc::new(LogSink);
    let tracker = Arc::new(VersionTracker::new());
    subject.subscribe(1, &log)?;
    subject.subscribe(2, &tracker)?;

    let (debouncer, mut reports) =
        Debouncer::spawn(Arc::clone(&subject), Duration::from_millis(100));

    // A burst: five offers inside one window.
    for pct in [10, 25, 40, 80, 100] {
        debouncer.offer(pct)?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let report = reports.recv().await.expect("coalesced dispatch");
    println!(
        "[publisher] v{}: {}/{} delivered, latest={:?}",
        report.version(),
        report.delivered_count(),
        report.len(),
        tracker.latest()
    );

    debouncer.shutdown().await;
    subject.close();
    Ok(())
}
