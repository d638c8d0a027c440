//! # Example: custom_target
//!
//! Demonstrates implementing [`Receive`] on a custom type, and the
//! dispatcher's fault isolation: one failing target never disturbs the
//! others.
//!
//! Shows how to:
//! - Implement the [`Receive`] trait on a struct with state.
//! - Read per-target outcomes from the [`DispatchReport`].
//! - Watch a panicking target get contained at the invocation boundary.
//!
//! ## Run
//! ```bash
//! cargo run --example custom_target
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use notibus::{Receive, ReceiveError, ReceiveFn, Subject, Update};

/// Counts readings above a threshold. In real life you could export
/// metrics, refresh a widget, or trigger alerts.
struct ThresholdCounter {
    threshold: f64,
    hits: AtomicU64,
}

#[async_trait]
impl Receive<f64> for ThresholdCounter {
    async fn receive(&self, update: &Update<f64>) -> Result<(), ReceiveError> {
        if *update.payload() > self.threshold {
            let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
            println!(
                "[counter] v{}: {} above {} ({} so far)",
                update.version(),
                update.payload(),
                self.threshold,
                hits
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "threshold-counter"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subject = Subject::<f64>::builder("sensor").build();

    let counter = Arc::new(ThresholdCounter {
        threshold: 20.0,
        hits: AtomicU64::new(0),
    });
    let flaky = ReceiveFn::arc("flaky", |u: Update<f64>| async move {
        if u.version() % 2 == 0 {
            panic!("flaky target lost its mind on v{}", u.version());
        }
        Ok::<(), ReceiveError>(())
    });

    subject.subscribe(1, &counter)?;
    subject.subscribe(2, &flaky)?;

    for reading in [18.0, 22.5, 25.0, 19.5] {
        let report = subject.publish(reading).await?;
        for failure in report.failures() {
            println!(
                "[publisher] v{}: target '{}' failed: {}",
                report.version(),
                failure.name(),
                failure.error().map(|e| e.as_label()).unwrap_or("unknown")
            );
        }
    }

    println!("[publisher] counter ended at {}", counter.hits.load(Ordering::Relaxed));
    subject.close();
    Ok(())
}
