//! # Example: basic_publish
//!
//! Minimal end-to-end flow: build a subject, subscribe two prioritized
//! targets, publish twice, inspect the reports.
//!
//! ## Flow
//! ```text
//! Subject::builder("weather").build()
//!     ├─► subscribe(1, display)      (delivered first)
//!     ├─► subscribe(5, archive)      (delivered second)
//!     ├─► publish(21.5) ─► v1 to display, then archive
//!     └─► publish(19.0) ─► v2 to display, then archive
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_publish
//! ```

use notibus::{ReceiveError, ReceiveFn, Subject, Update};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subject = Subject::<f64>::builder("weather").build();

    let display = ReceiveFn::arc("display", |u: Update<f64>| async move {
        println!("[display] v{}: {:.1} degrees", u.version(), u.payload());
        Ok::<(), ReceiveError>(())
    });
    let archive = ReceiveFn::arc("archive", |u: Update<f64>| async move {
        println!("[archive] stored v{}", u.version());
        Ok::<(), ReceiveError>(())
    });

    subject.subscribe(1, &display)?;
    subject.subscribe(5, &archive)?;

    for reading in [21.5, 19.0] {
        let report = subject.publish(reading).await?;
        println!(
            "[publisher] v{}: {}/{} delivered",
            report.version(),
            report.delivered_count(),
            report.len()
        );
    }

    subject.close();
    Ok(())
}
