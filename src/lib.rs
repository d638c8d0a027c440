//! # notibus
//!
//! **notibus** is a lightweight in-process publish/subscribe notification
//! core for Rust.
//!
//! A [`Subject`] holds versioned state; subscribers register a narrow
//! [`Receive`] capability at a priority; every publish delivers the new
//! state to a consistent snapshot of the live subscriber set, with each
//! delivery wrapped in its own failure boundary. The crate is designed as
//! a building block for higher-level event systems, UI models, and
//! watchers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!     │  subscriber  │    │  subscriber  │    │  subscriber  │
//!     │ (Arc, owned  │    │              │    │              │
//!     │  externally) │    │              │    │              │
//!     └──────▲───────┘    └──────▲───────┘    └──────▲───────┘
//!            │ weak              │ weak              │ weak
//! ┌──────────┴──────────────────┴───────────────────┴─────────────────┐
//! │  Subject (versioned state)                                        │
//! │  - Registry  (ordered set: priority asc, then FIFO)               │
//! │  - Dispatcher (sequential | concurrent, timeout, cancellation)    │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publish(payload)
//!        ▼
//!   version += 1 ──► Registry::snapshot() ──► dispatch pass
//!                         (copy, pruned)          │
//!                                   ┌─────────────┼─────────────┐
//!                                   ▼             ▼             ▼
//!                             receive(&Update)  receive()   receive()
//!                               [boundary]     [boundary]  [boundary]
//!                                   │             │             │
//!                                   └─────────────┴─────────────┘
//!                                                 ▼
//!                                          DispatchReport
//!                                    (per-target outcomes, returned
//!                                     to the publisher)
//! ```
//!
//! ### A pass, step by step
//! ```text
//! publish("x")
//!   ├─► closed? → Err(SubjectError::Closed)
//!   ├─► assign version, store state        (short-held lock)
//!   ├─► snapshot: resolve weak targets, reap dead entries
//!   └─► for each live target (priority order in sequential mode):
//!         ├─ cancelled?     → record Cancelled, skip invocation
//!         ├─ receive() ok   → delivered
//!         ├─ receive() err  → Failed    (pass continues)
//!         ├─ panic caught   → Panicked  (pass continues)
//!         └─ deadline hit   → Timeout   (pass continues)
//! ```
//!
//! ## Features
//! | Area            | Description                                               | Key types                                |
//! |-----------------|-----------------------------------------------------------|------------------------------------------|
//! | **Subjects**    | Versioned state, publish contract, close semantics.       | [`Subject`], [`SubjectBuilder`], [`Config`] |
//! | **Subscribing** | Priority + FIFO ordering, weak lifetime, lazy reaping.    | [`Registry`], [`Handle`], [`Snapshot`]   |
//! | **Targets**     | Narrow receive capability and adapters.                   | [`Receive`], [`ReceiveFn`], [`Filtered`], [`VersionTracker`] |
//! | **Dispatch**    | Isolated delivery, timeouts, cancellation, reports.       | [`Dispatcher`], [`DispatchMode`], [`DispatchReport`] |
//! | **Coalescing**  | One dispatch per window, latest state wins.               | [`Debouncer`]                            |
//! | **Errors**      | Structural vs. per-delivery errors, stable labels.        | [`SubjectError`], [`DeliveryError`]      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogSink`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use notibus::{ReceiveError, ReceiveFn, Subject, Update};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subject = Subject::<String>::builder("headline").build();
//!
//!     // Subscribers own their targets; the subject holds weak entries.
//!     let display = ReceiveFn::arc("display", |u: Update<String>| async move {
//!         println!("v{}: {}", u.version(), u.payload());
//!         Ok::<(), ReceiveError>(())
//!     });
//!     let handle = subject.subscribe(1, &display)?;
//!
//!     let report = subject.publish("hello".to_string()).await?;
//!     assert_eq!(report.version(), 1);
//!     assert!(report.all_delivered());
//!
//!     subject.unsubscribe(&handle);
//!     subject.close();
//!     Ok(())
//! }
//! ```

mod dispatch;
mod error;
mod registry;
mod subject;
mod targets;

// ---- Public re-exports ----

pub use dispatch::{Debouncer, DispatchMode, DispatchReport, DispatchResult, Dispatcher};
pub use error::{DeliveryError, ReceiveError, SubjectError};
pub use registry::{Handle, Registry, Snapshot, SubscriptionId};
pub use subject::{Config, Subject, SubjectBuilder, Update};
pub use targets::{Filtered, Receive, ReceiveFn, ReceiveRef, VersionTracker};

// Optional: expose a simple built-in stdout sink (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use targets::LogSink;
