//! # Delivery targets.
//!
//! This module provides the [`Receive`] capability and built-in target
//! implementations.
//!
//! ## Architecture
//! ```text
//! Delivery flow:
//!   Subject ── publish ──► Dispatcher ──► per-target failure boundary
//!                                              │
//!                                         Receive::receive(&Update)
//!                                              │
//!                                   ┌──────────┼──────────┬─────────┐
//!                                   ▼          ▼          ▼         ▼
//!                               ReceiveFn  Filtered  VersionTracker  custom
//! ```
//!
//! ## Target types
//! - **Passive targets** - observe and react to updates (displays, caches,
//!   alerts): implement [`Receive`] or wrap a closure in [`ReceiveFn`]
//! - **Stateful targets** - maintain state based on updates
//!   ([`VersionTracker`] keeps the newest version and discards stale ones)
//! - **Decorators** - [`Filtered`] gates another target behind a predicate

mod filtered;
mod receive;
mod receive_fn;
mod tracker;

#[cfg(feature = "logging")]
mod log;

pub use filtered::Filtered;
pub use receive::{Receive, ReceiveRef};
pub use receive_fn::ReceiveFn;
pub use tracker::VersionTracker;

#[cfg(feature = "logging")]
pub use log::LogSink;
