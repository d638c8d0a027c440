//! # Dispatch: delivery passes and their outcomes.
//!
//! This module contains the machinery that turns a registry snapshot and
//! an update into per-target deliveries.
//!
//! ## Contents
//! - [`Dispatcher`], [`DispatchMode`] the pass executor (sequential or
//!   concurrent, per-target timeout, cancellation)
//! - [`DispatchResult`], [`DispatchReport`] per-target and per-pass
//!   outcomes
//! - [`Debouncer`] optional coalescing front-end (one dispatch per
//!   window, latest state wins)
//!
//! ## Quick reference
//! - **Callers**: `Subject::publish` drives the dispatcher; `Debouncer`
//!   drives `Subject::publish`.
//! - **Isolation**: every target invocation is individually wrapped;
//!   see `dispatcher.rs` for the boundary rules.

mod debounce;
mod dispatcher;
mod report;

pub use debounce::Debouncer;
pub use dispatcher::{DispatchMode, Dispatcher};
pub use report::{DispatchReport, DispatchResult};
