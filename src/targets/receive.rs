//! # Delivery target capability.
//!
//! Provides [`Receive`], the single narrow capability a subscriber object
//! implements to get notified of state changes. Any concrete type can
//! subscribe by implementing this one method; the core never constructs or
//! owns targets.
//!
//! Each delivery is made:
//! - **Through the dispatcher only** (external code never invokes
//!   `receive` directly; the fault-isolation boundary lives there)
//! - **Inside a failure boundary** (panics and errors are caught and
//!   recorded per target, other targets are unaffected)
//! - **With the publish-time version attached** (targets can discard
//!   stale updates when passes overlap)
//!
//! ## Rules
//! - Use async I/O; avoid blocking the executor.
//! - Return `Err(ReceiveError)` for expected failures; panics are caught
//!   but reported as `delivery_panicked`.
//! - `is_alive` must be cheap and non-blocking; it is probed under the
//!   registry lock at snapshot time.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use notibus::{Receive, ReceiveError, Update};
//!
//! struct Display;
//!
//! #[async_trait]
//! impl Receive<f64> for Display {
//!     async fn receive(&self, update: &Update<f64>) -> Result<(), ReceiveError> {
//!         println!("reading v{}: {}", update.version(), update.payload());
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "display" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ReceiveError;
use crate::subject::Update;

/// Shared handle to a delivery target.
pub type ReceiveRef<T> = Arc<dyn Receive<T>>;

/// Capability for receiving state-change notifications.
///
/// The registry holds targets as weak references; the subscriber's owner
/// keeps the `Arc` alive. Dropping the `Arc` is a valid way to
/// unsubscribe: the entry is reaped at the next snapshot.
#[async_trait]
pub trait Receive<T: Send + Sync + 'static>: Send + Sync + 'static {
    /// Processes a single update.
    ///
    /// Called from the dispatcher only, never from publisher context
    /// directly. In sequential mode calls arrive in priority order; in
    /// concurrent mode ordering across targets is not defined.
    async fn receive(&self, update: &Update<T>) -> Result<(), ReceiveError>;

    /// Returns the target name used in dispatch reports.
    ///
    /// Prefer short, descriptive names (e.g., "display", "cache",
    /// "alerts"). The default uses `type_name::<Self>()`, which can be
    /// verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Liveness probe consulted at snapshot time.
    ///
    /// Returning `false` removes the subscription at the next snapshot,
    /// exactly as if the owning `Arc` had been dropped. Useful for
    /// targets whose usefulness ends before their allocation does (a
    /// closed widget, a detached session).
    ///
    /// Must be cheap: it runs under the registry lock.
    fn is_alive(&self) -> bool {
        true
    }
}
