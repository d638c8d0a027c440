//! # Closure-backed delivery target (`ReceiveFn`)
//!
//! [`ReceiveFn`] wraps a closure `F: Fn(Update<T>) -> Fut`, producing a
//! fresh future per delivery. This avoids shared mutable state; if the
//! closure needs state across deliveries, move an `Arc<...>` into it
//! explicitly.
//!
//! ## Example
//! ```rust
//! use notibus::{ReceiveError, ReceiveFn, Subject, Update};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let subject = Subject::<String>::builder("news").build();
//! let printer = ReceiveFn::arc("printer", |u: Update<String>| async move {
//!     println!("v{} -> {}", u.version(), u.payload());
//!     Ok::<(), ReceiveError>(())
//! });
//! subject.subscribe(0, &printer)?;
//!
//! let report = subject.publish("hello".to_string()).await?;
//! assert!(report.all_delivered());
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ReceiveError;
use crate::subject::Update;

use super::Receive;

/// Function-backed delivery target.
///
/// Wraps a closure that *creates* a new future per delivery. The closure
/// takes the [`Update`] by value (cloning one is two `Arc` bumps).
pub struct ReceiveFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ReceiveFn<F> {
    /// Creates a new function-backed target.
    ///
    /// Prefer [`ReceiveFn::arc`] when you immediately need a shared
    /// handle to subscribe with.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the target and returns it as `Arc<Self>`, ready to pass to
    /// `subscribe`. The caller keeps the `Arc`: dropping it unsubscribes
    /// lazily at the next snapshot.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<T, F, Fut> Receive<T> for ReceiveFn<F>
where
    T: Send + Sync + 'static,
    F: Fn(Update<T>) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), ReceiveError>> + Send + 'static,
{
    async fn receive(&self, update: &Update<T>) -> Result<(), ReceiveError> {
        (self.f)(update.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
