//! Predicate-gated wrapper around another delivery target.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ReceiveError;
use crate::subject::Update;

use super::Receive;

/// Delivers to the inner target only when the predicate accepts the
/// update. Declined updates count as delivered in the dispatch report:
/// the subscription worked, the target was just not interested.
///
/// ## Example
/// ```rust
/// use notibus::{Filtered, ReceiveError, ReceiveFn, Update};
///
/// let big_only = Filtered::arc(
///     ReceiveFn::new("big", |u: Update<u64>| async move {
///         println!("big value: {}", u.payload());
///         Ok::<(), ReceiveError>(())
///     }),
///     |u: &Update<u64>| *u.payload() > 100,
/// );
/// ```
pub struct Filtered<R, P> {
    inner: R,
    predicate: P,
}

impl<R, P> Filtered<R, P> {
    /// Wraps `inner`, delivering only updates the predicate accepts.
    pub fn new(inner: R, predicate: P) -> Self {
        Self { inner, predicate }
    }

    /// Convenience: wraps and returns `Arc<Self>` ready for `subscribe`.
    pub fn arc(inner: R, predicate: P) -> Arc<Self> {
        Arc::new(Self::new(inner, predicate))
    }
}

#[async_trait]
impl<T, R, P> Receive<T> for Filtered<R, P>
where
    T: Send + Sync + 'static,
    R: Receive<T>,
    P: Fn(&Update<T>) -> bool + Send + Sync + 'static,
{
    async fn receive(&self, update: &Update<T>) -> Result<(), ReceiveError> {
        if (self.predicate)(update) {
            self.inner.receive(update).await
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }
}
