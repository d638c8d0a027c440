//! # Simple logging target for debugging and demos.
//!
//! [`LogSink`] prints each update to stdout in a human-readable format.
//! Enabled via the `logging` feature.
//!
//! ## Output format
//! ```text
//! [update] subject=weather version=3
//! ```

use async_trait::async_trait;

use crate::error::ReceiveError;
use crate::subject::Update;

use super::Receive;

/// Simple stdout logging target.
///
/// Prints subject name and version for every delivery; the payload is not
/// printed (it carries no `Debug` bound). Not intended for production -
/// implement a custom [`Receive`] for structured logging or metrics.
pub struct LogSink;

#[async_trait]
impl<T: Send + Sync + 'static> Receive<T> for LogSink {
    async fn receive(&self, update: &Update<T>) -> Result<(), ReceiveError> {
        println!(
            "[update] subject={} version={}",
            update.subject(),
            update.version()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
