//! Builder for constructing a subject with optional settings.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::DispatchMode;

use super::{Config, Subject};

/// Builder returned by [`Subject::builder`].
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use notibus::{DispatchMode, Subject};
///
/// let subject = Subject::<String>::builder("config")
///     .with_mode(DispatchMode::Concurrent)
///     .with_timeout(Duration::from_millis(250))
///     .build();
/// assert_eq!(subject.name(), "config");
/// ```
pub struct SubjectBuilder<T> {
    name: Arc<str>,
    cfg: Config,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> SubjectBuilder<T> {
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            cfg: Config::default(),
            _payload: PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the dispatch mode (sequential by default).
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.cfg.mode = mode;
        self
    }

    /// Sets the per-target invocation deadline. `Duration::ZERO` means
    /// no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Sets the debouncer report channel capacity (clamped to min 1).
    pub fn with_report_capacity(mut self, capacity: usize) -> Self {
        self.cfg.report_capacity = capacity;
        self
    }

    /// Builds the subject.
    ///
    /// Returns an `Arc` so the subject can be shared with publishers,
    /// targets that re-subscribe, and a [`Debouncer`](crate::Debouncer).
    pub fn build(self) -> Arc<Subject<T>> {
        Subject::new(self.name, self.cfg)
    }
}
