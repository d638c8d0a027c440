//! # Subject configuration.
//!
//! Provides [`Config`], the delivery settings one subject runs with.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no per-target deadline (treated as `None`)
//! - `report_capacity` → clamped to a minimum of 1

use std::time::Duration;

use crate::dispatch::DispatchMode;

/// Delivery configuration for a subject.
///
/// ## Field semantics
/// - `mode`: sequential (ordered, default) or concurrent (unordered
///   fan-out, joined) delivery
/// - `timeout`: per-target invocation deadline (`0s` = no deadline)
/// - `report_capacity`: size of the debouncer's report channel (min 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks across calling code.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// How dispatch passes walk the snapshot.
    pub mode: DispatchMode,

    /// Per-target invocation deadline.
    ///
    /// - `Duration::ZERO` = no deadline (a target may take as long as it
    ///   wants; in sequential mode that delays the targets after it)
    /// - `> 0` = exceeding it records a `delivery_timeout` outcome
    pub timeout: Duration,

    /// Capacity of a debouncer's report channel.
    ///
    /// When the consumer lags behind, reports are dropped (delivery to
    /// targets is unaffected). Minimum value is 1 (clamped).
    pub report_capacity: usize,
}

impl Config {
    /// Returns the per-target deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → deadline applied per invocation
    #[inline]
    pub fn delivery_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the report capacity clamped to a minimum of 1.
    #[inline]
    pub fn report_capacity_clamped(&self) -> usize {
        self.report_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `mode = Sequential` (deterministic ordering)
    /// - `timeout = 0s` (no per-target deadline)
    /// - `report_capacity = 64`
    fn default() -> Self {
        Self {
            mode: DispatchMode::Sequential,
            timeout: Duration::ZERO,
            report_capacity: 64,
        }
    }
}
