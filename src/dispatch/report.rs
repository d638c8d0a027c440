//! Per-pass outcome reporting.
//!
//! A dispatch pass produces one [`DispatchResult`] per snapshotted target
//! and aggregates them into a [`DispatchReport`]. The report is returned
//! to the publisher, which may inspect it, forward it to a metrics sink,
//! or ignore it; the core itself never logs.

use std::sync::Arc;

use crate::error::DeliveryError;
use crate::registry::SubscriptionId;

/// Outcome of delivering one update to one target.
///
/// A non-delivered result never causes other targets to be skipped; it
/// exists purely for failure reporting and diagnostics.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    id: SubscriptionId,
    name: Arc<str>,
    error: Option<DeliveryError>,
}

impl DispatchResult {
    pub(crate) fn delivered(id: SubscriptionId, name: Arc<str>) -> Self {
        Self {
            id,
            name,
            error: None,
        }
    }

    pub(crate) fn failed(id: SubscriptionId, name: Arc<str>, error: DeliveryError) -> Self {
        Self {
            id,
            name,
            error: Some(error),
        }
    }

    /// Id of the subscription this result belongs to.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Target name captured at subscription time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the update reached the target and `receive` returned `Ok`.
    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }

    /// The delivery error, if the invocation did not succeed.
    pub fn error(&self) -> Option<&DeliveryError> {
        self.error.as_ref()
    }
}

/// Summary of one dispatch pass.
///
/// Results appear in snapshot order (priority, then subscription order)
/// in both dispatch modes; in concurrent mode that ordering applies to
/// the report only, not to delivery timing.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    version: u64,
    results: Vec<DispatchResult>,
}

impl DispatchReport {
    pub(crate) fn new(version: u64, results: Vec<DispatchResult>) -> Self {
        Self { version, results }
    }

    /// Version of the update this pass delivered.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Per-target results in snapshot order.
    pub fn results(&self) -> &[DispatchResult] {
        &self.results
    }

    /// Number of targets the pass attempted (snapshot size).
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True if the snapshot was empty (nothing to deliver).
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of successful deliveries.
    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_delivered()).count()
    }

    /// Results that did not succeed, in snapshot order.
    pub fn failures(&self) -> impl Iterator<Item = &DispatchResult> {
        self.results.iter().filter(|r| !r.is_delivered())
    }

    /// True if every snapshotted target received the update.
    pub fn all_delivered(&self) -> bool {
        self.results.iter().all(|r| r.is_delivered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counters() {
        let ok = DispatchResult::delivered(SubscriptionId(1), Arc::from("a"));
        let bad = DispatchResult::failed(
            SubscriptionId(2),
            Arc::from("b"),
            DeliveryError::Failed { error: "x".into() },
        );
        let report = DispatchReport::new(3, vec![ok, bad]);

        assert_eq!(report.version(), 3);
        assert_eq!(report.len(), 2);
        assert_eq!(report.delivered_count(), 1);
        assert!(!report.all_delivered());
        let failed: Vec<&str> = report.failures().map(|r| r.name()).collect();
        assert_eq!(failed, vec!["b"]);
    }
}
