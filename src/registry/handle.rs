//! Subscription identity: id, priority, and the FIFO tiebreak.

/// Unique id of one subscription within its registry.
///
/// Ids are assigned from a per-registry monotonic counter, so within one
/// registry a smaller id always means an earlier subscription. That makes
/// the id double as the FIFO tiebreak for equal priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric value, for logs and metrics keys.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle identifying one subscription.
///
/// Returned by `subscribe`; pass it back to `unsubscribe` to remove the
/// subscription. The handle exposes identity and priority only - delivery
/// always goes through the subject's dispatcher, never through a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub(crate) id: SubscriptionId,
    pub(crate) priority: i32,
}

impl Handle {
    /// Unique subscription id within the owning registry.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Delivery priority; lower values are delivered earlier, ties broken
    /// by subscription order.
    pub fn priority(&self) -> i32 {
        self.priority
    }
}
