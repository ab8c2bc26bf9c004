use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared traffic counters for one ring.
///
/// Producer and consumer each bump their own cacheline-padded counter with
/// relaxed stores; snapshots are advisory (the two counters are not sampled
/// atomically together) and meant for monitoring, not control flow.
#[derive(Debug, Default)]
pub(crate) struct RingMetrics {
    published: CachePadded<AtomicU64>,
    consumed: CachePadded<AtomicU64>,
}

impl RingMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_published(&self) {
        let n = self.published.load(Ordering::Relaxed);
        self.published.store(n + 1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_consumed(&self) {
        let n = self.consumed.load(Ordering::Relaxed);
        self.consumed.store(n + 1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of ring traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Entries the producer has published.
    pub published: u64,
    /// Entries the reader has accepted.
    pub consumed: u64,
}

impl MetricsSnapshot {
    /// Published entries not (yet) consumed. With the drop-overwrite policy
    /// this includes entries that were lapped and will never arrive.
    #[inline]
    pub fn backlog(&self) -> u64 {
        self.published.saturating_sub(self.consumed)
    }
}
