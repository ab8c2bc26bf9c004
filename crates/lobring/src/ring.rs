use crate::invariants::debug_assert_cursor_monotonic;
use crate::metrics::RingMetrics;
use crate::{MetricsSnapshot, SeqLockSlot};
use crossbeam_utils::CachePadded;
use std::sync::Arc;

/// Bounded ring of seqlock slots shared by exactly one producer and one
/// reader.
///
/// The ring itself holds no cursors: the producer owns its enqueue index and
/// the reader owns its read index plus the version threshold that suppresses
/// re-reads after wrap-around. With the cursors private there is no shared
/// write position to contend on — slots synchronize purely through their
/// version counters.
///
/// Capacity is a power of two so slot selection is a mask, and each slot is
/// padded to its own cacheline to keep the producer's store traffic off the
/// reader's lines.
pub struct SpscRing<T> {
    slots: Box<[CachePadded<SeqLockSlot<T>>]>,
    mask: usize,
    metrics: RingMetrics,
}

impl<T: Copy> SpscRing<T> {
    /// Creates a ring with `capacity` zeroed slots.
    ///
    /// # Panics
    /// If `capacity` is not a power of two or is smaller than 2.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two() && capacity >= 2,
            "ring capacity must be a power of two >= 2, got {capacity}"
        );
        let slots: Box<[CachePadded<SeqLockSlot<T>>]> = (0..capacity)
            .map(|_| CachePadded::new(SeqLockSlot::new()))
            .collect();
        Self {
            slots,
            mask: capacity - 1,
            metrics: RingMetrics::new(),
        }
    }

    /// Advisory traffic counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, index: i64) -> &SeqLockSlot<T> {
        &self.slots[(index as usize) & self.mask]
    }

    /// True when `index` addresses the last slot of the array.
    #[inline]
    fn is_last_slot(&self, index: i64) -> bool {
        (index as usize) & self.mask == self.mask
    }
}

/// Creates a connected producer/reader pair over a fresh ring.
pub fn pair<T: Copy + Send>(capacity: usize) -> (Producer<T>, Reader<T>) {
    let ring = Arc::new(SpscRing::with_capacity(capacity));
    let producer = Producer {
        ring: Arc::clone(&ring),
        enqueue_index: 0,
    };
    let reader = Reader {
        ring,
        read_index: 0,
        prev_version: 1,
    };
    (producer, reader)
}

/// Writing half of the ring.
///
/// Enqueueing is unconditional: when the producer laps a slow reader the
/// oldest entries are overwritten (drop-overwrite, never blocking). The
/// enqueue cursor is private to this handle and logically never wraps.
pub struct Producer<T> {
    ring: Arc<SpscRing<T>>,
    enqueue_index: i64,
}

impl<T: Copy + Send> Producer<T> {
    /// Publishes `value` into the next slot. Wait-free.
    #[inline]
    pub fn enqueue(&mut self, value: T) {
        self.ring.slot(self.enqueue_index).publish(value);
        self.ring.metrics.add_published();
        let next = self.enqueue_index + 1;
        debug_assert_cursor_monotonic!("enqueue_index", self.enqueue_index, next);
        self.enqueue_index = next;
    }

    /// Slots in the shared ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Advisory traffic counters of the shared ring.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

/// Reading half of the ring.
///
/// Deliberately not `Clone`: a second reader would corrupt the version
/// threshold bookkeeping, so single-consumer is enforced by construction.
pub struct Reader<T> {
    ring: Arc<SpscRing<T>>,
    read_index: i64,
    prev_version: i64,
}

impl<T: Copy + Send> Reader<T> {
    /// Pulls the next entry, or `None` when the current slot holds nothing
    /// newer than what was already consumed.
    ///
    /// On `None` the cursor and threshold stay put, so the caller simply
    /// retries later.
    pub fn read_next(&mut self) -> Option<T> {
        let (value, observed) = self.ring.slot(self.read_index).read(self.prev_version);
        if value.is_some() {
            self.ring.metrics.add_consumed();
            // When the position wraps, the next visit lands on a slot whose
            // version already passed the plain `>=` test during the previous
            // lap. Raising the threshold past the observed version keeps the
            // first slot of the array from being read twice.
            let next_version = if self.ring.is_last_slot(self.read_index) {
                observed + 2
            } else {
                observed
            };
            debug_assert_cursor_monotonic!("prev_version", self.prev_version, next_version);
            self.prev_version = next_version;
            self.read_index += 1;
        }
        value
    }

    /// Slots in the shared ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Advisory traffic counters of the shared ring.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring_reads_none() {
        let (_tx, mut rx) = pair::<u32>(4);
        assert_eq!(rx.read_next(), None);
        assert_eq!(rx.read_next(), None);
    }

    #[test]
    fn fifo_within_capacity() {
        let (mut tx, mut rx) = pair::<u32>(8);
        for i in 0..5 {
            tx.enqueue(i);
        }
        for i in 0..5 {
            assert_eq!(rx.read_next(), Some(i));
        }
        assert_eq!(rx.read_next(), None);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two() {
        let _ = SpscRing::<u8>::with_capacity(6);
    }
}
