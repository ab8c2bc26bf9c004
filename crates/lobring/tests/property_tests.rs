//! Property tests for the ring's delivery guarantees.
//!
//! The ring promises two things to a single-threaded user:
//! - batches no larger than the capacity come out complete and in order;
//! - whatever interleaving of enqueues and reads happens, the reader never
//!   observes values out of sequence or twice (lapping may drop, never
//!   reorder or replay).

use lobring::pair;
use proptest::prelude::*;

proptest! {
    /// Batches within capacity survive intact, for every power-of-two size.
    #[test]
    fn batch_within_capacity_is_lossless(
        shift in 1u32..8,
        len in 1usize..256,
    ) {
        let capacity = 1usize << shift;
        let batch = len.min(capacity);
        let (mut tx, mut rx) = pair::<usize>(capacity);

        for i in 0..batch {
            tx.enqueue(i);
        }
        for i in 0..batch {
            prop_assert_eq!(rx.read_next(), Some(i));
        }
        prop_assert_eq!(rx.read_next(), None);
    }

    /// Under arbitrary enqueue/read interleavings the delivered subsequence is
    /// strictly increasing — drops are permitted, reordering and replays are
    /// not.
    #[test]
    fn interleaved_ops_never_reorder_or_replay(
        ops in prop::collection::vec(prop::bool::ANY, 1..400),
        shift in 1u32..5,
    ) {
        let (mut tx, mut rx) = pair::<u64>(1 << shift);
        let mut next_value = 0u64;
        let mut last_seen: Option<u64> = None;

        for is_enqueue in ops {
            if is_enqueue {
                tx.enqueue(next_value);
                next_value += 1;
            } else if let Some(v) = rx.read_next() {
                if let Some(prev) = last_seen {
                    prop_assert!(v > prev, "replayed or reordered: {} after {}", v, prev);
                }
                prop_assert!(v < next_value);
                last_seen = Some(v);
            }
        }

        // Drain; the tail must continue the strictly increasing sequence.
        while let Some(v) = rx.read_next() {
            if let Some(prev) = last_seen {
                prop_assert!(v > prev);
            }
            last_seen = Some(v);
        }
    }
}
