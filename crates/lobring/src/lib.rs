//! lobring — seqlock SPSC ring for market-data fan-in.
//!
//! A bounded single-producer single-consumer ring whose slots carry a seqlock
//! version counter instead of sharing head/tail cursors. The producer is
//! wait-free and never blocks: lapping a slow consumer overwrites the oldest
//! entries. The consumer tracks the highest version it has accepted, which
//! lets it skip already-consumed slots after the position wraps.
//!
//! # Key properties
//!
//! - Wait-free producer (no backpressure, drop-overwrite on lap)
//! - No shared cursors — slots synchronize through per-slot versions
//! - One slot per cacheline; producer and reader state on disjoint lines
//! - Payload copies go through relaxed atomics, so concurrent read/write of a
//!   slot is defined behavior and torn copies are discarded by validation
//!
//! # Example
//!
//! ```
//! let (mut tx, mut rx) = lobring::pair::<u64>(8);
//!
//! tx.enqueue(42);
//! tx.enqueue(43);
//!
//! assert_eq!(rx.read_next(), Some(42));
//! assert_eq!(rx.read_next(), Some(43));
//! assert_eq!(rx.read_next(), None);
//! ```

mod backoff;
mod invariants;
mod metrics;
mod ring;
mod slot;

pub use backoff::Backoff;
pub use metrics::MetricsSnapshot;
pub use ring::{pair, Producer, Reader, SpscRing};
pub use slot::SeqLockSlot;
