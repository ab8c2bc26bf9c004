use crate::bucket::Bucket;
use crate::response::{OrderOutcome, FLAG_PRICE_OUT_OF_RANGE};
use crossbeam_utils::CachePadded;
use lobwire::OrderMessage;
use std::sync::atomic::{fence, AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};

// =============================================================================
// CONCURRENCY PROTOCOL
// =============================================================================
//
// The book has exactly one writer at a time (enforced by `write_lock`) and
// any number of lock-free readers. Writers bracket every mutation in an
// odd/even flip of `version`; readers copy what they need, then re-check the
// counter and retry if a write overlapped.
//
// All mutable fields are atomics accessed with Relaxed ordering inside the
// bracket; the Acquire/Release pairs on `version` (plus the fences) order
// them. Compiler-only fences would do on x86, where hardware orders stores;
// the acquire/release pairs keep the protocol sound on weaker machines too.
//
// `write_lock`, `version` and the bucket array live on separate cachelines so
// reader traffic on the counter does not bounce the writer's data lines.
//
// =============================================================================

/// Absent-price sentinel inside the four stat cells.
const STAT_ABSENT: u64 = u64::MAX;

#[inline]
fn load_stat(cell: &AtomicU64) -> Option<u32> {
    match cell.load(Ordering::Relaxed) {
        STAT_ABSENT => None,
        v => Some(v as u32),
    }
}

#[inline]
fn store_stat(cell: &AtomicU64, value: Option<u32>) {
    cell.store(value.map_or(STAT_ABSENT, u64::from), Ordering::Relaxed);
}

/// Price-bucketed order book over a movable window of absolute prices.
///
/// Bucket `i` holds the aggregate signed volume at price `base_price + i`:
/// negative volume is resting demand (bids), positive is resting supply
/// (offers). Four tracked prices describe the occupied range — `best_bid`
/// (highest bid) down to `lowest_bid`, `best_offer` (lowest offer) up to
/// `highest_offer` — and each is present exactly when its side has
/// liquidity.
///
/// Incoming order volume uses the same sign language: negative volume buys
/// (consumes offers), positive sells (consumes bids).
pub struct OrderBook {
    /// Absolute price of bucket index 0; moves only in `shift_book`.
    base_price: AtomicU32,
    /// Highest resting bid price.
    best_bid: AtomicU64,
    /// Lowest resting bid price.
    lowest_bid: AtomicU64,
    /// Lowest resting offer price.
    best_offer: AtomicU64,
    /// Highest resting offer price.
    highest_offer: AtomicU64,
    /// Single-writer exclusion flag.
    write_lock: CachePadded<AtomicBool>,
    /// Seqlock counter: even = quiescent, odd = mutation in flight.
    version: CachePadded<AtomicI64>,
    buckets: Box<[Bucket]>,
}

/// RAII spin lock over the writer flag.
struct WriteLock<'a> {
    book: &'a OrderBook,
}

impl<'a> WriteLock<'a> {
    fn acquire(book: &'a OrderBook) -> Self {
        while book.write_lock.swap(true, Ordering::Acquire) {
            std::hint::spin_loop();
        }
        Self { book }
    }
}

impl Drop for WriteLock<'_> {
    fn drop(&mut self) {
        self.book.write_lock.store(false, Ordering::Release);
    }
}

/// RAII odd/even version window; open while a mutation is in flight.
struct MutationWindow<'a> {
    book: &'a OrderBook,
    base: i64,
}

impl<'a> MutationWindow<'a> {
    fn open(book: &'a OrderBook) -> Self {
        let base = book.version.load(Ordering::Relaxed);
        debug_assert!(base & 1 == 0, "mutation window opened while one is in flight");
        book.version.store(base + 1, Ordering::Relaxed);
        fence(Ordering::Release);
        Self { book, base }
    }
}

impl Drop for MutationWindow<'_> {
    fn drop(&mut self) {
        self.book.version.store(self.base + 2, Ordering::Release);
    }
}

impl OrderBook {
    /// Creates an empty book of `length` zeroed buckets starting at
    /// `base_price`.
    ///
    /// # Panics
    /// If `length` is zero or the window would run past `u32::MAX`.
    pub fn new(base_price: u32, length: u32) -> Self {
        assert!(length > 0, "book length must be non-zero");
        assert!(
            u64::from(base_price) + u64::from(length) - 1 <= u64::from(u32::MAX),
            "book window exceeds the price domain"
        );
        let buckets: Box<[Bucket]> = (0..length).map(|_| Bucket::new()).collect();
        Self {
            base_price: AtomicU32::new(base_price),
            best_bid: AtomicU64::new(STAT_ABSENT),
            lowest_bid: AtomicU64::new(STAT_ABSENT),
            best_offer: AtomicU64::new(STAT_ABSENT),
            highest_offer: AtomicU64::new(STAT_ABSENT),
            write_lock: CachePadded::new(AtomicBool::new(false)),
            version: CachePadded::new(AtomicI64::new(0)),
            buckets,
        }
    }

    /// Number of price buckets in the window.
    #[inline]
    pub fn length(&self) -> u32 {
        self.buckets.len() as u32
    }

    // -------------------------------------------------------------------
    // WRITER OPERATIONS
    // -------------------------------------------------------------------

    /// Applies one order and returns its outcome. Thread-safe: concurrent
    /// callers serialize on the writer flag.
    pub fn process_order(&self, order: OrderMessage) -> OrderOutcome {
        // Uniform dispatch: place the order in its slot of the 3-tuple and
        // run every handler; the two absent kinds see zero volume and return
        // the zero outcome.
        let ((add_vol, add_price), (wd_vol, wd_price), market_vol) = split_order(order);

        let _lock = WriteLock::acquire(self);
        let _window = MutationWindow::open(self);

        let mut outcome = self.handle_new_limit(add_vol, add_price);
        outcome += self.handle_withdraw_limit(wd_vol, wd_price);
        outcome += self.handle_market(market_vol);
        outcome
    }

    /// Moves the window by `delta` absolute prices, preserving all resting
    /// liquidity. Returns false (and changes nothing) when the move would
    /// push the base below zero or slide occupied buckets off the edge.
    pub fn shift_book(&self, delta: i32) -> bool {
        let _lock = WriteLock::acquire(self);

        let base = self.base_price.load(Ordering::Relaxed);
        let length = self.length();
        let lowest_occupied = load_stat(&self.lowest_bid).or(load_stat(&self.best_offer));
        let highest_occupied = load_stat(&self.highest_offer).or(load_stat(&self.best_bid));
        let empty = lowest_occupied.is_none();

        let feasible = if delta >= 0 {
            let up = delta as u32;
            let top_ok = u64::from(base) + u64::from(up) + u64::from(length) - 1
                <= u64::from(u32::MAX);
            top_ok && (empty || lowest_occupied.unwrap() - base >= up)
        } else {
            let down = delta.unsigned_abs();
            let top = u64::from(base) + u64::from(length) - 1;
            base >= down
                && (empty || top - u64::from(highest_occupied.unwrap()) >= u64::from(down))
        };
        if !feasible {
            return false;
        }

        let _window = MutationWindow::open(self);
        if !empty {
            if delta >= 0 {
                self.slide_left(delta as usize);
            } else {
                self.slide_right(delta.unsigned_abs() as usize);
            }
        }
        let new_base = if delta >= 0 {
            base + delta as u32
        } else {
            base - delta.unsigned_abs()
        };
        self.base_price.store(new_base, Ordering::Relaxed);
        true
    }

    // -------------------------------------------------------------------
    // READER OPERATIONS (lock-free)
    // -------------------------------------------------------------------

    /// Snapshot of (best bid, best offer).
    pub fn best_bid_ask(&self) -> (Option<u32>, Option<u32>) {
        self.read_consistent(|| (load_stat(&self.best_bid), load_stat(&self.best_offer)))
    }

    /// Aggregate signed volume at `price`; 0 outside the window.
    pub fn volume_at_price(&self, price: u32) -> i64 {
        self.read_consistent(|| {
            let base = self.base_price.load(Ordering::Relaxed);
            if price >= base && u64::from(price - base) < u64::from(self.length()) {
                self.buckets[(price - base) as usize].volume()
            } else {
                0
            }
        })
    }

    /// Runs `read` until it executes without overlapping a mutation window.
    fn read_consistent<R>(&self, read: impl Fn() -> R) -> R {
        loop {
            let v0 = self.version.load(Ordering::Acquire);
            if v0 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let snapshot = read();
            fence(Ordering::Acquire);
            if self.version.load(Ordering::Relaxed) == v0 {
                return snapshot;
            }
        }
    }

    // -------------------------------------------------------------------
    // ORDER HANDLERS (write lock held)
    // -------------------------------------------------------------------

    fn handle_new_limit(&self, volume: i64, price: u32) -> OrderOutcome {
        if volume == 0 {
            return OrderOutcome::default();
        }
        if !self.in_range(price) {
            return OrderOutcome {
                flags: FLAG_PRICE_OUT_OF_RANGE,
                ..OrderOutcome::default()
            };
        }

        let buy = volume < 0;
        let marketable = if buy {
            load_stat(&self.best_offer).is_some_and(|best| price >= best)
        } else {
            load_stat(&self.best_bid).is_some_and(|best| price <= best)
        };

        let outcome = if marketable {
            self.run_through_book(volume)
        } else {
            OrderOutcome::default()
        };

        let residual = volume - outcome.filled_volume;
        if residual != 0 {
            self.bucket_at(price).add_liquidity(residual);
            if residual < 0 {
                store_stat(
                    &self.best_bid,
                    Some(load_stat(&self.best_bid).map_or(price, |p| p.max(price))),
                );
                store_stat(
                    &self.lowest_bid,
                    Some(load_stat(&self.lowest_bid).map_or(price, |p| p.min(price))),
                );
            } else {
                store_stat(
                    &self.best_offer,
                    Some(load_stat(&self.best_offer).map_or(price, |p| p.min(price))),
                );
                store_stat(
                    &self.highest_offer,
                    Some(load_stat(&self.highest_offer).map_or(price, |p| p.max(price))),
                );
            }
        }
        outcome
    }

    fn handle_withdraw_limit(&self, volume: i64, price: u32) -> OrderOutcome {
        if volume == 0 {
            return OrderOutcome::default();
        }
        if !self.in_range(price) {
            return OrderOutcome {
                flags: FLAG_PRICE_OUT_OF_RANGE,
                ..OrderOutcome::default()
            };
        }

        let bucket = self.bucket_at(price);
        let withdrawn = bucket.consume_liquidity(volume);
        if bucket.volume() == 0 {
            self.reanchor_after_withdraw(price);
        }
        OrderOutcome {
            exec_price: 0,
            filled_volume: withdrawn,
            revenue: 0,
            flags: 0,
        }
    }

    fn handle_market(&self, volume: i64) -> OrderOutcome {
        if volume == 0 {
            return OrderOutcome::default();
        }
        self.run_through_book(volume)
    }

    /// Matching pass: walks the opposite side from its best price toward its
    /// far endpoint, draining buckets until the order is filled or the side
    /// is exhausted.
    fn run_through_book(&self, volume: i64) -> OrderOutcome {
        debug_assert_ne!(volume, 0);
        let buy = volume < 0;
        let (start, end) = if buy {
            (load_stat(&self.best_offer), load_stat(&self.highest_offer))
        } else {
            (load_stat(&self.best_bid), load_stat(&self.lowest_bid))
        };
        let (Some(start), Some(end)) = (start, end) else {
            // Nothing on the opposite side: the pass is a no-op.
            return OrderOutcome::default();
        };

        let base = self.base_price.load(Ordering::Relaxed);
        let step: i64 = if buy { 1 } else { -1 };
        let mut open = volume;
        let mut revenue = 0i64;
        let mut exec_price = 0u32;
        let mut price = i64::from(start);
        loop {
            let bucket = &self.buckets[(price as u32 - base) as usize];
            // The request is expressed in the resting side's sign; the
            // transfer narrows `open` toward zero.
            let filled = bucket.consume_liquidity(-open);
            if filled != 0 {
                exec_price = price as u32;
                revenue += -filled * price;
                open += filled;
            }
            if open == 0 || price == i64::from(end) {
                break;
            }
            price += step;
        }

        // Re-anchor the consumed side's best price: first liquid bucket from
        // the old best toward the old extreme, or the whole side is gone.
        if buy {
            match self.find_liquid_bucket(start, end) {
                Some(p) => store_stat(&self.best_offer, Some(p)),
                None => {
                    store_stat(&self.best_offer, None);
                    store_stat(&self.highest_offer, None);
                }
            }
        } else {
            match self.find_liquid_bucket(start, end) {
                Some(p) => store_stat(&self.best_bid, Some(p)),
                None => {
                    store_stat(&self.best_bid, None);
                    store_stat(&self.lowest_bid, None);
                }
            }
        }

        OrderOutcome {
            exec_price,
            filled_volume: volume - open,
            revenue,
            flags: 0,
        }
    }

    /// Recomputes whichever of the four tracked prices was anchored at a
    /// just-emptied bucket, scanning inward toward its side's other
    /// endpoint. A side with no liquid bucket left loses both its stats.
    fn reanchor_after_withdraw(&self, price: u32) {
        if load_stat(&self.best_bid) == Some(price) {
            let lowest = load_stat(&self.lowest_bid).unwrap_or(price);
            match self.find_liquid_bucket(price, lowest) {
                Some(p) => store_stat(&self.best_bid, Some(p)),
                None => {
                    store_stat(&self.best_bid, None);
                    store_stat(&self.lowest_bid, None);
                }
            }
        }
        if load_stat(&self.lowest_bid) == Some(price) {
            let best = load_stat(&self.best_bid).unwrap_or(price);
            match self.find_liquid_bucket(price, best) {
                Some(p) => store_stat(&self.lowest_bid, Some(p)),
                None => {
                    store_stat(&self.best_bid, None);
                    store_stat(&self.lowest_bid, None);
                }
            }
        }
        if load_stat(&self.best_offer) == Some(price) {
            let highest = load_stat(&self.highest_offer).unwrap_or(price);
            match self.find_liquid_bucket(price, highest) {
                Some(p) => store_stat(&self.best_offer, Some(p)),
                None => {
                    store_stat(&self.best_offer, None);
                    store_stat(&self.highest_offer, None);
                }
            }
        }
        if load_stat(&self.highest_offer) == Some(price) {
            let best = load_stat(&self.best_offer).unwrap_or(price);
            match self.find_liquid_bucket(price, best) {
                Some(p) => store_stat(&self.highest_offer, Some(p)),
                None => {
                    store_stat(&self.best_offer, None);
                    store_stat(&self.highest_offer, None);
                }
            }
        }
    }

    /// First price with a non-zero bucket scanning inclusively from `start`
    /// toward `end` (either direction).
    fn find_liquid_bucket(&self, start: u32, end: u32) -> Option<u32> {
        let base = self.base_price.load(Ordering::Relaxed);
        let step: i64 = if end >= start { 1 } else { -1 };
        let mut price = i64::from(start);
        loop {
            if self.buckets[(price as u32 - base) as usize].volume() != 0 {
                return Some(price as u32);
            }
            if price == i64::from(end) {
                return None;
            }
            price += step;
        }
    }

    // -------------------------------------------------------------------
    // HELPERS
    // -------------------------------------------------------------------

    #[inline]
    fn in_range(&self, price: u32) -> bool {
        let base = self.base_price.load(Ordering::Relaxed);
        price >= base && u64::from(price - base) < u64::from(self.length())
    }

    #[inline]
    fn bucket_at(&self, price: u32) -> &Bucket {
        let base = self.base_price.load(Ordering::Relaxed);
        &self.buckets[(price - base) as usize]
    }

    /// Window moved up: bucket contents move toward index 0.
    fn slide_left(&self, by: usize) {
        let len = self.buckets.len();
        for i in 0..len - by {
            self.buckets[i].set(self.buckets[i + by].volume());
        }
        for bucket in &self.buckets[len - by..] {
            bucket.set(0);
        }
    }

    /// Window moved down: bucket contents move toward the top.
    fn slide_right(&self, by: usize) {
        let len = self.buckets.len();
        for i in (by..len).rev() {
            self.buckets[i].set(self.buckets[i - by].volume());
        }
        for bucket in &self.buckets[..by] {
            bucket.set(0);
        }
    }
}

fn split_order(order: OrderMessage) -> ((i64, u32), (i64, u32), i64) {
    match order {
        OrderMessage::AddLimit { volume, price } => ((volume.into(), price), (0, 0), 0),
        OrderMessage::WithdrawLimit { volume, price } => ((0, 0), (volume.into(), price), 0),
        OrderMessage::Market { volume } => ((0, 0), (0, 0), volume.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    impl OrderBook {
        /// Full-state coherence check: the stat-pairing, sign-layout and
        /// non-crossed invariants that must hold whenever the version is
        /// even.
        fn assert_coherent(&self) {
            assert_eq!(self.version.load(Ordering::Acquire) & 1, 0);

            let base = self.base_price.load(Ordering::Relaxed);
            let best_bid = load_stat(&self.best_bid);
            let lowest_bid = load_stat(&self.lowest_bid);
            let best_offer = load_stat(&self.best_offer);
            let highest_offer = load_stat(&self.highest_offer);

            assert_eq!(best_bid.is_some(), lowest_bid.is_some());
            assert_eq!(best_offer.is_some(), highest_offer.is_some());
            if let (Some(bb), Some(lb)) = (best_bid, lowest_bid) {
                assert!(lb <= bb);
                assert!(self.bucket_at(bb).volume() < 0, "best_bid bucket sign");
                assert!(self.bucket_at(lb).volume() < 0, "lowest_bid bucket sign");
            }
            if let (Some(bo), Some(ho)) = (best_offer, highest_offer) {
                assert!(bo <= ho);
                assert!(self.bucket_at(bo).volume() > 0, "best_offer bucket sign");
                assert!(self.bucket_at(ho).volume() > 0, "highest_offer bucket sign");
            }
            if let (Some(bb), Some(bo)) = (best_bid, best_offer) {
                assert!(bb < bo, "book is crossed: bid {bb} >= offer {bo}");
            }

            for (i, bucket) in self.buckets.iter().enumerate() {
                let price = base + i as u32;
                let vol = bucket.volume();
                let in_bids = matches!((lowest_bid, best_bid), (Some(lo), Some(hi)) if price >= lo && price <= hi);
                let in_offers = matches!((best_offer, highest_offer), (Some(lo), Some(hi)) if price >= lo && price <= hi);
                if in_bids {
                    assert!(vol <= 0, "positive volume {vol} inside bid range at {price}");
                } else if in_offers {
                    assert!(vol >= 0, "negative volume {vol} inside offer range at {price}");
                } else {
                    assert_eq!(vol, 0, "stray volume {vol} outside occupied range at {price}");
                }
            }
        }
    }

    #[test]
    fn randomized_message_storm_keeps_invariants() {
        let book = OrderBook::new(0, 256);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20_000 {
            let price = rng.gen_range(0u32..280); // occasionally out of range
            let volume = loop {
                let v = rng.gen_range(-60i32..=60);
                if v != 0 {
                    break v;
                }
            };
            let order = match rng.gen_range(0u8..4) {
                0 | 1 => OrderMessage::AddLimit { volume, price },
                2 => OrderMessage::WithdrawLimit { volume, price },
                _ => OrderMessage::Market {
                    volume: volume * 10,
                },
            };
            book.process_order(order);
            book.assert_coherent();
        }
    }

    #[test]
    fn randomized_storm_with_shifts_keeps_invariants() {
        let book = OrderBook::new(500, 128);
        let mut rng = StdRng::seed_from_u64(7);

        for step in 0..10_000 {
            if step % 97 == 0 {
                let delta = rng.gen_range(-40i32..=40);
                book.shift_book(delta);
            } else {
                let base = 480 + rng.gen_range(0u32..170);
                let volume = rng.gen_range(-30i32..=30);
                book.process_order(OrderMessage::AddLimit {
                    volume,
                    price: base,
                });
            }
            book.assert_coherent();
        }
    }
}
