use std::sync::atomic::{AtomicI64, Ordering};

/// One price level: aggregate signed volume.
///
/// Positive volume is resting supply (offers), negative is resting demand
/// (bids). A bucket never holds both sides at once — the matching engine
/// consumes opposing liquidity before any residual is stored, so the sign is
/// the side.
///
/// Stored as an atomic so seqlock readers can snapshot a level while the
/// single writer mutates; all operations here use relaxed ordering, the
/// book's version counter carries the synchronization.
#[derive(Debug, Default)]
pub struct Bucket {
    volume: AtomicI64,
}

impl Bucket {
    pub fn new() -> Self {
        Self {
            volume: AtomicI64::new(0),
        }
    }

    /// Current aggregate volume.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.volume.load(Ordering::Relaxed)
    }

    /// Adds `volume` unchecked; the book maintains the side invariants.
    #[inline]
    pub fn add_liquidity(&self, volume: i64) {
        let current = self.volume.load(Ordering::Relaxed);
        self.volume.store(current + volume, Ordering::Relaxed);
    }

    /// Drains up to `request` from the bucket, returning the signed volume
    /// actually transferred (in the request's direction).
    ///
    /// Works for both callers: a withdrawal passes a request with the same
    /// sign as the resting volume, the matching pass a request expressed in
    /// the resting side's sign as well — and an opposite-signed request
    /// transfers symmetrically. An empty bucket transfers nothing.
    pub fn consume_liquidity(&self, request: i64) -> i64 {
        let volume = self.volume.load(Ordering::Relaxed);
        if volume == 0 || request == 0 {
            return 0;
        }
        let transferred = if volume.signum() == request.signum() {
            let take = if request.abs() <= volume.abs() {
                request
            } else {
                volume
            };
            self.volume.store(volume - take, Ordering::Relaxed);
            take
        } else {
            let take = if request.abs() <= volume.abs() {
                request
            } else {
                -volume
            };
            self.volume.store(volume + take, Ordering::Relaxed);
            take
        };
        transferred
    }

    /// Overwrites the level (used when the book window shifts).
    #[inline]
    pub(crate) fn set(&self, volume: i64) {
        self.volume.store(volume, Ordering::Relaxed);
    }
}
