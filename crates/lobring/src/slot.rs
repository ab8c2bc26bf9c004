use crate::invariants::{debug_assert_quiescent, debug_assert_reader_threshold};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{fence, AtomicI64, AtomicU8, AtomicUsize, Ordering};

// =============================================================================
// SEQLOCK SLOT PROTOCOL
// =============================================================================
//
// Each slot pairs a payload with a version counter. The counter is even while
// the slot is quiescent and odd while a write is in flight; every completed
// write raises it by exactly 2.
//
// **Writer (publish):**
// 1. Store `version + 1` (odd) with Relaxed — only the producer writes it
// 2. Release fence — orders the flag ahead of the payload stores
// 3. Copy the payload in with Relaxed word/byte atomic stores
// 4. Store `version + 2` (even) with Release — publishes the payload
//
// **Reader (read):**
// 1. Load `version` with Acquire, retry while odd
// 2. Copy the payload out with Relaxed word/byte atomic loads
// 3. Acquire fence, re-load `version`, retry if it moved
// 4. Hand the copy out only if the observed version reaches the caller's
//    threshold; otherwise report the slot as already-consumed
//
// ## Why the payload copy goes through atomics
//
// The reader copies while the writer may be mid-store. A plain `ptr::copy`
// under that race is undefined behavior in Rust no matter how benign the torn
// bytes are, because the version check that would discard them happens *after*
// the copy. Routing every byte through relaxed atomic operations makes the
// race defined; the seqlock validation then rejects any torn result.
//
// ## Version threshold
//
// `read` takes the version the caller last accepted. A slot whose version is
// below that threshold holds data the caller has already consumed (or nothing
// at all — fresh slots sit at version 0 against an initial threshold of 1).
// The comparison is `observed >= threshold`: equality accepts a neighbouring
// slot written in the same producer lap, which carries the same version as
// the one just consumed but has never been read.
//
// =============================================================================

const WORD: usize = std::mem::size_of::<usize>();

/// Payload storage, over-aligned so word-sized atomic accesses stay aligned
/// even when `T` itself is narrower.
#[repr(align(8))]
struct PayloadCell<T>(UnsafeCell<MaybeUninit<T>>);

/// A single seqlock-versioned cell.
///
/// The producer overwrites the payload in place; readers validate their copy
/// against the version counter and retry on interference. Values must be
/// `Copy` — the slot is overwritten without dropping its previous content.
pub struct SeqLockSlot<T> {
    version: AtomicI64,
    payload: PayloadCell<T>,
}

// Safety: all shared access to `payload` goes through relaxed atomic
// word/byte operations guarded by the version protocol above.
unsafe impl<T: Copy + Send> Send for SeqLockSlot<T> {}
unsafe impl<T: Copy + Send> Sync for SeqLockSlot<T> {}

impl<T: Copy> SeqLockSlot<T> {
    /// Creates a quiescent slot at version 0 with zeroed payload bytes.
    ///
    /// Zeroing matters: it lets the first concurrent read copy initialized
    /// memory even before the first publish (the version guard then discards
    /// the copy without materializing a `T`).
    pub fn new() -> Self {
        Self {
            version: AtomicI64::new(0),
            payload: PayloadCell(UnsafeCell::new(MaybeUninit::zeroed())),
        }
    }

    /// Publishes `value`, overwriting whatever the slot held.
    ///
    /// Must only be called from the single producer thread.
    pub fn publish(&self, value: T) {
        let v = self.version.load(Ordering::Relaxed);
        debug_assert_quiescent!(v);

        self.version.store(v + 1, Ordering::Relaxed);
        fence(Ordering::Release);
        // SAFETY: the producer is the only writer; readers access these bytes
        // exclusively through the matching relaxed atomic loads.
        unsafe {
            atomic_store_bytes(self.payload.0.get().cast::<u8>(), &value);
        }
        self.version.store(v + 2, Ordering::Release);
    }

    /// Attempts to read the slot, treating versions below `threshold` as
    /// already-consumed.
    ///
    /// Returns the payload (if fresh) and the version observed, which the
    /// caller feeds back as the next threshold.
    pub fn read(&self, threshold: i64) -> (Option<T>, i64) {
        debug_assert_reader_threshold!(threshold);
        loop {
            let v0 = self.version.load(Ordering::Acquire);
            if v0 & 1 == 1 {
                // write in flight
                std::hint::spin_loop();
                continue;
            }
            // SAFETY: relaxed atomic loads mirror the writer's atomic stores;
            // a torn copy is discarded by the version re-check below.
            let copy = unsafe { atomic_load_bytes::<T>(self.payload.0.get().cast::<u8>()) };
            fence(Ordering::Acquire);
            let v1 = self.version.load(Ordering::Relaxed);
            if v0 != v1 {
                continue;
            }
            if v0 >= threshold {
                // SAFETY: v0 >= threshold >= 1 means at least one publish
                // completed before our validated copy, so `copy` holds the
                // bytes of a fully written `T`.
                return (Some(unsafe { copy.assume_init() }), v0);
            }
            return (None, v0);
        }
    }

    /// Version counter as last published (test support).
    #[cfg(test)]
    pub(crate) fn version(&self) -> i64 {
        self.version.load(Ordering::Acquire)
    }
}

impl<T: Copy> Default for SeqLockSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `*src` into `dst` through relaxed atomic stores, word-sized where
/// possible and byte-sized for the tail.
///
/// # Safety
/// `dst` must point to at least `size_of::<T>()` bytes, aligned to `WORD`,
/// and every concurrent access to those bytes must also be atomic.
unsafe fn atomic_store_bytes<T>(dst: *mut u8, src: &T) {
    let src = (src as *const T).cast::<u8>();
    let len = std::mem::size_of::<T>();
    let words = len / WORD;
    for i in 0..words {
        let chunk = src.add(i * WORD).cast::<usize>().read_unaligned();
        (*dst.add(i * WORD).cast::<AtomicUsize>()).store(chunk, Ordering::Relaxed);
    }
    for i in (words * WORD)..len {
        (*dst.add(i).cast::<AtomicU8>()).store(*src.add(i), Ordering::Relaxed);
    }
}

/// Copies `size_of::<T>()` bytes out of `src` through relaxed atomic loads.
///
/// # Safety
/// `src` must point to at least `size_of::<T>()` initialized bytes, aligned
/// to `WORD`, and every concurrent access to those bytes must also be atomic.
unsafe fn atomic_load_bytes<T>(src: *const u8) -> MaybeUninit<T> {
    let mut out = MaybeUninit::<T>::uninit();
    let dst = out.as_mut_ptr().cast::<u8>();
    let len = std::mem::size_of::<T>();
    let words = len / WORD;
    for i in 0..words {
        let chunk = (*src.add(i * WORD).cast::<AtomicUsize>()).load(Ordering::Relaxed);
        dst.add(i * WORD).cast::<usize>().write_unaligned(chunk);
    }
    for i in (words * WORD)..len {
        let byte = (*src.add(i).cast::<AtomicU8>()).load(Ordering::Relaxed);
        dst.add(i).write(byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_read_returns_value() {
        let slot = SeqLockSlot::<u64>::new();
        slot.publish(7);
        let (value, observed) = slot.read(1);
        assert_eq!(value, Some(7));
        assert_eq!(observed, 2);
    }

    #[test]
    fn unwritten_slot_reads_absent() {
        let slot = SeqLockSlot::<u64>::new();
        let (value, observed) = slot.read(1);
        assert_eq!(value, None);
        assert_eq!(observed, 0);
    }

    #[test]
    fn threshold_suppresses_reread() {
        let slot = SeqLockSlot::<u32>::new();
        slot.publish(11);
        let (_, observed) = slot.read(1);
        // Same write again, threshold above the observed version.
        let (value, _) = slot.read(observed + 2);
        assert_eq!(value, None);
    }

    #[test]
    fn equal_threshold_accepts() {
        // A neighbouring slot written in the same lap carries the same
        // version as the one just consumed — it must still be handed out.
        let slot = SeqLockSlot::<u32>::new();
        slot.publish(3);
        let (value, _) = slot.read(2);
        assert_eq!(value, Some(3));
    }

    #[test]
    fn overwrite_advances_version_by_two() {
        let slot = SeqLockSlot::<(i32, i32)>::new();
        slot.publish((1, 2));
        slot.publish((3, 4));
        assert_eq!(slot.version(), 4);
        let (value, observed) = slot.read(1);
        assert_eq!(value, Some((3, 4)));
        assert_eq!(observed, 4);
    }

    #[test]
    fn odd_sized_payloads_round_trip() {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        struct Odd([u8; 13]);
        let slot = SeqLockSlot::<Odd>::new();
        let v = Odd([0xAB; 13]);
        slot.publish(v);
        assert_eq!(slot.read(1).0, Some(v));
    }
}
