//! Framed decoder: pulls one well-formed message at a time off a byte
//! source, resynchronizing on the delimiter and validating the trailing
//! checksum.

use crate::messages::{
    byte_sum, checksum_from_ascii, ADD_LIMIT_MSG_LENGTH, CHECKSUM_LENGTH, DELIMITER,
    DELIMITER_OFFSET, HEADER_LENGTH, LENGTH_OFFSET, MARKET_MSG_LENGTH, MAX_MSG_LENGTH,
    MIN_MSG_LENGTH, WITHDRAW_LIMIT_MSG_LENGTH,
};
use crate::{ByteSource, OrderMessage, WireError};

/// Heap frame buffer, cacheline-aligned and sized to the longest kind.
#[repr(align(64))]
struct FrameBuffer([u8; MAX_MSG_LENGTH]);

/// Decoder over a blocking byte source.
///
/// One call to [`read_next`] consumes exactly one frame from the stream (or
/// as many bytes as it takes to find one). Recoverable defects — lost
/// delimiter, bad checksum, oversized or unknown-length frames — yield
/// `Ok(None)`; only a failing source is an error.
///
/// [`read_next`]: FrameDecoder::read_next
pub struct FrameDecoder<S> {
    source: S,
    buf: Box<FrameBuffer>,
}

impl<S: ByteSource> FrameDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: Box::new(FrameBuffer([0; MAX_MSG_LENGTH])),
        }
    }

    /// Consumes the decoder and hands the source back.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Reads the next frame and decodes it.
    ///
    /// Returns `Ok(Some(..))` for a well-formed frame, `Ok(None)` for a
    /// frame that was dropped (checksum mismatch, unknown or oversized
    /// length), and `Err` only when the source fails.
    pub fn read_next(&mut self) -> Result<Option<OrderMessage>, WireError> {
        self.source.recv(&mut self.buf.0[..HEADER_LENGTH])?;
        let mut live = HEADER_LENGTH;

        if self.buf.0[DELIMITER_OFFSET..DELIMITER_OFFSET + 2] != DELIMITER.to_le_bytes() {
            live = self.resync()?;
        }

        let msg_len = u32::from_le_bytes(
            self.buf.0[LENGTH_OFFSET..LENGTH_OFFSET + 4].try_into().unwrap(),
        ) as usize;

        if msg_len > MAX_MSG_LENGTH {
            // Longer than any kind we know: consume the remainder of the
            // frame to stay in sync, then drop it.
            self.drain_excess(msg_len - live)?;
            return Ok(None);
        }
        if msg_len > live {
            self.source.recv(&mut self.buf.0[live..msg_len])?;
        }

        if !matches!(
            msg_len,
            ADD_LIMIT_MSG_LENGTH | WITHDRAW_LIMIT_MSG_LENGTH | MARKET_MSG_LENGTH
        ) {
            return Ok(None);
        }

        let frame = &self.buf.0[..msg_len];
        let declared = checksum_from_ascii(&frame[msg_len - CHECKSUM_LENGTH..]);
        if byte_sum(&frame[..msg_len - CHECKSUM_LENGTH]) != declared {
            return Ok(None);
        }

        Ok(OrderMessage::from_frame(frame))
    }

    /// Scans forward for the next delimiter after a header check failed.
    ///
    /// Keeps the buffer topped up to the shortest frame length and looks for
    /// the delimiter at any position with a complete length prefix before
    /// it. Returns the number of frame bytes now live at the front of the
    /// buffer. Loops until a delimiter appears — bounded only by the
    /// producer of the stream.
    fn resync(&mut self) -> Result<usize, WireError> {
        // Drop the first byte; the remaining header bytes may still prefix a
        // frame whose delimiter we have not seen yet.
        self.buf.0.copy_within(1..HEADER_LENGTH, 0);
        let mut have = HEADER_LENGTH - 1;
        loop {
            self.source.recv(&mut self.buf.0[have..MIN_MSG_LENGTH])?;
            have = MIN_MSG_LENGTH;

            if let Some(pos) = find_delimiter(&self.buf.0[..have]) {
                let start = pos - DELIMITER_OFFSET;
                self.buf.0.copy_within(start..have, 0);
                return Ok(have - start);
            }

            // Keep the tail: a delimiter and its length prefix may straddle
            // the refill boundary.
            let keep = HEADER_LENGTH - 1;
            self.buf.0.copy_within(have - keep..have, 0);
            have = keep;
        }
    }

    /// Discards `excess` stream bytes through the buffer's scratch tail.
    fn drain_excess(&mut self, mut excess: usize) -> Result<(), WireError> {
        while excess > 0 {
            let n = excess.min(MAX_MSG_LENGTH - HEADER_LENGTH);
            self.source.recv(&mut self.buf.0[HEADER_LENGTH..HEADER_LENGTH + n])?;
            excess -= n;
        }
        Ok(())
    }
}

/// First position carrying the delimiter with room for a length prefix
/// before it and the second delimiter byte after it.
#[inline]
fn find_delimiter(window: &[u8]) -> Option<usize> {
    (DELIMITER_OFFSET..window.len().saturating_sub(1))
        .find(|&p| window[p..p + 2] == DELIMITER.to_le_bytes())
}
