//! Order-message kinds and their fixed wire layout.
//!
//! All three kinds share one header shape and differ only in total length,
//! which is what the decoder dispatches on. Multi-byte fields are
//! little-endian.
//!
//! ```text
//! Offset | Size | Field
//! -------|------|---------------------------------------------
//!  0     |  4   | msg_length (u32, includes header + checksum)
//!  4     |  2   | delimiter 0xEB50
//!  6     |  4   | order_volume (i32, sign = side)
//! 10     |  4   | order_price (u32; absent for market orders)
//! L-3    |  3   | ASCII-decimal byte sum of bytes [0, L-3) mod 256
//! ```
//!
//! Sign convention: positive volume is supply (sell side), negative volume is
//! demand (buy side), for resting liquidity and incoming orders alike.

/// Offset of the `msg_length` field.
pub const LENGTH_OFFSET: usize = 0;
/// Offset of the two delimiter bytes.
pub const DELIMITER_OFFSET: usize = 4;
/// Frame delimiter, stored little-endian.
pub const DELIMITER: u16 = 0xEB50;
/// Bytes of header shared by every kind.
pub const HEADER_LENGTH: usize = 6;
/// Offset of the signed volume field.
pub const VOLUME_OFFSET: usize = 6;
/// Offset of the price field (limit kinds only).
pub const PRICE_OFFSET: usize = 10;
/// Trailing ASCII-decimal checksum length.
pub const CHECKSUM_LENGTH: usize = 3;

/// Total frame length of an add-limit message.
pub const ADD_LIMIT_MSG_LENGTH: usize = 17;
/// Total frame length of a withdraw-limit message.
pub const WITHDRAW_LIMIT_MSG_LENGTH: usize = 18;
/// Total frame length of a market message.
pub const MARKET_MSG_LENGTH: usize = 13;

/// Filler byte distinguishing withdraw frames from add frames by length.
pub const WITHDRAW_FILLER_OFFSET: usize = 14;
pub const WITHDRAW_FILLER: u8 = 0xFF;

/// Longest frame across all kinds; sizes the decoder buffer.
pub const MAX_MSG_LENGTH: usize = WITHDRAW_LIMIT_MSG_LENGTH;
/// Shortest frame across all kinds; paces the resynchronization scan.
pub const MIN_MSG_LENGTH: usize = MARKET_MSG_LENGTH;

// Frame lengths are the dispatch key, so they must be pairwise distinct and
// must leave room for a payload past the shared header.
const _: () = {
    assert!(ADD_LIMIT_MSG_LENGTH != WITHDRAW_LIMIT_MSG_LENGTH);
    assert!(ADD_LIMIT_MSG_LENGTH != MARKET_MSG_LENGTH);
    assert!(WITHDRAW_LIMIT_MSG_LENGTH != MARKET_MSG_LENGTH);
    assert!(ADD_LIMIT_MSG_LENGTH > HEADER_LENGTH);
    assert!(WITHDRAW_LIMIT_MSG_LENGTH > HEADER_LENGTH);
    assert!(MARKET_MSG_LENGTH > HEADER_LENGTH);
    assert!(DELIMITER_OFFSET + 2 <= HEADER_LENGTH);
    assert!(MIN_MSG_LENGTH >= HEADER_LENGTH + CHECKSUM_LENGTH);
};

/// One decoded order message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderMessage {
    /// Rest (or cross) limit liquidity at `price`.
    AddLimit { volume: i32, price: u32 },
    /// Remove previously rested liquidity at `price`.
    WithdrawLimit { volume: i32, price: u32 },
    /// Consume liquidity at any price; negative volume buys, positive sells.
    Market { volume: i32 },
}

impl OrderMessage {
    /// Signed order volume.
    #[inline]
    pub fn volume(&self) -> i32 {
        match *self {
            Self::AddLimit { volume, .. }
            | Self::WithdrawLimit { volume, .. }
            | Self::Market { volume } => volume,
        }
    }

    /// Limit price, absent for market orders.
    #[inline]
    pub fn price(&self) -> Option<u32> {
        match *self {
            Self::AddLimit { price, .. } | Self::WithdrawLimit { price, .. } => Some(price),
            Self::Market { .. } => None,
        }
    }

    /// Total wire length of this kind's frame.
    pub fn frame_len(&self) -> usize {
        match self {
            Self::AddLimit { .. } => ADD_LIMIT_MSG_LENGTH,
            Self::WithdrawLimit { .. } => WITHDRAW_LIMIT_MSG_LENGTH,
            Self::Market { .. } => MARKET_MSG_LENGTH,
        }
    }

    /// Appends this message's complete frame, checksum included, to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        let len = self.frame_len();
        out.extend_from_slice(&(len as u32).to_le_bytes());
        out.extend_from_slice(&DELIMITER.to_le_bytes());
        out.extend_from_slice(&self.volume().to_le_bytes());
        match *self {
            Self::AddLimit { price, .. } => {
                out.extend_from_slice(&price.to_le_bytes());
            }
            Self::WithdrawLimit { price, .. } => {
                out.extend_from_slice(&price.to_le_bytes());
                out.push(WITHDRAW_FILLER);
            }
            Self::Market { .. } => {}
        }
        let sum = byte_sum(&out[start..]);
        out.extend_from_slice(&checksum_digits(sum));
        debug_assert_eq!(out.len() - start, len);
    }

    /// Reconstructs a message from a frame whose length already matched one
    /// of the known kinds. Returns `None` for any other length.
    pub(crate) fn from_frame(frame: &[u8]) -> Option<Self> {
        let volume = i32::from_le_bytes(
            frame[VOLUME_OFFSET..VOLUME_OFFSET + 4].try_into().unwrap(),
        );
        match frame.len() {
            ADD_LIMIT_MSG_LENGTH => Some(Self::AddLimit {
                volume,
                price: read_price(frame),
            }),
            WITHDRAW_LIMIT_MSG_LENGTH => Some(Self::WithdrawLimit {
                volume,
                price: read_price(frame),
            }),
            MARKET_MSG_LENGTH => Some(Self::Market { volume }),
            _ => None,
        }
    }
}

#[inline]
fn read_price(frame: &[u8]) -> u32 {
    u32::from_le_bytes(frame[PRICE_OFFSET..PRICE_OFFSET + 4].try_into().unwrap())
}

/// Byte sum mod 256 of `bytes`.
#[inline]
pub(crate) fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Renders `sum` as the three trailing ASCII decimal digits.
#[inline]
pub(crate) fn checksum_digits(sum: u8) -> [u8; CHECKSUM_LENGTH] {
    [
        sum / 100 + b'0',
        (sum % 100) / 10 + b'0',
        sum % 10 + b'0',
    ]
}

/// Decodes the trailing digits back to a byte sum. No digit validation: a
/// corrupted trailer simply fails the comparison, exactly like a corrupted
/// body.
#[inline]
pub(crate) fn checksum_from_ascii(digits: &[u8]) -> u8 {
    digits[0]
        .wrapping_sub(b'0')
        .wrapping_mul(100)
        .wrapping_add(digits[1].wrapping_sub(b'0').wrapping_mul(10))
        .wrapping_add(digits[2].wrapping_sub(b'0'))
}
