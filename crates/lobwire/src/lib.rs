//! lobwire — framed binary order messages and a resynchronizing decoder.
//!
//! Three fixed-layout message kinds share a single header shape (length
//! field, two-byte delimiter) and differ only in total frame length, which is
//! the dispatch key. The decoder reads exactly one frame per call from a
//! blocking [`ByteSource`], recovering from lost delimiters by scanning
//! forward, and drops frames with bad checksums or unknown lengths without
//! surfacing an error.
//!
//! # Example
//!
//! ```
//! use lobwire::{FrameDecoder, MockFeed, OrderMessage};
//!
//! let feed = MockFeed::from_messages(&[
//!     OrderMessage::AddLimit { volume: -11, price: 111 },
//!     OrderMessage::Market { volume: 33 },
//! ]);
//! let mut decoder = FrameDecoder::new(feed);
//!
//! assert_eq!(
//!     decoder.read_next().unwrap(),
//!     Some(OrderMessage::AddLimit { volume: -11, price: 111 })
//! );
//! assert_eq!(decoder.read_next().unwrap(), Some(OrderMessage::Market { volume: 33 }));
//! assert!(decoder.read_next().is_err()); // feed drained
//! ```

mod decoder;
mod error;
mod messages;
mod mock;
mod source;

pub use decoder::FrameDecoder;
pub use error::WireError;
pub use messages::{
    OrderMessage, ADD_LIMIT_MSG_LENGTH, CHECKSUM_LENGTH, DELIMITER, DELIMITER_OFFSET,
    HEADER_LENGTH, LENGTH_OFFSET, MARKET_MSG_LENGTH, MAX_MSG_LENGTH, MIN_MSG_LENGTH,
    PRICE_OFFSET, VOLUME_OFFSET, WITHDRAW_FILLER, WITHDRAW_FILLER_OFFSET,
    WITHDRAW_LIMIT_MSG_LENGTH,
};
pub use mock::{MockFeed, MockFrame};
pub use source::ByteSource;
