//! lobbook — price-bucketed limit order book with versioned readers.
//!
//! The book is a contiguous window of signed-volume buckets keyed by
//! absolute price: negative volume is resting demand (bids), positive is
//! resting supply (offers). One writer at a time applies orders and window
//! shifts under a spin lock; any number of readers snapshot the top of book
//! or a single level lock-free through a seqlock version counter.
//!
//! Incoming orders use the same sign language as the buckets: negative
//! volume buys (consumes offers), positive volume sells (consumes bids).
//!
//! # Example
//!
//! ```
//! use lobbook::OrderBook;
//! use lobwire::OrderMessage;
//!
//! let book = OrderBook::new(0, 1000);
//! book.process_order(OrderMessage::AddLimit { volume: 1000, price: 101 });
//! book.process_order(OrderMessage::AddLimit { volume: -1000, price: 99 });
//!
//! assert_eq!(book.best_bid_ask(), (Some(99), Some(101)));
//!
//! // A market buy for 300 lifts the offer at 101.
//! let outcome = book.process_order(OrderMessage::Market { volume: -300 });
//! assert_eq!(outcome.exec_price, 101);
//! assert_eq!(outcome.filled_volume, -300);
//! assert_eq!(book.volume_at_price(101), 700);
//! ```

mod book;
mod bucket;
mod response;

pub use book::OrderBook;
pub use bucket::Bucket;
pub use response::{OrderOutcome, FLAG_PRICE_OUT_OF_RANGE};
