//! lobpipe — the two-thread ingestion and matching pipeline.
//!
//! Wires the stack together: a producer thread decodes framed order messages
//! from a byte source and publishes them through a seqlock SPSC ring; the
//! consumer thread applies them to the price-bucketed order book and reports
//! trade executions. Observers on any other thread may read the book's
//! versioned snapshots concurrently.
//!
//! ```text
//! byte source -> FrameDecoder -> ring (lobring) -> OrderBook -> executions
//!    (producer thread)                     (consumer thread)
//! ```
//!
//! Termination is cooperative: the producer watches a stop flag between
//! frames and treats a drained source as a clean end of stream. Only a
//! failing byte source tears the pipeline down.
//!
//! # Example
//!
//! ```
//! use lobbook::OrderBook;
//! use lobpipe::run_to_completion;
//! use lobwire::{MockFeed, OrderMessage};
//!
//! let feed = MockFeed::from_messages(&[
//!     OrderMessage::AddLimit { volume: 500, price: 105 },
//!     OrderMessage::AddLimit { volume: -500, price: 95 },
//! ]);
//! let book = OrderBook::new(0, 1000);
//! let summary = run_to_completion(feed, &book, 1024, |_| {}).unwrap();
//!
//! assert_eq!(summary.producer.published, 2);
//! assert_eq!(book.best_bid_ask(), (Some(95), Some(105)));
//! ```

mod pipeline;

pub use pipeline::{
    run_consumer, run_producer, run_to_completion, ConsumerStats, Execution, PipelineSummary,
    ProducerStats,
};
