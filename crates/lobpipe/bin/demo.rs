//! End-to-end demo: a scripted feed with seeded depth, crossing orders and a
//! garbage frame, pumped through the ring into the book.
//!
//! Run with: `RUST_LOG=debug cargo run --bin demo`

use lobbook::OrderBook;
use lobpipe::run_to_completion;
use lobwire::{MockFeed, MockFrame, OrderMessage, DELIMITER};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn scripted_tape() -> Vec<MockFrame> {
    let mut tape = Vec::new();

    // Ten levels of depth on each side of a 100 mid.
    for i in 0..10 {
        tape.push(MockFrame::Message(OrderMessage::AddLimit {
            volume: 1000,
            price: 101 + i,
        }));
        tape.push(MockFrame::Message(OrderMessage::AddLimit {
            volume: -1000,
            price: 99 - i,
        }));
    }

    // A buy sweep, a sell sweep, and a withdrawal.
    tape.push(MockFrame::Message(OrderMessage::Market { volume: -3500 }));
    tape.push(MockFrame::Message(OrderMessage::Market { volume: 1200 }));
    tape.push(MockFrame::Message(OrderMessage::WithdrawLimit {
        volume: -1000,
        price: 95,
    }));

    // Line noise: a delimited frame with a length no kind matches.
    let mut garbage = Vec::new();
    garbage.extend_from_slice(&20u32.to_le_bytes());
    garbage.extend_from_slice(&DELIMITER.to_le_bytes());
    garbage.extend_from_slice(&[0xAA; 14]);
    tape.push(MockFrame::Raw(garbage));

    // A marketable limit order after the noise.
    tape.push(MockFrame::Message(OrderMessage::AddLimit {
        volume: -2000,
        price: 105,
    }));

    tape
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let book = OrderBook::new(0, 1000);
    let feed = MockFeed::from_frames(scripted_tape());

    let summary = run_to_completion(feed, &book, 1024, |execution| {
        info!(
            price = execution.price,
            volume = execution.volume,
            revenue = execution.revenue,
            "execution"
        );
    })
    .expect("demo feed never fails");

    let (bid, ask) = book.best_bid_ask();
    info!(
        published = summary.producer.published,
        discarded = summary.producer.discarded,
        applied = summary.consumer.applied,
        executions = summary.consumer.executions,
        best_bid = ?bid,
        best_ask = ?ask,
        "pipeline finished"
    );
}
