use lobbook::OrderBook;
use lobring::{pair, Backoff, Producer, Reader};
use lobwire::{ByteSource, FrameDecoder, OrderMessage, WireError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, error, info};

/// One reported trade: the order's last fill price, its signed filled
/// volume, and the signed revenue of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Execution {
    pub price: u32,
    pub volume: i64,
    pub revenue: i64,
}

/// Counters from the decode-and-publish side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Frames decoded and enqueued.
    pub published: u64,
    /// Frames dropped by the decoder (bad checksum, unknown or oversized
    /// length).
    pub discarded: u64,
}

/// Counters from the book side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Orders applied to the book.
    pub applied: u64,
    /// Orders that produced a trade execution.
    pub executions: u64,
    /// Orders flagged for pricing outside the book window.
    pub out_of_range: u64,
}

/// Joint result of a completed pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub producer: ProducerStats,
    pub consumer: ConsumerStats,
}

/// Producer loop: pull frames off the decoder and publish them to the ring.
///
/// Runs until the stop flag is raised or the source reaches a clean end of
/// stream. Malformed frames are counted and skipped. Any other source
/// failure is fatal and propagates.
pub fn run_producer<S: ByteSource>(
    mut decoder: FrameDecoder<S>,
    mut tx: Producer<OrderMessage>,
    stop: &AtomicBool,
) -> Result<ProducerStats, WireError> {
    let mut stats = ProducerStats::default();
    while !stop.load(Ordering::Acquire) {
        match decoder.read_next() {
            Ok(Some(order)) => {
                tx.enqueue(order);
                stats.published += 1;
            }
            Ok(None) => {
                stats.discarded += 1;
                debug!(discarded = stats.discarded, "dropped malformed frame");
            }
            Err(err) if err.is_end_of_stream() => {
                info!(published = stats.published, discarded = stats.discarded, "feed ended");
                break;
            }
            Err(err) => {
                error!(error = %err, "byte source failed, tearing the pipeline down");
                return Err(err);
            }
        }
    }
    Ok(stats)
}

/// Consumer loop: drain the ring into the book, reporting executions.
///
/// Polls with adaptive backoff. Once `done` is raised by the producer, one
/// final drain empties whatever was published before the flag and the loop
/// exits.
pub fn run_consumer(
    mut rx: Reader<OrderMessage>,
    book: &OrderBook,
    done: &AtomicBool,
    mut on_execution: impl FnMut(Execution),
) -> ConsumerStats {
    let mut stats = ConsumerStats::default();
    let mut backoff = Backoff::new();
    loop {
        if let Some(order) = rx.read_next() {
            backoff.reset();
            apply(book, order, &mut stats, &mut on_execution);
            continue;
        }
        if done.load(Ordering::Acquire) {
            // Everything published happens-before the done flag; this drain
            // cannot miss an entry.
            while let Some(order) = rx.read_next() {
                apply(book, order, &mut stats, &mut on_execution);
            }
            break;
        }
        backoff.snooze();
    }
    info!(
        applied = stats.applied,
        executions = stats.executions,
        out_of_range = stats.out_of_range,
        "consumer drained"
    );
    stats
}

fn apply(
    book: &OrderBook,
    order: OrderMessage,
    stats: &mut ConsumerStats,
    on_execution: &mut impl FnMut(Execution),
) {
    let outcome = book.process_order(order);
    stats.applied += 1;
    if outcome.out_of_range() {
        stats.out_of_range += 1;
    }
    // Withdrawals report removed volume through the same field; only limit
    // and market fills are trades.
    let traded =
        !matches!(order, OrderMessage::WithdrawLimit { .. }) && outcome.filled_volume != 0;
    if traded {
        stats.executions += 1;
        on_execution(Execution {
            price: outcome.exec_price,
            volume: outcome.filled_volume,
            revenue: outcome.revenue,
        });
    }
}

/// Drives a source through a fresh ring into `book` until the stream ends.
///
/// The producer runs on a scoped thread; the consumer runs on the calling
/// thread. A fatal source error stops both sides and propagates.
pub fn run_to_completion<S: ByteSource + Send>(
    source: S,
    book: &OrderBook,
    ring_capacity: usize,
    mut on_execution: impl FnMut(Execution),
) -> Result<PipelineSummary, WireError> {
    let (tx, rx) = pair::<OrderMessage>(ring_capacity);
    let decoder = FrameDecoder::new(source);
    let stop = AtomicBool::new(false);
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let stop_ref = &stop;
        let done_ref = &done;
        let producer = scope.spawn(move || {
            let result = run_producer(decoder, tx, stop_ref);
            done_ref.store(true, Ordering::Release);
            result
        });

        let consumer = run_consumer(rx, book, &done, &mut on_execution);
        let producer = producer.join().expect("producer thread panicked")?;
        Ok(PipelineSummary {
            producer,
            consumer,
        })
    })
}
