//! Decoder throughput over a pre-rendered cycled tape.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use lobwire::{FrameDecoder, MockFeed, OrderMessage};

fn mixed_tape(frames: usize) -> Vec<OrderMessage> {
    (0..frames)
        .map(|i| match i % 3 {
            0 => OrderMessage::AddLimit {
                volume: i as i32 % 512 - 256,
                price: 100 + (i as u32 % 40),
            },
            1 => OrderMessage::WithdrawLimit {
                volume: i as i32 % 128,
                price: 100 + (i as u32 % 40),
            },
            _ => OrderMessage::Market {
                volume: i as i32 % 64 - 32,
            },
        })
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");
    group.throughput(Throughput::Elements(1));
    group.bench_function("read_next_mixed", |b| {
        let mut decoder = FrameDecoder::new(MockFeed::from_messages(&mixed_tape(1024)).cycled());
        b.iter(|| decoder.read_next().unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
