//! Ring throughput benchmarks: single-threaded slot cost and a two-thread
//! pump with the consumer keeping pace.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lobring::pair;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    for capacity in [8usize, 1024] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("enqueue_read", capacity),
            &capacity,
            |b, &capacity| {
                let (mut tx, mut rx) = pair::<u64>(capacity);
                let mut i = 0u64;
                b.iter(|| {
                    tx.enqueue(i);
                    i += 1;
                    rx.read_next()
                });
            },
        );
    }
    group.finish();
}

fn bench_two_threads(c: &mut Criterion) {
    const BATCH: u64 = 100_000;
    const CAPACITY: u64 = 1024;

    let mut group = c.benchmark_group("two_threads");
    group.throughput(Throughput::Elements(BATCH));
    group.bench_function("pump_100k", |b| {
        b.iter(|| {
            let consumed = Arc::new(AtomicU64::new(0));
            let (mut tx, mut rx) = pair::<u64>(CAPACITY as usize);

            let consumed_tx = Arc::clone(&consumed);
            let producer = thread::spawn(move || {
                for i in 0..BATCH {
                    while i - consumed_tx.load(Ordering::Acquire) >= CAPACITY {
                        std::hint::spin_loop();
                    }
                    tx.enqueue(i);
                }
            });

            let mut count = 0u64;
            while count < BATCH {
                if rx.read_next().is_some() {
                    count += 1;
                    consumed.store(count, Ordering::Release);
                } else {
                    std::hint::spin_loop();
                }
            }
            producer.join().unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_two_threads);
criterion_main!(benches);
