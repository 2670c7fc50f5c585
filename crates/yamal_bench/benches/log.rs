//! Append log benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use yamal_bench::{append, fresh_log, pattern_data};

/// Benchmark single-threaded reserve + commit.
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for size in [16, 64, 256, 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let data = pattern_data(size);
            b.iter_custom(|iters| {
                let (_dir, log) = fresh_log(iters, size);
                let start = Instant::now();
                for _ in 0..iters {
                    append(&log, black_box(&data));
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmark commits racing from several threads on one handle.
fn bench_contended_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_append");
    group.sample_size(20);

    for threads in [2usize, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            threads,
            |b, &threads| {
                let data = pattern_data(64);
                b.iter_custom(|iters| {
                    let per_thread = iters / threads as u64 + 1;
                    let (_dir, log) = fresh_log(per_thread * threads as u64, data.len());
                    let log = Arc::new(log);
                    let start = Instant::now();
                    let handles: Vec<_> = (0..threads)
                        .map(|_| {
                            let log = Arc::clone(&log);
                            let data = data.clone();
                            thread::spawn(move || {
                                for _ in 0..per_thread {
                                    append(&log, &data);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// Benchmark forward and backward traversal.
fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("traverse");
    let count = 100_000u64;
    let data = pattern_data(64);
    let (_dir, log) = fresh_log(count, data.len());
    for _ in 0..count {
        append(&log, &data);
    }

    group.throughput(Throughput::Elements(count));
    group.bench_function("forward", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for entry in log.records(log.begin()) {
                bytes += entry.unwrap().1.data.len();
            }
            black_box(bytes);
        });
    });

    group.bench_function("backward", |b| {
        b.iter(|| {
            let mut it = log.end().unwrap();
            let mut visited = 0u64;
            while it != log.begin() {
                it = log.prev(it).unwrap();
                visited += 1;
            }
            black_box(visited);
        });
    });

    group.finish();
}

/// Benchmark resuming from a persisted offset.
fn bench_seek(c: &mut Criterion) {
    let data = pattern_data(64);
    let (_dir, log) = fresh_log(1000, data.len());
    let mut offsets = Vec::new();
    let mut it = log.begin();
    for _ in 0..1000 {
        append(&log, &data);
        offsets.push(log.tell(it));
        it = log.next(it).unwrap();
    }

    c.bench_function("seek_read", |b| {
        let mut i = 0;
        b.iter(|| {
            let it = log.seek(black_box(offsets[i % offsets.len()])).unwrap();
            black_box(log.read(it).unwrap());
            i += 1;
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_append, bench_contended_append, bench_traverse, bench_seek
}
criterion_main!(benches);
