use concurrent_pool::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;
use std::thread;

fn benchmark_unbounded_push_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("unbounded");

    group.bench_function("push_fetch_1000", |b| {
        b.iter_batched(
            ConcurrentQueue::new,
            |queue| {
                for n in 0..1000 {
                    queue.push(black_box(n)).unwrap();
                }
                while queue.try_fetch().is_data() {}
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("emplace_1000", |b| {
        b.iter_batched(
            ConcurrentQueue::new,
            |queue| {
                for n in 0..1000u64 {
                    queue.emplace_with(|| black_box(n)).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_bounded_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded");

    group.bench_function("push_fetch_1000", |b| {
        b.iter_batched(
            || BoundedQueue::with_capacity(2000),
            |pool| {
                for n in 0..1000 {
                    pool.push(Handle::new(black_box(n))).unwrap();
                }
                while pool.try_fetch().is_data() {}
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("urgent_push_1000", |b| {
        b.iter_batched(
            || BoundedQueue::with_capacity(2000),
            |pool| {
                for n in 0..1000 {
                    pool.push_urgent(Handle::new(black_box(n))).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("batch_push_fetch_100x10", |b| {
        b.iter_batched(
            || BoundedQueue::with_capacity(2000),
            |pool| {
                for _ in 0..100 {
                    let batch: Vec<Handle<u64>> = (0..10).map(Handle::new).collect();
                    pool.push_batch(batch).unwrap();
                }
                let mut remaining = 100 * 10;
                while remaining > 0 {
                    remaining -= pool.fetch_batch(10).len();
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn benchmark_contended_pipeline(c: &mut Criterion) {
    c.bench_function("bounded_pipeline_2p2c_4000", |b| {
        b.iter(|| {
            let pool = Arc::new(BoundedQueue::with_capacity(64));

            let producers: Vec<_> = (0..2)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        for n in 0..2000u64 {
                            pool.push(Handle::new(n)).unwrap();
                        }
                    })
                })
                .collect();

            let consumers: Vec<_> = (0..2)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        let mut count = 0u64;
                        while pool.fetch().is_data() {
                            count += 1;
                        }
                        count
                    })
                })
                .collect();

            for producer in producers {
                producer.join().unwrap();
            }
            while !pool.is_empty() {
                thread::yield_now();
            }
            pool.close();

            let total: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();
            black_box(total);
        });
    });
}

criterion_group!(
    benches,
    benchmark_unbounded_push_fetch,
    benchmark_bounded_operations,
    benchmark_contended_pipeline
);
criterion_main!(benches);
