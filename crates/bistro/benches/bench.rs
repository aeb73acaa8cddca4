use bistro::{Counter, Dish, Position, TableRegistry};
use core::{hint::black_box, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::future::try_join_all;
use std::{sync::Arc, time::Instant};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

// Number of dishes handed across the counter per benchmark iteration.
const TOTAL_DISHES: usize = 4096;

/// Benchmarks the non-blocking path: fill the counter, then drain it.
fn bench_counter_try(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter/try");
    group.throughput(Throughput::Elements(TOTAL_DISHES as u64));

    for capacity in [1, 16, 256] {
        group.bench_function(format!("elems/{TOTAL_DISHES}/cap/{capacity}"), |b| {
            b.iter_custom(|iters| {
                let counter = Counter::new(capacity).unwrap();
                let start = Instant::now();

                for _ in 0..iters {
                    let mut id = 0_u64;
                    while (id as usize) < TOTAL_DISHES {
                        while (id as usize) < TOTAL_DISHES && counter.try_push(Dish::new(id, 1)).is_ok()
                        {
                            id += 1;
                        }
                        while let Some(dish) = counter.try_pop() {
                            black_box(dish);
                        }
                    }
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Benchmarks blocking push/pop on one Tokio thread, alternating.
fn bench_counter_sequential_async(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter/sequential/async");
    group.throughput(Throughput::Elements(TOTAL_DISHES as u64));

    group.bench_function(format!("elems/{TOTAL_DISHES}"), |b| {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .build()
            .unwrap();

        b.to_async(&rt).iter_custom(|iters| async move {
            let counter = Counter::new(1).unwrap();
            let token = CancellationToken::new();
            let start = Instant::now();

            for _ in 0..iters {
                for id in 0..TOTAL_DISHES as u64 {
                    counter.push(Dish::new(id, 1), &token).await.unwrap();
                    black_box(counter.pop(&token).await.unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks many cooks handing dishes to many waiters through one counter.
fn bench_counter_handoff_tokio(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter/handoff/async/tokio");
    group.sample_size(10);
    group.sampling_mode(criterion::SamplingMode::Flat);

    let total = TOTAL_DISHES * 64;

    for (workers, capacity) in [(1, 1), (1, 64), (4, 5), (4, 64), (16, 5), (16, 256)] {
        let per_worker = total / workers;

        group.throughput(Throughput::Elements(total as u64));
        group.bench_function(
            format!("elems/{total}/workers/{workers}/cap/{capacity}"),
            |b| {
                let rt = Builder::new_multi_thread().enable_all().build().unwrap();

                b.to_async(&rt).iter_custom(move |iters| async move {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let counter = Arc::new(Counter::new(capacity).unwrap());
                        let token = CancellationToken::new();
                        let mut tasks = Vec::with_capacity(workers * 2);

                        for cook in 1..=workers {
                            let counter = Arc::clone(&counter);
                            let token = token.clone();
                            tasks.push(tokio::spawn(async move {
                                for id in 0..per_worker as u64 {
                                    counter.push(Dish::new(id, cook), &token).await?;
                                }
                                Ok::<_, bistro::CounterError>(())
                            }));
                        }
                        for _ in 0..workers {
                            let counter = Arc::clone(&counter);
                            let token = token.clone();
                            tasks.push(tokio::spawn(async move {
                                for _ in 0..per_worker {
                                    black_box(counter.pop(&token).await?);
                                }
                                Ok(())
                            }));
                        }

                        for result in try_join_all(tasks).await.unwrap() {
                            result.unwrap();
                        }
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// Benchmarks a seat/serve/clear cycle across a full dining room.
fn bench_table_service(c: &mut Criterion) {
    let mut group = c.benchmark_group("tables/service");
    let layout: Vec<Position> = (0..64)
        .map(|i| Position::new(100.0 + 200.0 * (i % 8) as f64, 300.0 + 150.0 * (i / 8) as f64))
        .collect();
    group.throughput(Throughput::Elements(layout.len() as u64));

    group.bench_function(format!("tables/{}", layout.len()), |b| {
        let registry = TableRegistry::new(layout.clone(), Duration::from_secs(30));
        b.iter(|| {
            registry.add_customers(layout.len());
            for position in &layout {
                if let Some(visit) = registry.serve_near(*position, 10.0) {
                    black_box(registry.clear_visit(visit));
                }
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_counter_try,
    bench_counter_sequential_async,
    bench_counter_handoff_tokio,
    bench_table_service,
);
criterion_main!(benches);
