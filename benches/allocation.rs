//! Benchmarks for worker allocation and pool handoff
//!
//! Run with: cargo bench

use channel_scaling::pipeline::{
    Allocator, CountingSourceStep, DelayStep, Item, NullRecorder, Sink, Source, SourceStep,
    WorkerPool,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

fn bench_allocator_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator_plan");
    let allocator = Allocator::new(vec![2, 1, 20, 4]).unwrap();

    for budget in [4, 64, 1024].iter() {
        group.throughput(Throughput::Elements(*budget as u64));
        group.bench_with_input(BenchmarkId::from_parameter(budget), budget, |b, &budget| {
            b.iter(|| black_box(allocator.plan(black_box(budget))));
        });
    }

    group.finish();
}

fn bench_pool_lease(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_lease");
    group.throughput(Throughput::Elements(1));

    let pool = WorkerPool::new("bench", 20, || DelayStep::new(Duration::ZERO));
    for _ in 0..4 {
        pool.scale_up().unwrap();
    }

    group.bench_function("acquire_exec_recycle", |b| {
        let mut id = 0;
        b.iter(|| {
            let mut lease = pool.acquire().unwrap();
            id += 1;
            black_box(lease.exec(Item::new(id)))
        });
    });

    group.finish();
}

fn bench_counting_source(c: &mut Criterion) {
    c.bench_function("counting_source_exec", |b| {
        let mut step = CountingSourceStep::new();
        b.iter(|| black_box(step.exec()));
    });
}

fn bench_source_to_sink(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_to_sink");

    for items in [100u64, 1000].iter() {
        group.throughput(Throughput::Elements(*items));
        group.bench_with_input(BenchmarkId::from_parameter(items), items, |b, &items| {
            b.iter(|| {
                let mut source =
                    Source::new("Stage 0", CountingSourceStep::new, Arc::new(NullRecorder));
                source.set_limit(items);
                let sink = Sink::new(
                    "Stage 1",
                    || DelayStep::new(Duration::ZERO),
                    Arc::new(NullRecorder),
                )
                .unwrap();
                let input = source.out();
                let done = sink.done();

                std::thread::scope(|scope| {
                    scope.spawn(move || source.run(done));
                    black_box(sink.run(input))
                })
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_allocator_plan,
    bench_pool_lease,
    bench_counting_source,
    bench_source_to_sink,
);

criterion_main!(benches);
