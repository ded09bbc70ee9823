//! Drop id derivation benchmarks
//!
//! Measures the SHA-256 derivation pipeline for single ids and batches.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cistern_benchmarks::BENCH_ENTROPY;
use cistern_core::{derive_batch, derive_drop_id};

fn derivation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivation");

    group.bench_function("single_id", |b| {
        b.iter(|| derive_drop_id(std::hint::black_box(0), 42, BENCH_ENTROPY))
    });

    for amount in [1u32, 10, 100, 1000] {
        group.throughput(Throughput::Elements(u64::from(amount)));
        group.bench_with_input(BenchmarkId::new("batch", amount), &amount, |b, &amount| {
            b.iter(|| derive_batch(amount, 42, BENCH_ENTROPY))
        });
    }

    group.finish();
}

criterion_group!(benches, derivation_benchmarks);
criterion_main!(benches);
