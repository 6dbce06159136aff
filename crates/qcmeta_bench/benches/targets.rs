//! Target index benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use qcmeta_bench::populated_index;
use qcmeta_core::{CollectionId, PartitionId, SegmentId};

/// Benchmark flat membership checks.
fn bench_contains(c: &mut Criterion) {
    let index = populated_index(8, 4, 256);

    c.bench_function("contains_segment", |b| {
        let mut id = 0i64;
        b.iter(|| {
            id = (id + 7919) % 8192;
            black_box(index.contains_segment(SegmentId::new(id)));
        });
    });

    c.bench_function("contains_dm_channel", |b| {
        b.iter(|| black_box(index.contains_dm_channel(black_box("5-dmc1"))));
    });
}

/// Benchmark hierarchical listings by collection size.
fn bench_listing(c: &mut Criterion) {
    let mut group = c.benchmark_group("segments_by_collection");

    for per_partition in [16, 256, 2048].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(per_partition),
            per_partition,
            |b, &per_partition| {
                let index = populated_index(4, 4, per_partition);
                b.iter(|| black_box(index.get_segments_by_collection(CollectionId::new(2))));
            },
        );
    }

    group.finish();
}

/// Benchmark cascading removals.
fn bench_cascade(c: &mut Criterion) {
    c.bench_function("remove_collection", |b| {
        b.iter_batched(
            || populated_index(4, 4, 256),
            |index| index.remove_collection(CollectionId::new(1)),
            BatchSize::LargeInput,
        );
    });

    c.bench_function("remove_partition", |b| {
        b.iter_batched(
            || populated_index(4, 4, 256),
            |index| index.remove_partition(PartitionId::new(5)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_contains, bench_listing, bench_cascade);
criterion_main!(benches);
