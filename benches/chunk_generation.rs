//! Benchmarks the pure chunk-generation pipeline (spec §4.2) in isolation
//! from streaming/IO, across a plain chunk, a delta-heavy chunk, and an
//! underwater chunk, since terrain/structures/post-processing are the
//! steps actually run per-chunk on a worker thread (§5).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use voxel_world_engine::block::{BlockId, BlockRegistry};
use voxel_world_engine::coords::ChunkPos;
use voxel_world_engine::world::generation::generate;

fn bench_generate(c: &mut Criterion) {
    let registry = BlockRegistry::with_defaults();
    let empty_deltas = HashMap::new();

    let mut group = c.benchmark_group("chunk_generation");

    for &(cx, cz) in &[(0, 0), (10, 10), (0, -40)] {
        group.bench_with_input(BenchmarkId::new("generate", format!("{cx}_{cz}")), &(cx, cz), |b, &(cx, cz)| {
            b.iter(|| generate(ChunkPos::new(cx, cz), 42, &empty_deltas, &registry));
        });
    }

    let mut heavy_deltas = HashMap::new();
    for i in 0..256 {
        heavy_deltas.insert((i % 16, 60 + (i / 16), i % 16), BlockId::DIAMOND);
    }
    group.bench_function("generate_with_256_deltas", |b| {
        b.iter(|| generate(ChunkPos::new(1, 1), 42, &heavy_deltas, &registry));
    });

    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
