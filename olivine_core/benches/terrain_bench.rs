use cgmath::vec2;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use olivine_core::noise::GradientNoise;
use olivine_core::terrain::{
    regenerate, OctaveNoiseGenerator, OctaveSet, OutOfExtentPolicy, TerrainChunkStore,
    TerrainExtent,
};
use olivine_core::Terrain;

fn noise_benchmarks(c: &mut Criterion) {
    let noise = GradientNoise::new(0);
    let mut x = 0.0;
    c.bench_function("noise_sample", |b| {
        b.iter(|| {
            x += 0.37;
            noise.sample(black_box(vec2(x, -x * 0.5)), 16.0)
        })
    });
}

fn terrain_benchmarks(c: &mut Criterion) {
    let generator = OctaveNoiseGenerator::new(GradientNoise::new(0), OctaveSet::default());
    let mut store = TerrainChunkStore::new();

    c.bench_function("regenerate_5x5_default_octaves", |b| {
        b.iter(|| regenerate(&mut store, TerrainExtent::new(5, 5), &generator))
    });

    let mut terrain = Terrain::new(
        TerrainChunkStore::new(),
        generator,
        TerrainExtent::new(16, 16),
        OutOfExtentPolicy::DefaultZero,
    )
    .unwrap();
    let mut z = 0.0;
    c.bench_function("height_query", |b| {
        b.iter(|| {
            z = (z + 1.3) % 120.0;
            terrain.height_at(black_box(vec2(z - 60.0, 60.0 - z)))
        })
    });
}

criterion_group!(benches, noise_benchmarks, terrain_benchmarks);
criterion_main!(benches);
