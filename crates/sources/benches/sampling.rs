//! Benchmarks for the random path
//!
//! Run with: cargo bench --package sources
//!
//! Samples from a synthetic 20k-artwork catalog with growing exclusion
//! sets, including the nearly exhausted case where rejection draws miss.

use catalog::{Artwork, CatalogIndex, CatalogStore};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sources::{CatalogSampler, ViewerContext};
use std::sync::Arc;

const CATALOG_SIZE: usize = 20_000;

fn synthetic_catalog() -> Arc<dyn CatalogStore> {
    let artworks = (0..CATALOG_SIZE)
        .map(|i| {
            Artwork::new(
                format!("art-{i}"),
                format!("Painting {i}"),
                format!("Artist {}", i % 300),
                format!("https://images.example/{i}.jpg"),
            )
        })
        .collect();
    Arc::new(CatalogIndex::from_artworks(artworks).expect("synthetic catalog"))
}

fn bench_sample_with_exclusions(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let sampler = CatalogSampler::new(synthetic_catalog());

    let mut group = c.benchmark_group("catalog_sample");
    for excluded in [0, CATALOG_SIZE / 2, CATALOG_SIZE - 10] {
        let context = ViewerContext::new("bench-user")
            .with_excluded((0..excluded).map(|i| format!("art-{i}")));

        group.bench_with_input(BenchmarkId::from_parameter(excluded), &context, |b, context| {
            b.iter(|| {
                let sampled = runtime.block_on(sampler.sample(black_box(context)));
                black_box(sampled)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sample_with_exclusions);
criterion_main!(benches);
