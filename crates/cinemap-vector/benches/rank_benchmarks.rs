//! Benchmarks for exact similarity ranking.
//!
//! Ranking is a full linear scan, so cost grows with catalog size. The
//! default run uses 2,000 movies; set `BENCH_FULL_SCALE=1` for 50,000.
//!
//! ```bash
//! BENCH_FULL_SCALE=1 cargo bench -p cinemap-vector
//! ```

use std::collections::HashSet;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use cinemap_core::types::{Movie, MovieId, StoredMovie};
use cinemap_vector::catalog::CatalogSnapshot;
use cinemap_vector::codec::encode_embedding;
use cinemap_vector::embedding::{EmbeddingService, MockEmbedding};
use cinemap_vector::ranker::SimilarityRanker;
use cinemap_vector::search::SearchEngine;

const CI_MOVIE_COUNT: usize = 2_000;
const FULL_SCALE_MOVIE_COUNT: usize = 50_000;
const DIMENSION: usize = 384;

fn movie_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_MOVIE_COUNT
    } else {
        CI_MOVIE_COUNT
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}

/// Build a snapshot of `count` movies embedded with MockEmbedding.
fn build_snapshot(count: usize) -> CatalogSnapshot {
    let embedder = MockEmbedding::with_dimensions(DIMENSION);
    let rt = runtime();

    let records: Vec<StoredMovie> = (0..count)
        .map(|i| {
            let movie = Movie::new(i as i64, format!("Movie {}", i))
                .with_description(format!("A film about subject number {}", i))
                .with_genres([if i % 2 == 0 { "Drama" } else { "Comedy" }]);
            let vector = rt
                .block_on(embedder.embed(&movie.embedding_text()))
                .expect("embed failed");
            StoredMovie::new(movie, Some(encode_embedding(&vector)))
        })
        .collect();

    let snapshot = CatalogSnapshot::from_records(1, DIMENSION, &records).expect("snapshot failed");
    assert_eq!(snapshot.store().len(), count);
    snapshot
}

fn bench_rank(c: &mut Criterion) {
    let count = movie_count();
    let snapshot = build_snapshot(count);
    let query = snapshot
        .store()
        .get(MovieId(0))
        .expect("query vector missing")
        .to_vec();
    let exclude = HashSet::from([MovieId(0)]);

    let mut group = c.benchmark_group("rank");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(format!("top10_{}movies", count), |b| {
        b.iter(|| {
            let hits = SimilarityRanker::new(snapshot.store())
                .rank(&query, &exclude, 10)
                .expect("rank failed");
            assert_eq!(hits.len(), 10);
            hits
        });
    });

    group.finish();
}

fn bench_search_text(c: &mut Criterion) {
    let count = movie_count();
    let snapshot = build_snapshot(count);
    let engine = SearchEngine::new(MockEmbedding::with_dimensions(DIMENSION), 100);
    let rt = runtime();

    let mut group = c.benchmark_group("search_text");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(format!("top5_{}movies", count), |b| {
        b.iter(|| {
            rt.block_on(engine.search_text(&snapshot, "heist thriller in a casino", 5))
                .expect("search failed")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_rank, bench_search_text);
criterion_main!(benches);
