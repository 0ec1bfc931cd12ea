//! Benchmark tests for k-NN queries and scoped search.
//!
//! # Dataset Size
//!
//! This benchmark uses 1,000 documents for CI speed. To run against the
//! full-scale dataset of 100,000 documents, set the environment variable
//! `BENCH_FULL_SCALE=1` before running:
//!
//! ```bash
//! BENCH_FULL_SCALE=1 cargo bench -p fieldfare-vector
//! ```
//!
//! The index scans exactly, so query time grows linearly with document
//! count; the full-scale run shows where the exact scan stops being
//! acceptable and an approximate backend becomes worth wiring in.

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use fieldfare_core::config::{IndexConfig, SearchConfig};
use fieldfare_core::types::IndexedRecord;
use fieldfare_vector::embedding::{EmbeddingService, MockEmbedding};
use fieldfare_vector::index::{KnnSchema, SimilarityIndex};
use fieldfare_vector::search::QueryEngine;

/// Number of documents to index for CI benchmarks.
const CI_DOC_COUNT: usize = 1_000;

/// Number of documents for full-scale benchmarks.
const FULL_SCALE_DOC_COUNT: usize = 100_000;

const INDEX: &str = "content-repo-search";

/// Realistic review text (~80 words) for benchmarking.
///
/// Each review is made unique by appending a sequential index to the base
/// text, which ensures MockEmbedding produces distinct vectors per document.
fn generate_review_text(index: usize) -> String {
    format!(
        "Bought this for the home office and it exceeded every expectation. \
         Assembly took about twenty minutes with the included tools and the \
         instructions were actually readable for once. The finish matches \
         the photos, the drawers glide smoothly, and nothing wobbles even \
         on an uneven floor. Customer support replied within a day when one \
         screw was missing and shipped a replacement immediately. Three \
         months in it still looks brand new despite daily use. Would \
         happily order from this seller again. Review identifier: {}",
        index
    )
}

/// Determine document count based on environment variable.
fn doc_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_DOC_COUNT
    } else {
        CI_DOC_COUNT
    }
}

/// Build a SimilarityIndex populated with `count` review documents.
///
/// Returns the index and the embedder for query generation.
fn build_populated_index(count: usize) -> (SimilarityIndex, MockEmbedding) {
    let index = SimilarityIndex::new();
    let embedder = MockEmbedding::new();

    index
        .ensure_index(INDEX, &KnnSchema::new("reviewBody_embeddings", 512))
        .expect("ensure_index failed");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    for i in 0..count {
        let text = generate_review_text(i);
        let vector = rt.block_on(embedder.embed(&text)).expect("embed failed");

        let department = match i % 3 {
            0 => "books",
            1 => "electronics",
            _ => "garden",
        };

        let mut record = IndexedRecord::new();
        record.set_field("reviewid", format!("r{:05}", i));
        record.set_field("reviewBody", text);
        record.set_field("department", department);
        record.set_field("reviewBody_embeddings", vector);

        index.index_document(INDEX, &record).expect("index failed");
    }

    assert_eq!(
        index.count(INDEX).expect("count failed") as usize,
        count,
        "Index should contain all inserted documents"
    );
    (index, embedder)
}

/// Benchmark raw k-NN queries against the index.
fn bench_knn_query(c: &mut Criterion) {
    let count = doc_count();
    let (index, embedder) = build_populated_index(count);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    let query_vec = rt
        .block_on(embedder.embed("missing screw customer support"))
        .expect("query embed failed");

    let mut group = c.benchmark_group("knn_query");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function(format!("top3_{}docs", count), |b| {
        b.iter(|| {
            let response = index
                .query_knn(INDEX, &query_vec, 3, None)
                .expect("query failed");
            assert!(!response.hits.is_empty(), "Query should return hits");
            response
        });
    });

    group.finish();
}

/// Benchmark end-to-end search (query embedding + scoped k-NN).
fn bench_scoped_search(c: &mut Criterion) {
    let count = doc_count();
    let (index, _embedder) = build_populated_index(count);

    let engine = QueryEngine::new(
        Arc::new(index),
        MockEmbedding::new(),
        &IndexConfig::default(),
        &SearchConfig::default(),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    let mut group = c.benchmark_group("scoped_search");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(10));

    // Search without a caller scope.
    group.bench_function(format!("unscoped_{}docs", count), |b| {
        b.iter(|| {
            let response = rt
                .block_on(engine.search("drawers glide smoothly", None))
                .expect("search failed");
            assert!(!response.hits.is_empty(), "Search should return hits");
            response
        });
    });

    // Search scoped to one department.
    group.bench_function(format!("scoped_{}docs", count), |b| {
        b.iter(|| {
            let response = rt
                .block_on(engine.search("drawers glide smoothly", Some("books")))
                .expect("search failed");
            response
        });
    });

    group.finish();
}

criterion_group!(benches, bench_knn_query, bench_scoped_search);
criterion_main!(benches);
