//! Benchmarks for brute-force search, hash embedding, and manager queries.
//!
//! The default corpus is 200 bills, the expected production size. Set
//! `BENCH_LARGE=1` to run against 5,000 bills, the point where an
//! approximate index would start to pay off.
//!
//! ```bash
//! BENCH_LARGE=1 cargo bench -p billsearch-vector
//! ```

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use billsearch_core::config::IndexConfig;
use billsearch_core::types::{BillEmbedding, DocumentRecord, RawDocument};
use billsearch_vector::embedding::clean_text;
use billsearch_vector::{
    EmbeddingGenerator, HashEmbedding, IndexManager, StaticDocumentSource, VectorIndex,
};

const DIMENSIONS: usize = 768;
const DEFAULT_BILL_COUNT: usize = 200;
const LARGE_BILL_COUNT: usize = 5_000;

const TOPICS: [&str; 8] = [
    "clean energy tax credit for residential solar installations",
    "corporate tax reform and international profit shifting",
    "renewable energy grant program for rural cooperatives",
    "veterans health care access and community providers",
    "broadband infrastructure deployment in underserved areas",
    "agricultural subsidies and crop insurance modernization",
    "border security technology and port of entry staffing",
    "student loan forgiveness for public service workers",
];

fn bill_count() -> usize {
    if std::env::var("BENCH_LARGE").is_ok() {
        LARGE_BILL_COUNT
    } else {
        DEFAULT_BILL_COUNT
    }
}

fn raw_bill(i: usize) -> RawDocument {
    RawDocument {
        id: format!("hr-{}-118", i),
        title: format!("Bill {} {}", i, TOPICS[i % TOPICS.len()]),
        summary: Some(format!(
            "This Act amends existing law regarding {}. Section {} establishes reporting requirements.",
            TOPICS[(i + 3) % TOPICS.len()],
            i
        )),
        sponsor: Some(format!("Rep. Member {}", i % 50)),
        tags: vec!["Congress".to_string(), format!("Committee {}", i % 12)],
        introduced_date: Some("2024-02-01".to_string()),
        latest_action: Some("Referred to committee".to_string()),
    }
}

fn embedded_corpus(count: usize) -> Vec<BillEmbedding> {
    let hash = HashEmbedding::new(DIMENSIONS);
    (0..count)
        .map(|i| {
            let document = DocumentRecord::from_raw(raw_bill(i));
            let embedding = hash.vector_for(&clean_text(&document.full_text, 1000));
            BillEmbedding {
                document,
                embedding,
            }
        })
        .collect()
}

fn bench_index_search(c: &mut Criterion) {
    let count = bill_count();
    let index = VectorIndex::new();
    index
        .build(embedded_corpus(count), DIMENSIONS)
        .expect("build failed");
    let query = HashEmbedding::new(DIMENSIONS).vector_for("renewable energy incentives");

    let mut group = c.benchmark_group("index_search");
    group.measurement_time(Duration::from_secs(5));
    group.bench_function(format!("top10_{}bills", count), |b| {
        b.iter(|| index.search(&query, 10, 0.2).expect("search failed"));
    });
    group.bench_function(format!("top10_no_threshold_{}bills", count), |b| {
        b.iter(|| index.search(&query, 10, -1.0).expect("search failed"));
    });
    group.finish();
}

fn bench_index_build(c: &mut Criterion) {
    let count = bill_count();
    let corpus = embedded_corpus(count);
    let index = VectorIndex::new();

    c.bench_function(&format!("index_build_{}bills", count), |b| {
        b.iter_batched(
            || corpus.clone(),
            |batch| index.build(batch, DIMENSIONS).expect("build failed"),
            BatchSize::LargeInput,
        );
    });
}

fn bench_hash_embedding(c: &mut Criterion) {
    let hash = HashEmbedding::new(DIMENSIONS);
    let text = DocumentRecord::from_raw(raw_bill(7)).full_text;

    c.bench_function("hash_embedding_full_text", |b| {
        b.iter(|| hash.vector_for(&text));
    });
}

fn bench_manager_search(c: &mut Criterion) {
    let count = bill_count();
    let source = StaticDocumentSource::new((0..count).map(raw_bill).collect());
    let manager = IndexManager::new(
        EmbeddingGenerator::fallback_only(DIMENSIONS),
        source,
        IndexConfig::default(),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");
    rt.block_on(manager.initialize()).expect("initialize failed");

    c.bench_function(&format!("manager_search_{}bills", count), |b| {
        b.iter(|| rt.block_on(manager.search("broadband deployment rural areas", Some(10))));
    });
}

criterion_group!(
    benches,
    bench_index_search,
    bench_index_build,
    bench_hash_embedding,
    bench_manager_search,
);
criterion_main!(benches);
