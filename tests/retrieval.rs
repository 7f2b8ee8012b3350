//! Retriever behavior: ranking, relevance conversion, soft failure.

mod common;

use std::sync::Arc;

use common::{FailingStore, MemoryPassageStore};
use ritesmith::retrieval::Retriever;
use ritesmith::stores::{PassageRecord, PassageStore};

fn record(key: &str, content: &str) -> PassageRecord {
    PassageRecord::new(key, "book.pdf", 0, content)
}

#[tokio::test]
async fn results_come_back_best_first_with_monotonic_relevance() {
    let store = MemoryPassageStore::new();
    store
        .insert_passages(vec![
            record("a", "nothing relevant here at all"),
            record("b", "light the diya"),
            record("c", "light the diya with ghee at sunrise"),
        ])
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(store));
    let results = retriever.search("diya ghee sunrise", 3).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].passage.key, "c");
    assert_eq!(results[1].passage.key, "b");
    // Smaller distance maps to strictly larger relevance.
    assert!(results[0].relevance > results[1].relevance);
    assert!(results[1].relevance > results[2].relevance);
}

#[tokio::test]
async fn k_bounds_the_result_count() {
    let store = MemoryPassageStore::new();
    store
        .insert_passages(
            (0..10)
                .map(|i| record(&format!("p{i}"), "offer flowers and rice"))
                .collect(),
        )
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(store));
    assert_eq!(retriever.search("flowers", 4).await.len(), 4);
}

#[tokio::test]
async fn store_failure_yields_empty_results() {
    let retriever = Retriever::new(Arc::new(FailingStore));
    let results = retriever.search("anything", 5).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn empty_store_yields_empty_results() {
    let retriever = Retriever::new(Arc::new(MemoryPassageStore::new()));
    assert!(retriever.search("lakshmi", 5).await.is_empty());
}
