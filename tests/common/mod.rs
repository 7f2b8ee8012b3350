//! Shared fixtures for the integration suites: an in-memory passage store
//! with deterministic lexical ranking, a store that always fails, and sample
//! corpus text.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;

use ritesmith::stores::{PassageHit, PassageRecord, PassageStore};
use ritesmith::types::RiteError;

/// In-memory store ranking by word overlap with the query.
///
/// Distance is `1 − matched/total` over the query's words, so a passage
/// containing more of the query ranks closer. Deterministic and dependency
/// free; embedding never enters the picture.
#[derive(Default)]
pub struct MemoryPassageStore {
    records: Mutex<Vec<PassageRecord>>,
}

impl MemoryPassageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PassageRecord> {
        self.records.lock().clone()
    }
}

pub fn lexical_distance(query: &str, content: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let total = words.len().max(1);
    let matched = words
        .iter()
        .filter(|word| content_lower.contains(word.as_str()))
        .count();
    1.0 - matched as f32 / total as f32
}

#[async_trait]
impl PassageStore for MemoryPassageStore {
    async fn insert_passages(&self, passages: Vec<PassageRecord>) -> Result<(), RiteError> {
        let mut records = self.records.lock();
        for passage in passages {
            if !records.iter().any(|record| record.key == passage.key) {
                records.push(passage);
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, RiteError> {
        Ok(self.records.lock().len())
    }

    async fn query(&self, query_text: &str, k: usize) -> Result<Vec<PassageHit>, RiteError> {
        let mut hits: Vec<PassageHit> = self
            .records
            .lock()
            .iter()
            .map(|record| PassageHit {
                record: record.clone(),
                distance: lexical_distance(query_text, &record.content),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

/// A store whose every operation fails, for soft-failure tests.
pub struct FailingStore;

#[async_trait]
impl PassageStore for FailingStore {
    async fn insert_passages(&self, _passages: Vec<PassageRecord>) -> Result<(), RiteError> {
        Err(RiteError::Storage("store offline".to_string()))
    }

    async fn count(&self) -> Result<usize, RiteError> {
        Err(RiteError::Storage("store offline".to_string()))
    }

    async fn query(&self, _query_text: &str, _k: usize) -> Result<Vec<PassageHit>, RiteError> {
        Err(RiteError::Storage("store offline".to_string()))
    }
}

/// Repeat `sentence` until the text reaches at least `min_chars` characters.
pub fn long_text(sentence: &str, min_chars: usize) -> String {
    let mut text = String::new();
    while text.chars().count() < min_chars {
        text.push_str(sentence);
        text.push(' ');
    }
    text
}

/// A small two-book corpus with enough text to produce several passages
/// under the default indexing config.
pub fn sample_books() -> Vec<(String, String)> {
    vec![
        (
            "lakshmi_puja.pdf".to_string(),
            long_text(
                "1. Clean the altar and light the diya with ghee before sunrise. \
                 Then offer flowers and rice to the goddess while reciting om namah.",
                2400,
            ),
        ),
        (
            "durga_puja.pdf".to_string(),
            long_text(
                "Place the kalash filled with water and mango leaves on the altar. \
                 Next offer coconut, banana and sweets in the evening on purnima.",
                2400,
            ),
        ),
    ]
}
