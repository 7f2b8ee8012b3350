//! Storage backends for indexed passages and their embeddings.
//!
//! The [`PassageStore`] trait is the pipeline's only view of persistence: it
//! can insert passages, count them, and run a nearest-neighbor query. The
//! store owns the embedding capability — callers hand over raw text and the
//! backend decides how it becomes a vector, both at insert and at query time.
//!
//! ```text
//!                   ┌──────────────────┐
//!                   │  PassageStore    │
//!                   │  (async trait)   │
//!                   └────────┬─────────┘
//!                            │
//!                            ▼
//!                   ┌──────────────────┐
//!                   │     SQLite       │
//!                   │   sqlite-vec     │
//!                   └──────────────────┘
//! ```
//!
//! Query results come back ordered most-similar first, carrying the raw
//! cosine distance; converting distance into a relevance score is the
//! retriever's job, not the store's.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RiteError;

pub use sqlite::{PassageDocument, SqlitePassageStore};

/// A passage ready for storage, before any embedding has been computed.
///
/// The `key` must be unique across the store; the indexer derives it
/// deterministically from `(book, seq_index)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassageRecord {
    /// Stable unique identifier for this passage.
    pub key: String,
    /// Source book filename.
    pub book: String,
    /// Zero-based position of this passage within its book.
    pub seq_index: usize,
    /// Normalized passage text.
    pub content: String,
    /// Additional metadata as JSON.
    pub metadata: serde_json::Value,
}

impl PassageRecord {
    pub fn new(
        key: impl Into<String>,
        book: impl Into<String>,
        seq_index: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            book: book.into(),
            seq_index,
            content: content.into(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    /// Set additional metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One nearest-neighbor match: the stored passage plus its raw distance
/// from the query embedding (smaller is closer).
#[derive(Clone, Debug)]
pub struct PassageHit {
    pub record: PassageRecord,
    pub distance: f32,
}

/// Unified interface over passage storage backends.
///
/// Implementations own embedding: both inserted passages and query text are
/// vectorized by the backend's model. `query` must return hits ordered by
/// ascending distance.
#[async_trait]
pub trait PassageStore: Send + Sync {
    /// Insert passages, embedding each one's content.
    ///
    /// Inserting a passage whose key already exists must not create a
    /// duplicate entry.
    async fn insert_passages(&self, passages: Vec<PassageRecord>) -> Result<(), RiteError>;

    /// Total number of passages currently stored.
    async fn count(&self) -> Result<usize, RiteError>;

    /// Embed `query_text` and return the `k` nearest passages, best first.
    async fn query(&self, query_text: &str, k: usize) -> Result<Vec<PassageHit>, RiteError>;
}
