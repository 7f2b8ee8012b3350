//! Query-time retrieval over the passage store.
//!
//! The retriever hands the raw query to the store (which embeds it), takes the
//! `k` nearest passages, and converts each distance into a relevance score of
//! `1 − distance`, so relevance grows toward 1 as a passage gets closer to the
//! query. Store order is preserved: the backend already ranks best-first and
//! the conversion is monotonic.
//!
//! Retrieval fails softly. Any store error is logged and yields an empty
//! result list; a search must never crash its caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::stores::{PassageRecord, PassageStore};

/// A retrieved passage with its relevance to the query.
#[derive(Clone, Debug, Serialize)]
pub struct ScoredPassage {
    pub passage: PassageRecord,
    /// `1 − distance`; approaches 1 as the passage nears the query.
    pub relevance: f32,
}

/// Ranked nearest-neighbor search over a [`PassageStore`].
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn PassageStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn PassageStore>) -> Self {
        Self { store }
    }

    /// Return the `k` most relevant passages for `query`, best first.
    ///
    /// Returns an empty list on any store failure.
    pub async fn search(&self, query: &str, k: usize) -> Vec<ScoredPassage> {
        match self.store.query(query, k).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| ScoredPassage {
                    relevance: 1.0 - hit.distance,
                    passage: hit.record,
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, query, "passage search failed; returning no results");
                Vec::new()
            }
        }
    }
}
