//! Corpus ingestion: books in, indexed passages out.
//!
//! Ingestion runs once per store lifetime. If the store already holds any
//! passages the whole run is a no-op; this guards against duplicate
//! accumulation, at the documented cost that a corpus changed after first
//! ingestion is never re-indexed until the store is cleared.

use serde_json::json;
use tracing::{info, warn};

use crate::ingestion::chunk::overlapping_chunks;
use crate::stores::{PassageRecord, PassageStore};
use crate::types::RiteError;

/// Default window size for search indexing, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between adjacent windows, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Passages shorter than this after whitespace normalization carry too
/// little information to index.
pub const DEFAULT_MIN_PASSAGE_LEN: usize = 50;

/// Chunking parameters for search indexing.
#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_passage_len: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            min_passage_len: DEFAULT_MIN_PASSAGE_LEN,
        }
    }
}

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub books_processed: usize,
    pub passages_indexed: usize,
    pub passages_discarded: usize,
    /// True when the store was already populated and the run was a no-op.
    pub skipped_existing: bool,
}

/// Deterministic passage key: unique given `(book, seq)`.
pub fn passage_key(book: &str, seq: usize) -> String {
    format!("{book}_{seq}")
}

/// Split each book into passages and insert them into the store.
///
/// Books with empty text (failed upstream extraction) are skipped with a
/// warning. Each book's inserts are independent; there is no rollback across
/// books. Sequence indices are assigned before the minimum-length filter, so
/// the surviving indices of a book may have gaps.
///
/// Two callers racing on an empty store can both pass the populated check and
/// ingest twice; serializing first ingestion is the caller's responsibility.
pub async fn ingest_books(
    store: &dyn PassageStore,
    books: &[(String, String)],
    config: &IndexConfig,
) -> Result<IndexReport, RiteError> {
    let existing = store.count().await?;
    if existing > 0 {
        info!(existing, "passage store already populated; skipping ingestion");
        return Ok(IndexReport {
            skipped_existing: true,
            ..Default::default()
        });
    }

    let mut report = IndexReport::default();
    for (book, text) in books {
        if text.is_empty() {
            warn!(book = %book, "no extracted text; skipping book");
            continue;
        }

        let mut passages = Vec::new();
        for (seq, raw) in overlapping_chunks(text, config.chunk_size, config.chunk_overlap).enumerate() {
            let content = normalize_whitespace(raw);
            if content.chars().count() < config.min_passage_len {
                report.passages_discarded += 1;
                continue;
            }
            let record = PassageRecord::new(passage_key(book, seq), book.clone(), seq, content)
                .with_metadata(json!({ "book_title": book, "seq_index": seq }));
            passages.push(record);
        }

        let inserted = passages.len();
        store.insert_passages(passages).await?;
        report.books_processed += 1;
        report.passages_indexed += inserted;
        info!(book = %book, inserted, "indexed book");
    }

    info!(
        books = report.books_processed,
        passages = report.passages_indexed,
        discarded = report.passages_discarded,
        "ingestion complete"
    );
    Ok(report)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
