//! Ingestion utilities for turning raw book text into indexed passages.
//!
//! Two capabilities live here:
//!
//! * [`chunk`] — the overlapping character-window splitter.
//! * [`indexer`] — the idempotent corpus-to-store ingestion run.

pub mod chunk;
pub mod indexer;

pub use chunk::{Chunks, overlapping_chunks};
pub use indexer::{IndexConfig, IndexReport, ingest_books, passage_key};
