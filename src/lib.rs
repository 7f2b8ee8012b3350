//! # ritesmith
//!
//! Passage indexing, retrieval, and budgeted multi-source guide composition
//! for ritual text corpora. Raw books become overlapping passages in a vector
//! store; a query either pulls ranked passages through a heuristic structurer
//! or drives a two-phase generative pipeline that extracts from each source
//! chunk and finalizes one reconciled guide.
//!
//! ```text
//! (book id, raw text) ──► ingestion::indexer ──► stores (sqlite-vec)
//!                                                    │
//! query ──► retrieval::Retriever ◄───────────────────┘
//!               │
//!               ├─► heuristics::structure_answer ──► StructuredAnswer
//!               │
//! topic ──► compose::Composer ── budget ledger ──► per-chunk extraction
//!               │                                        │
//!               └──────── finalize (one call) ◄── GuideDraft
//!                                   │
//!                                   ▼
//!                             ComposedGuide
//! ```
//!
//! Failure posture: retrieval and composition never error to the caller —
//! soft failures become empty results or canned guides, parse failures skip
//! their chunk, and only missing credentials abort (at generative-path
//! construction, via [`types::RiteError::Config`]).

pub mod compose;
pub mod heuristics;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod service;
pub mod sources;
pub mod stores;
pub mod types;

pub use compose::{ComposeBudget, ComposeChunking, ComposedGuide, Composer, GuideDraft};
pub use heuristics::{StructuredAnswer, structure_answer};
pub use ingestion::{IndexConfig, IndexReport, ingest_books, overlapping_chunks};
pub use providers::{ChatRequest, CompletionProvider, MockChatProvider, OpenAiChat};
pub use retrieval::{Retriever, ScoredPassage};
pub use service::{AnswerOutcome, AnswerRequest, CompositionStrategy, GuideService};
pub use sources::{BookSource, MemoryBookSource};
pub use stores::{PassageHit, PassageRecord, PassageStore, SqlitePassageStore};
pub use types::{Result, RiteError};
