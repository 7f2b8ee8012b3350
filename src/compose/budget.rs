//! Processing ceilings for the composition pipeline.
//!
//! Every extraction call costs provider latency and money, so a compose
//! request is bounded three ways: how many books are visited, how many chunks
//! each book contributes, and how many chunks are processed in total. Once the
//! total ceiling is reached every remaining chunk is skipped, even in books
//! not yet visited; once the book ceiling is reached, remaining books are
//! skipped entirely. This makes the worst-case call volume deterministic
//! regardless of corpus size.

use std::env;

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_BOOKS: usize = 3;
const DEFAULT_MAX_CHUNKS_PER_BOOK: usize = 3;
const DEFAULT_MAX_TOTAL_CHUNKS: usize = 8;

/// Configured ceilings, read once per request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ComposeBudget {
    pub max_books: usize,
    pub max_chunks_per_book: usize,
    pub max_total_chunks: usize,
}

impl Default for ComposeBudget {
    fn default() -> Self {
        Self {
            max_books: DEFAULT_MAX_BOOKS,
            max_chunks_per_book: DEFAULT_MAX_CHUNKS_PER_BOOK,
            max_total_chunks: DEFAULT_MAX_TOTAL_CHUNKS,
        }
    }
}

impl ComposeBudget {
    /// Read ceilings from `COMPOSE_MAX_BOOKS`, `COMPOSE_MAX_CHUNKS_PER_BOOK`,
    /// and `COMPOSE_MAX_TOTAL_CHUNKS` (`.env` honored), defaulting each
    /// missing or unparsable value.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_books: env_ceiling("COMPOSE_MAX_BOOKS", defaults.max_books),
            max_chunks_per_book: env_ceiling(
                "COMPOSE_MAX_CHUNKS_PER_BOOK",
                defaults.max_chunks_per_book,
            ),
            max_total_chunks: env_ceiling("COMPOSE_MAX_TOTAL_CHUNKS", defaults.max_total_chunks),
        }
    }

    /// Start a fresh running counter against these ceilings.
    pub fn ledger(self) -> BudgetLedger {
        BudgetLedger {
            budget: self,
            processed_total: 0,
        }
    }
}

fn env_ceiling(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

/// Running counter answering one question: may the next unit be processed?
#[derive(Clone, Debug)]
pub struct BudgetLedger {
    budget: ComposeBudget,
    processed_total: usize,
}

impl BudgetLedger {
    /// May the book at this zero-based position be visited at all?
    pub fn admits_book(&self, book_index: usize) -> bool {
        book_index < self.budget.max_books
    }

    /// May the chunk at this zero-based position within its book be processed?
    ///
    /// False once either the per-book position or the running total has
    /// reached its ceiling.
    pub fn admits_chunk(&self, chunk_index: usize) -> bool {
        chunk_index < self.budget.max_chunks_per_book
            && self.processed_total < self.budget.max_total_chunks
    }

    /// Record one successfully processed chunk.
    pub fn record_processed(&mut self) {
        self.processed_total += 1;
    }

    /// Chunks processed so far across all books.
    pub fn processed_total(&self) -> usize {
        self.processed_total
    }

    /// Ceiling on chunks contributed by a single book.
    pub fn max_chunks_per_book(&self) -> usize {
        self.budget.max_chunks_per_book
    }
}
