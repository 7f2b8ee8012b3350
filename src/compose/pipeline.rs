//! Two-phase guide composition: extract per chunk, finalize once.
//!
//! Phase one walks the resolved books chunk by chunk (under the budget
//! ledger) and asks the provider for a constrained structured extraction of
//! each viable chunk. Phase two sends the merged draft to the provider
//! exactly once for deduplication, conservative conflict resolution, and
//! rendering. Bounding the expensive finalization to a single call per
//! request keeps cost flat in corpus size while still reconciling redundant
//! or conflicting source material globally rather than chunk-by-chunk.
//!
//! Failure posture: a failed or unparsable extraction skips that chunk only;
//! a failed finalization produces a guide that states the failure. `compose`
//! itself is infallible.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compose::budget::ComposeBudget;
use crate::compose::draft::{GuideDraft, parse_extraction};
use crate::ingestion::chunk::overlapping_chunks;
use crate::providers::{ChatRequest, CompletionProvider};
use crate::sources::BookSource;
use crate::types::RiteError;

/// Returned when no book yields any text; produced without any provider call.
pub const NO_BOOKS_MESSAGE: &str = "No books found to compose the guide.";

const SYSTEM_PROMPT: &str = "You are an expert ritual officiant and editor. You will receive raw \
     excerpts from authentic source books. Rewrite them into a crystal-clear, \
     beginner-friendly guide in polished natural language. Output must be \
     comprehensive and practical.";

const EXTRACTION_PROMPT: &str = "From the provided raw book excerpt, extract and normalize structured \
     items. Return JSON with keys: materials (array of objects with name and \
     why), steps (array of strings in order), timings (array of strings), dos \
     (array), donts (array), mantras (array of objects with text and meaning), \
     notes (array). Be faithful to the source; do not invent.";

const FINALIZE_PROMPT: &str = "You will receive a merged JSON draft compiled from multiple authentic \
     books for the topic. Carefully deduplicate, resolve conflicts \
     conservatively (prefer the version supported by more sources; omit \
     content supported by a single source and contradicted elsewhere), and \
     produce a final, polished guide in the following format:\n\n\
     Materials (with simple explanations)\n1) ...\n\n\
     Procedure (step-by-step)\n1) ...\n\n\
     Additional Notes\n- Best timing\n- Do's & Don'ts\n- Meanings of important mantras\n\n\
     Write naturally. Keep it clear and beginner-friendly.";

const EXTRACTION_TEMPERATURE: f32 = 0.2;
const FINALIZE_TEMPERATURE: f32 = 0.3;

/// Chunking parameters for composition. Windows are larger than search
/// indexing's: each one feeds a whole extraction call, so fewer, bigger
/// excerpts cost less than many small ones.
#[derive(Clone, Copy, Debug)]
pub struct ComposeChunking {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks whose trimmed text is shorter than this carry too little to
    /// justify a provider call.
    pub min_viable_len: usize,
}

impl Default for ComposeChunking {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            chunk_overlap: 300,
            min_viable_len: 100,
        }
    }
}

/// The single narrative result of one compose request.
#[derive(Clone, Debug, Serialize)]
pub struct ComposedGuide {
    pub content_markdown: String,
}

/// Budget-bounded extract-then-finalize composition over a book corpus.
pub struct Composer {
    provider: Arc<dyn CompletionProvider>,
    budget: ComposeBudget,
    chunking: ComposeChunking,
}

impl Composer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            budget: ComposeBudget::default(),
            chunking: ComposeChunking::default(),
        }
    }

    #[must_use]
    pub fn with_budget(mut self, budget: ComposeBudget) -> Self {
        self.budget = budget;
        self
    }

    #[must_use]
    pub fn with_chunking(mut self, chunking: ComposeChunking) -> Self {
        self.chunking = chunking;
        self
    }

    /// Compose a guide for `topic` from `source`, optionally restricted to an
    /// explicit subset of books.
    ///
    /// Always returns a well-formed guide: an empty corpus yields the static
    /// no-sources message, and a failed finalization yields a guide stating
    /// the failure.
    pub async fn compose(
        &self,
        topic: &str,
        only_books: Option<&[String]>,
        source: &dyn BookSource,
    ) -> ComposedGuide {
        let book_texts = resolve_books(source, only_books).await;
        if book_texts.is_empty() {
            info!(topic, "no readable books; returning static guide");
            return ComposedGuide {
                content_markdown: NO_BOOKS_MESSAGE.to_string(),
            };
        }

        let mut draft = GuideDraft::default();
        let mut ledger = self.budget.ledger();

        for (book_index, (book, text)) in book_texts.iter().enumerate() {
            if !ledger.admits_book(book_index) {
                debug!(book = %book, "book ceiling reached; skipping remaining books");
                break;
            }

            let chunks: Vec<&str> =
                overlapping_chunks(text, self.chunking.chunk_size, self.chunking.chunk_overlap)
                    .take(ledger.max_chunks_per_book())
                    .collect();
            let chunk_total = chunks.len();

            for (chunk_index, chunk) in chunks.into_iter().enumerate() {
                if !ledger.admits_chunk(chunk_index) {
                    break;
                }
                if chunk.trim().chars().count() < self.chunking.min_viable_len {
                    debug!(book = %book, chunk_index, "chunk below viability threshold; skipping");
                    continue;
                }

                let request = ChatRequest {
                    system: SYSTEM_PROMPT.to_string(),
                    user: extraction_prompt(topic, book, chunk_index, chunk_total, chunk),
                    temperature: EXTRACTION_TEMPERATURE,
                };
                let raw = match self.provider.complete(request).await {
                    Ok(raw) => raw,
                    Err(err) => {
                        warn!(book = %book, chunk_index, error = %err, "extraction call failed; skipping chunk");
                        continue;
                    }
                };
                let extraction = match parse_extraction(&raw) {
                    Ok(extraction) => extraction,
                    Err(err) => {
                        debug!(book = %book, chunk_index, error = %err, "unparsable extraction; skipping chunk");
                        continue;
                    }
                };

                draft.absorb(extraction);
                draft.record_source(book.clone(), chunk_index);
                ledger.record_processed();
            }
        }

        info!(
            topic,
            chunks = ledger.processed_total(),
            "extraction phase complete; finalizing"
        );

        match self.finalize(topic, &draft).await {
            Ok(content_markdown) => ComposedGuide { content_markdown },
            Err(err) => {
                warn!(topic, error = %err, "finalization failed");
                ComposedGuide {
                    content_markdown: format!("Error finalizing guide: {err}"),
                }
            }
        }
    }

    async fn finalize(&self, topic: &str, draft: &GuideDraft) -> Result<String, RiteError> {
        let draft_json =
            serde_json::to_string(draft).map_err(|err| RiteError::Parse(err.to_string()))?;
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "Compose a final, polished guide for: {topic}\n\n\
                 Here is the merged JSON draft from authentic books:\n\n\
                 {draft_json}\n\n{FINALIZE_PROMPT}"
            ),
            temperature: FINALIZE_TEMPERATURE,
        };
        self.provider.complete(request).await
    }
}

fn extraction_prompt(
    topic: &str,
    book: &str,
    chunk_index: usize,
    chunk_total: usize,
    chunk: &str,
) -> String {
    format!(
        "Topic: {topic}\n\n\
         Source Book: {book} (chunk {}/{chunk_total})\n\n\
         Raw Excerpt:\n{chunk}\n\n{EXTRACTION_PROMPT}",
        chunk_index + 1
    )
}

/// Read the requested books, dropping any whose extraction yielded no text.
async fn resolve_books(
    source: &dyn BookSource,
    only_books: Option<&[String]>,
) -> Vec<(String, String)> {
    let mut resolved = Vec::new();
    for book in source.list_books().await {
        if let Some(subset) = only_books {
            if !subset.contains(&book) {
                continue;
            }
        }
        let text = source.read_text(&book).await;
        if text.is_empty() {
            debug!(book = %book, "book yielded no text; skipping");
            continue;
        }
        resolved.push((book, text));
    }
    resolved
}
