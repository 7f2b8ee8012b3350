//! One retrieval/composition core behind a strategy switch.
//!
//! The source system this crate grew out of shipped three near-duplicate
//! responders; here a single [`GuideService`] owns the retriever and (when
//! configured) the generative composer, and a [`CompositionStrategy`] selects
//! the path per request. Every operation returns a well-formed value under
//! all input conditions.

use std::sync::Arc;

use tracing::warn;

use crate::compose::{ComposedGuide, Composer};
use crate::heuristics::{StructuredAnswer, structure_answer};
use crate::retrieval::Retriever;
use crate::sources::BookSource;

/// How many passages the heuristic path retrieves per query.
const DEFAULT_TOP_K: usize = 5;

/// Which composition path serves a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionStrategy {
    /// Pattern-battery structuring over retrieved passages; no provider.
    Heuristic,
    /// Two-phase generative composition over the book corpus.
    Generative,
}

/// The result of answering one request.
#[derive(Clone, Debug)]
pub enum AnswerOutcome {
    Structured(StructuredAnswer),
    Composed(ComposedGuide),
}

/// One answer request: the query (or compose topic), the strategy, and an
/// optional explicit book subset for the generative path.
#[derive(Clone, Debug)]
pub struct AnswerRequest {
    pub query: String,
    pub strategy: CompositionStrategy,
    pub books: Option<Vec<String>>,
}

struct GenerativePath {
    composer: Composer,
    source: Arc<dyn BookSource>,
}

/// Unified entry point over the heuristic and generative paths.
pub struct GuideService {
    retriever: Retriever,
    generative: Option<GenerativePath>,
    top_k: usize,
}

impl GuideService {
    pub fn new(retriever: Retriever) -> Self {
        Self {
            retriever,
            generative: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Enable the generative path.
    #[must_use]
    pub fn with_composer(mut self, composer: Composer, source: Arc<dyn BookSource>) -> Self {
        self.generative = Some(GenerativePath { composer, source });
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Heuristic path: retrieve and structure. Falls back to the canned
    /// not-found answer when retrieval yields nothing.
    pub async fn ask(&self, query: &str) -> StructuredAnswer {
        let results = self.retriever.search(query, self.top_k).await;
        structure_answer(query, &results)
    }

    /// Generative path: compose a guide for `topic`, optionally restricted to
    /// `books`. Falls back to the heuristic path when no composer is
    /// configured.
    pub async fn compose(&self, topic: &str, books: Option<&[String]>) -> AnswerOutcome {
        match &self.generative {
            Some(path) => AnswerOutcome::Composed(
                path.composer.compose(topic, books, path.source.as_ref()).await,
            ),
            None => {
                warn!(topic, "generative path not configured; answering heuristically");
                AnswerOutcome::Structured(self.ask(topic).await)
            }
        }
    }

    /// Dispatch on the request's strategy.
    pub async fn answer(&self, request: AnswerRequest) -> AnswerOutcome {
        match request.strategy {
            CompositionStrategy::Heuristic => AnswerOutcome::Structured(self.ask(&request.query).await),
            CompositionStrategy::Generative => {
                self.compose(&request.query, request.books.as_deref()).await
            }
        }
    }
}
