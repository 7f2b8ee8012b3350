//! The text-extraction collaborator boundary.
//!
//! Where book text comes from (PDF extraction, a filesystem walk, an object
//! store) is outside this crate. The pipeline only needs two things: the set
//! of available book identifiers, and each book's raw text. Extraction
//! failures must not cross this boundary as errors — a failed book simply
//! reads as empty text and is skipped downstream.

use async_trait::async_trait;

/// Supplier of raw book text.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Identifiers of every available book, in a stable order.
    async fn list_books(&self) -> Vec<String>;

    /// Raw text of one book; empty when the book is unknown or its
    /// extraction failed.
    async fn read_text(&self, book: &str) -> String;
}

/// In-memory book source for tests, demos, and pre-extracted corpora.
///
/// Books keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemoryBookSource {
    books: Vec<(String, String)>,
}

impl MemoryBookSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_book(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.books.push((name.into(), text.into()));
    }
}

#[async_trait]
impl BookSource for MemoryBookSource {
    async fn list_books(&self) -> Vec<String> {
        self.books.iter().map(|(name, _)| name.clone()).collect()
    }

    async fn read_text(&self, book: &str) -> String {
        self.books
            .iter()
            .find(|(name, _)| name == book)
            .map(|(_, text)| text.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_book_reads_as_empty() {
        let source = MemoryBookSource::new().with_book("a.pdf", "text");
        assert_eq!(source.read_text("missing.pdf").await, "");
        assert_eq!(source.read_text("a.pdf").await, "text");
    }

    #[tokio::test]
    async fn listing_preserves_insertion_order() {
        let source = MemoryBookSource::new()
            .with_book("b.pdf", "2")
            .with_book("a.pdf", "1");
        assert_eq!(source.list_books().await, vec!["b.pdf", "a.pdf"]);
    }
}
