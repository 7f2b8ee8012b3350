//! Shared error type for the passage pipeline.
//!
//! Every boundary with an external capability (vector store, embedding model,
//! completion provider) maps its failures into [`RiteError`] so callers can
//! branch on the failure class. Components with a soft-failure contract
//! (retrieval, composition) consume these errors internally and return
//! well-formed values instead of propagating them.

use thiserror::Error;

/// Errors surfaced at the pipeline's external boundaries.
#[derive(Debug, Error)]
pub enum RiteError {
    /// The vector store rejected an insert, count, or similarity query.
    #[error("storage error: {0}")]
    Storage(String),

    /// The embedding model failed to produce vectors.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The completion provider call failed (transport, status, or timeout).
    #[error("completion provider error: {0}")]
    Completion(String),

    /// A structured extraction payload could not be parsed.
    #[error("malformed extraction payload: {0}")]
    Parse(String),

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RiteError>;
