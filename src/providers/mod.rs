//! Chat-completion providers for the generative composition path.
//!
//! The [`CompletionProvider`] trait is the single seam between the pipeline
//! and any text-generation backend. The production implementation is
//! [`OpenAiChat`], speaking the OpenAI-compatible chat API over HTTP;
//! [`MockChatProvider`] serves tests and demos with scripted replies and a
//! record of every call made, so call-volume properties (budget ceilings,
//! zero-call fast paths) can be asserted directly.

pub mod openai;

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::RiteError;

pub use openai::OpenAiChat;

/// One chat completion request: system framing, user payload, sampling
/// temperature. Model selection and timeouts are provider configuration,
/// fixed once at construction.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// A text-generation backend.
///
/// Failures must surface as [`RiteError::Completion`] (or
/// [`RiteError::Config`] at construction), never as a panic: the composition
/// pipeline treats a failed call as a skippable unit.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, RiteError>;
}

/// Scripted in-memory provider for tests and demos.
///
/// Replies are served from a FIFO queue; when the queue is empty the
/// configured default reply (if any) is returned, otherwise the call fails.
/// Every request is recorded and can be inspected afterwards.
pub struct MockChatProvider {
    scripted: Mutex<VecDeque<Result<String, RiteError>>>,
    default_reply: Option<String>,
    calls: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    /// A provider that answers every call with the same reply.
    pub fn returning(reply: impl Into<String>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default_reply: Some(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that serves the given replies in order and fails once they
    /// are exhausted.
    pub fn scripted(replies: Vec<Result<String, RiteError>>) -> Self {
        Self {
            scripted: Mutex::new(replies.into()),
            default_reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Append one more scripted reply.
    pub fn enqueue(&self, reply: Result<String, RiteError>) {
        self.scripted.lock().push_back(reply);
    }

    /// Number of completion calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Snapshot of every request received so far, in order.
    pub fn recorded_calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockChatProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, RiteError> {
        self.calls.lock().push(request);
        if let Some(reply) = self.scripted.lock().pop_front() {
            return reply;
        }
        match &self.default_reply {
            Some(text) => Ok(text.clone()),
            None => Err(RiteError::Completion("mock reply queue exhausted".to_string())),
        }
    }
}
