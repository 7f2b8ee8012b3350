//! OpenAI-compatible chat completion client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ChatRequest, CompletionProvider};
use crate::types::RiteError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Per-call ceiling; a stuck provider call becomes a skippable failure, never
/// a hang.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat client for any endpoint speaking the OpenAI completion API.
///
/// Constructed once per process and shared; all configuration (credentials,
/// model, endpoint, timeout) is fixed at construction.
#[derive(Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiChat {
    /// Build a client from the environment (`.env` honored via dotenvy):
    /// `OPENAI_API_KEY` (required), `OPENAI_CHAT_MODEL`, `OPENAI_BASE_URL`.
    ///
    /// A missing key is a configuration error: the generative path cannot
    /// start without credentials, and silently defaulting would only move the
    /// failure to the first request.
    pub fn from_env() -> Result<Self, RiteError> {
        dotenvy::dotenv().ok();
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| RiteError::Config("OPENAI_API_KEY not set in environment".to_string()))?;
        let model = env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, model, base_url)
    }

    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RiteError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|err| RiteError::Config(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiChat {
    async fn complete(&self, request: ChatRequest) -> Result<String, RiteError> {
        let body = json!({
            "model": self.model,
            "temperature": request.temperature,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        });

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| RiteError::Completion(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RiteError::Completion(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| RiteError::Completion(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RiteError::Completion("completion had no choices".to_string()))
    }
}
