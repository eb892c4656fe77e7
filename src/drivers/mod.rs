//! AI provider drivers.
//!
//! Each provider API (Gemini `generateContent`, OpenAI `chat/completions`) is an
//! implementation of [`TextProvider`]. The orchestrator holds them as an ordered
//! `Vec<Arc<dyn TextProvider>>` and walks the list until one answers.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::Prompt;

pub use gemini::GeminiDriver;
pub use openai::OpenAiDriver;

/// Failure of a single provider attempt. Never surfaced to HTTP callers directly.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Transport(reqwest::Error),

    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

// Request URLs can carry credentials; keep them out of messages and logs.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.without_url())
    }
}

/// Common capability of every text-generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync + std::fmt::Debug {
    /// Short provider name used in logs and error bodies (`"gemini"`, `"openai"`).
    fn name(&self) -> &str;

    /// Whether the provider has the credentials it needs.
    fn is_available(&self) -> bool;

    /// Run one completion and return the generated text.
    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

/// Pulls the error message out of a non-2xx provider body.
///
/// Both APIs use `{"error": {"message": ...}}`; anything else is returned verbatim.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().chars().take(500).collect())
}

/// Sends a JSON POST and returns the decoded body, mapping non-2xx to [`ProviderError::Status`].
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<Value, ProviderError> {
    let response = request.json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message: error_message(&text),
        });
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_json_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(error_message(body), "API key not valid");
    }

    #[test]
    fn test_error_message_from_plain_body() {
        assert_eq!(error_message("  upstream timeout \n"), "upstream timeout");
    }
}
