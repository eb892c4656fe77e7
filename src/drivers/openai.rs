//! OpenAI chat completions driver.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::types::Prompt;

use super::{post_json, ProviderError, TextProvider};

#[derive(Debug, Clone)]
pub struct OpenAiDriver {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiDriver {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Self {
        Self::new(
            http,
            settings.openai_api_key.clone(),
            settings.openai_model.clone(),
            settings.openai_base_url.clone(),
        )
    }

    fn build_body(&self, prompt: &Prompt) -> Value {
        let messages: Vec<Value> = prompt
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = prompt.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(mt) = prompt.max_tokens {
            body["max_tokens"] = json!(mt);
        }
        if prompt.json_output {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or(ProviderError::EmptyResponse)?;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl TextProvider for OpenAiDriver {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::NotConfigured("OpenAI".into()));
        }
        let body = self.build_body(prompt);
        let request = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key);
        let response = post_json(request, &body).await?;
        Self::parse_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn driver() -> OpenAiDriver {
        OpenAiDriver::new(
            reqwest::Client::new(),
            "sk-test",
            "gpt-4o-mini",
            "https://api.openai.com",
        )
    }

    #[test]
    fn test_openai_build_body() {
        let prompt = Prompt::new(vec![Message::system("Be kind."), Message::user("Hello")])
            .with_temperature(0.7)
            .with_max_tokens(500);
        let body = driver().build_body(&prompt);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["max_tokens"], 500);
        assert!(body.get("response_format").is_none());

        let json_body = driver().build_body(&prompt.json());
        assert_eq!(json_body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_openai_parse_response() {
        let body = json!({
            "choices": [{"message": {"content": "Hi there!"}, "finish_reason": "stop"}],
        });
        assert_eq!(OpenAiDriver::parse_response(&body).unwrap(), "Hi there!");

        let missing = json!({ "choices": [] });
        assert!(matches!(
            OpenAiDriver::parse_response(&missing),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn test_openai_availability() {
        assert!(driver().is_available());
        let unset = OpenAiDriver::new(reqwest::Client::new(), " ", "m", "http://x");
        assert!(!unset.is_available());
    }
}
