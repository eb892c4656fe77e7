//! Google Gemini generateContent API driver. Key differences from OpenAI:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - Roles: `user` and `model` (not `assistant`). System uses `system_instruction`.
//! - `generationConfig` wraps temperature, max_tokens (→ `maxOutputTokens`) and
//!   the JSON response mode (`responseMimeType`).
//! - Response: `candidates[0].content.parts[0].text`.
//! - API key goes in the `x-goog-api-key` header, never in the URL.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{Settings, GEMINI_PLACEHOLDER_KEY};
use crate::types::{Message, MessageRole, Prompt};

use super::{post_json, ProviderError, TextProvider};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiDriver {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiDriver {
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
            settings.gemini_api_key.clone(),
            settings.gemini_model.clone(),
            settings.gemini_base_url.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Separate system instructions from conversation contents.
    fn split_messages(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for m in messages {
            let role = match m.role {
                MessageRole::System => {
                    system_parts.push(&m.content);
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": m.content }],
            }));
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(json!({ "parts": [{ "text": system_parts.join("\n\n") }] }))
        };

        (system_instruction, contents)
    }

    fn build_body(prompt: &Prompt) -> Value {
        let (system_instruction, contents) = Self::split_messages(&prompt.messages);

        let mut body = json!({ "contents": contents });
        if let Some(sys) = system_instruction {
            body["system_instruction"] = sys;
        }

        let mut gen_config = json!({});
        if let Some(t) = prompt.temperature {
            gen_config["temperature"] = json!(t);
        }
        if let Some(mt) = prompt.max_tokens {
            gen_config["maxOutputTokens"] = json!(mt);
        }
        if prompt.json_output {
            gen_config["responseMimeType"] = json!("application/json");
        }
        if gen_config != json!({}) {
            body["generationConfig"] = gen_config;
        }
        body
    }

    fn parse_response(body: &Value) -> Result<String, ProviderError> {
        if let Some(reason) = body
            .pointer("/promptFeedback/blockReason")
            .and_then(|v| v.as_str())
        {
            return Err(ProviderError::Malformed(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let text = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl TextProvider for GeminiDriver {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != GEMINI_PLACEHOLDER_KEY
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::NotConfigured("Gemini".into()));
        }
        let body = Self::build_body(prompt);
        let request = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key);
        let response = post_json(request, &body).await?;
        Self::parse_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(key: &str) -> GeminiDriver {
        GeminiDriver::new(
            reqwest::Client::new(),
            key,
            "gemini-1.5-flash",
            "https://generativelanguage.googleapis.com/",
        )
    }

    #[test]
    fn test_gemini_system_instruction() {
        let msgs = vec![
            Message::system("Be concise."),
            Message::user("Explain photosynthesis."),
        ];
        let (sys, contents) = GeminiDriver::split_messages(&msgs);
        assert_eq!(
            sys.unwrap()["parts"][0]["text"].as_str().unwrap(),
            "Be concise."
        );
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn test_gemini_role_mapping() {
        let msgs = vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("Why is the sky blue?"),
        ];
        let (sys, contents) = GeminiDriver::split_messages(&msgs);
        assert!(sys.is_none());
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
    }

    #[test]
    fn test_gemini_build_body() {
        let prompt = Prompt::new(vec![Message::user("Hello")])
            .with_temperature(0.8)
            .with_max_tokens(500)
            .json();
        let body = GeminiDriver::build_body(&prompt);
        assert_eq!(body["generationConfig"]["temperature"], 0.8);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );

        let plain = GeminiDriver::build_body(&Prompt::new(vec![Message::user("Hello")]));
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn test_gemini_parse_response() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{"text": "  Hi!\n"}], "role": "model" },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(GeminiDriver::parse_response(&body).unwrap(), "Hi!");

        let empty = json!({ "candidates": [] });
        assert!(matches!(
            GeminiDriver::parse_response(&empty),
            Err(ProviderError::EmptyResponse)
        ));

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            GeminiDriver::parse_response(&blocked),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_gemini_availability() {
        assert!(driver("AIza-test").is_available());
        assert!(!driver("").is_available());
        assert!(!driver(GEMINI_PLACEHOLDER_KEY).is_available());
        assert_eq!(
            driver("k").endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
