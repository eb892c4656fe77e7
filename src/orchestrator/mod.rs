//! # AI Orchestrator
//!
//! Runs a prompt against an ordered list of [`TextProvider`]s. The first
//! available provider that answers wins; failures are logged and the next
//! provider is tried. Only when every attempt fails does the caller see an
//! error:
//!
//! - no provider configured at all → [`Error::NoAiService`]
//! - every configured provider failed → [`Error::AiService`] naming the last one
//!
//! Idea generation is memoised in the shared AI-response cache.

pub mod idea;
pub mod prompts;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CallKey, TtlCache};
use crate::drivers::TextProvider;
use crate::types::{Message, ProjectIdea, Prompt};
use crate::{Error, Result};

pub use idea::IdeaOutcome;

pub struct AiOrchestrator {
    providers: Vec<Arc<dyn TextProvider>>,
    idea_cache: Arc<TtlCache<ProjectIdea>>,
}

impl AiOrchestrator {
    /// `providers` are tried in order; put the primary first.
    pub fn new(providers: Vec<Arc<dyn TextProvider>>, idea_cache: Arc<TtlCache<ProjectIdea>>) -> Self {
        for p in providers.iter().filter(|p| !p.is_available()) {
            warn!(provider = p.name(), "AI provider not configured");
        }
        Self {
            providers,
            idea_cache,
        }
    }

    pub fn providers(&self) -> &[Arc<dyn TextProvider>] {
        &self.providers
    }

    pub fn is_provider_available(&self, name: &str) -> bool {
        self.providers
            .iter()
            .any(|p| p.name() == name && p.is_available())
    }

    pub fn has_available_provider(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }

    async fn complete(&self, prompt: &Prompt, task: &str) -> Result<String> {
        let mut last_failure: Option<(String, String)> = None;

        for provider in self.providers.iter().filter(|p| p.is_available()) {
            debug!(provider = provider.name(), task, "Attempting AI generation");
            match provider.generate(prompt).await {
                Ok(text) => {
                    info!(provider = provider.name(), task, "AI generation successful");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        task,
                        error = %e,
                        "AI provider failed, trying next"
                    );
                    last_failure = Some((provider.name().to_string(), e.to_string()));
                }
            }
        }

        match last_failure {
            Some((service, message)) => Err(Error::ai_service(
                service,
                format!("Failed to generate {}: {}", task, message),
            )),
            None => {
                tracing::error!(task, "No AI service configured");
                Err(Error::NoAiService)
            }
        }
    }

    /// Generate a project idea, served from cache for repeated `(topic, grade)`.
    pub async fn generate_idea(&self, topic: Option<&str>, grade: &str) -> Result<ProjectIdea> {
        let key = CallKey::new("generate_project_idea")
            .kwarg("topic", topic)
            .kwarg("grade", grade)
            .finish();

        if let Some(hit) = self.idea_cache.get(&key) {
            debug!(key = key.short(), "Idea served from cache");
            return Ok(hit);
        }

        let topic = topic.unwrap_or(prompts::DEFAULT_TOPIC);
        info!(topic, grade, "Generating project idea");
        let raw = self
            .complete(&prompts::idea_prompt(topic, grade), "project idea")
            .await?;

        let outcome = IdeaOutcome::parse(&raw, topic);
        if !outcome.is_structured() {
            warn!(topic, "Provider answered without JSON, synthesizing idea fields");
        }
        let idea = outcome.into_idea();
        self.idea_cache.set(&key, idea.clone());
        Ok(idea)
    }

    pub async fn generate_chat_reply(
        &self,
        message: &str,
        context: Option<&str>,
        history: &[Message],
    ) -> Result<String> {
        let preview: String = message.chars().take(50).collect();
        info!(message = %preview, "Generating chat response");
        let text = self
            .complete(&prompts::chat_prompt(message, context, history), "chat response")
            .await?;
        Ok(text.trim().to_string())
    }

    /// Markdown report combining idea, hypothesis and a chart description.
    pub async fn generate_report(
        &self,
        idea: &str,
        hypothesis: &str,
        graph_description: &str,
    ) -> Result<String> {
        info!("Generating comprehensive report");
        let text = self
            .complete(
                &prompts::report_prompt(idea, hypothesis, graph_description),
                "report",
            )
            .await?;
        Ok(text.trim().to_string())
    }
}

impl std::fmt::Debug for AiOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("AiOrchestrator")
            .field("providers", &names)
            .finish()
    }
}
