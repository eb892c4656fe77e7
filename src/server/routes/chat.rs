//! AI mentor chat: free-form questions, concept explanations and project reviews.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::orchestrator::prompts;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::server::state::AppState;
use crate::types::{Message, MessageRole};
use crate::validators::{validate_grade, validate_message, validate_topic, DEFAULT_GRADE};

const MAX_SUGGESTIONS: usize = 4;

/// One turn of client-held conversation history.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        Message {
            role: MessageRole::from_client(&turn.role),
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub suggestions: Vec<String>,
}

impl ChatResponse {
    fn new(message: String, suggestions: Vec<String>) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
            suggestions,
        }
    }
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = validate_message(&request.message)?;
    let history: Vec<Message> = request
        .history
        .iter()
        .flatten()
        .map(Message::from)
        .collect();

    let reply = state
        .orchestrator
        .generate_chat_reply(&message, request.context.as_deref(), &history)
        .await?;
    let suggestions = follow_up_suggestions(&message);
    Ok(Json(ChatResponse::new(reply, suggestions)))
}

#[derive(Debug, Deserialize)]
pub struct ExplainParams {
    pub concept: String,
    pub grade: Option<String>,
    pub project_context: Option<String>,
}

pub async fn explain_concept(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ExplainParams>,
) -> Result<Json<ChatResponse>, ApiError> {
    let concept = validate_topic(&params.concept)?;
    let grade = validate_grade(params.grade.as_deref().unwrap_or(DEFAULT_GRADE))?;
    info!(concept = %concept, grade = %grade, "Explaining concept");

    let context = params.project_context.as_deref();
    let request = prompts::explain_request(&concept, &grade, context);
    let explanation = state
        .orchestrator
        .generate_chat_reply(&request, context, &[])
        .await?;

    let suggestions = vec![
        format!("How can I demonstrate {concept} in an experiment?"),
        format!("What are real-world examples of {concept}?"),
        format!("What materials do I need to study {concept}?"),
        "Can you suggest a hypothesis?".to_string(),
    ];
    Ok(Json(ChatResponse::new(explanation, suggestions)))
}

#[derive(Debug, Deserialize)]
pub struct ImprovementParams {
    pub project_idea: String,
    pub hypothesis: String,
}

pub async fn suggest_improvements(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ImprovementParams>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!("Generating project improvement suggestions");
    let request = prompts::improvement_request(&params.project_idea, &params.hypothesis);
    let context = format!("Project: {}", params.project_idea);
    let review = state
        .orchestrator
        .generate_chat_reply(&request, Some(&context), &[])
        .await?;
    Ok(Json(ChatResponse::new(review, Vec::new())))
}

/// Keyword-driven follow-up questions, deduplicated and capped at four.
pub fn follow_up_suggestions(user_message: &str) -> Vec<String> {
    let lower = user_message.to_lowercase();
    let mut candidates: Vec<&str> = Vec::new();

    if lower.contains("how") {
        candidates.extend(["Can you give me an example?", "What materials would I need?"]);
    }
    if lower.contains("what") {
        candidates.extend([
            "How does this work in practice?",
            "Can you explain this differently?",
        ]);
    }
    if lower.contains("why") {
        candidates.extend([
            "How can I demonstrate this?",
            "What experiment could show this?",
        ]);
    }
    candidates.extend([
        "Can you explain this more simply?",
        "How can I test this hypothesis?",
        "What are some common mistakes to avoid?",
    ]);

    let mut suggestions: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
    for candidate in candidates {
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
        if !suggestions.iter().any(|s| s == candidate) {
            suggestions.push(candidate.to_string());
        }
    }
    suggestions
}
