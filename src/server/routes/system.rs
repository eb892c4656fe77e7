//! Service info, health and cache administration.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::server::error::ApiError;
use crate::server::state::AppState;

pub const SERVICE_NAME: &str = "AI Science Builder API";
pub const API_VERSION: &str = "2.0.0";

pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": API_VERSION,
        "status": "running",
        "description": "AI-powered science project generator",
        "ai_services": {
            "gemini": state.orchestrator.is_provider_available("gemini"),
            "openai": state.orchestrator.is_provider_available("openai"),
        },
        "endpoints": {
            "docs": "/docs",
            "health": "/health",
            "idea": "/api/idea",
            "graph": "/api/graph",
            "report": "/api/report",
            "projects": "/api/projects",
            "chat": "/api/chat/message",
            "cache_stats": "/api/cache/stats",
        },
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let settings = &state.settings;
    Json(json!({
        "status": "healthy",
        "version": API_VERSION,
        "debug_mode": settings.debug,
        "services": {
            "gemini_available": state.orchestrator.is_provider_available("gemini"),
            "openai_available": state.orchestrator.is_provider_available("openai"),
            "database_available": state.store.is_some(),
            "firebase_available": settings.firebase_configured(),
        },
        "cache": cache_snapshot(&state),
    }))
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(cache_snapshot(&state))
}

/// Only available in debug mode.
pub async fn clear_caches(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    if !state.settings.debug {
        return Err(ApiError::http(
            StatusCode::FORBIDDEN,
            "Cache clearing only allowed in debug mode",
        ));
    }
    state.ai_cache.clear();
    state.chart_cache.clear();
    info!("All caches cleared");
    Ok(Json(json!({ "message": "All caches cleared successfully" })))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route not found: {}", uri.path()))
}

fn cache_snapshot(state: &AppState) -> Value {
    json!({
        "ai_responses": state.ai_cache.stats(),
        "graphs": state.chart_cache.stats(),
    })
}
