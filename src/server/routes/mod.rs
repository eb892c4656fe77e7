//! Route table.
//!
//! | Group | Prefix | Handlers |
//! |-------|--------|----------|
//! | [`system`] | `/`, `/health`, `/api/cache` | service info, health, cache stats/clear |
//! | [`projects`] | `/api` | idea, graph, report, project CRUD |
//! | [`chat`] | `/api/chat` | mentor chat, explanations, reviews |
//! | [`payments`] | `/api/payments` | checkout sessions |

pub mod chat;
pub mod payments;
pub mod projects;
pub mod system;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use super::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/api/cache/stats", get(system::cache_stats))
        .route("/api/cache/clear", post(system::clear_caches))
        .route("/api/idea", get(projects::get_idea))
        .route("/api/graph", get(projects::get_graph))
        .route("/api/report", post(projects::create_report))
        .route("/api/projects", get(projects::list_projects))
        .route(
            "/api/projects/:project_id",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/api/chat/message", post(chat::send_message))
        .route("/api/chat/explain", post(chat::explain_concept))
        .route("/api/chat/suggest-improvements", post(chat::suggest_improvements))
        .route("/api/payments/checkout", post(payments::create_checkout))
        .fallback(system::not_found)
}
