//! Idea, chart and report generation plus project lookups.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::CallKey;
use crate::chart::{self, ChartData, ChartKind, RenderedChart, DEFAULT_TITLE};
use crate::server::error::ApiError;
use crate::server::extract::{ApiPath, ApiQuery};
use crate::server::state::AppState;
use crate::types::{Project, ProjectIdea, ProjectUpdate};
use crate::validators::{
    validate_chart_type, validate_grade, validate_list_input, validate_numeric_list,
    validate_title, validate_topic, ListBounds, DEFAULT_GRADE,
};
use crate::{Error, ErrorContext};

const MAX_SUBJECT_LENGTH: usize = 100;
const MAX_CHART_POINTS: usize = 50;
const DEFAULT_LIST_LIMIT: i64 = 10;
const MAX_LIST_LIMIT: i64 = 100;
const DEFAULT_GRAPH_DESCRIPTION: &str = "Sample graph data";

// ---------------------------------------------------------------------------
// GET /api/idea
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IdeaParams {
    pub topic: Option<String>,
    pub grade: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub save_to_db: bool,
}

#[derive(Debug, Serialize)]
pub struct IdeaResponse {
    #[serde(flatten)]
    pub idea: ProjectIdea,
    pub project_id: Option<String>,
}

/// `"{subject} - {topic}"`, or whichever of the two is present.
fn topic_text(subject: Option<&str>, topic: Option<&str>) -> Option<String> {
    match (subject, topic) {
        (Some(subject), Some(topic)) => Some(format!("{subject} - {topic}")),
        (Some(subject), None) => Some(subject.to_string()),
        (None, topic) => topic.map(str::to_string),
    }
}

fn validate_subject(subject: Option<&str>) -> crate::Result<Option<String>> {
    let Some(subject) = subject.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let len = subject.chars().count();
    if len > MAX_SUBJECT_LENGTH {
        return Err(Error::validation_with_value(
            format!("Subject too long (max {MAX_SUBJECT_LENGTH} characters)"),
            "subject",
            len,
        ));
    }
    Ok(Some(subject.to_string()))
}

pub async fn get_idea(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<IdeaParams>,
) -> Result<Json<IdeaResponse>, ApiError> {
    let topic = params
        .topic
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(validate_topic)
        .transpose()?;
    let grade = validate_grade(params.grade.as_deref().unwrap_or(DEFAULT_GRADE))?;
    let subject = validate_subject(params.subject.as_deref())?;

    let text = topic_text(subject.as_deref(), topic.as_deref());
    info!(topic = ?text, grade = %grade, "Generating idea");
    let idea = state.orchestrator.generate_idea(text.as_deref(), &grade).await?;

    let project_id = if params.save_to_db {
        let project = Project::from_idea(&idea, subject, Some(grade), topic, Utc::now());
        save_project(&state, &project).await
    } else {
        None
    };

    Ok(Json(IdeaResponse { idea, project_id }))
}

/// Best-effort insert; the generated idea is returned even when this fails.
async fn save_project(state: &AppState, project: &Project) -> Option<String> {
    let result = match state.store() {
        Ok(store) => store.insert(project).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(saved) => {
            info!(project_id = %saved.id, "Project saved to database");
            Some(saved.id)
        }
        Err(e) => {
            error!(error = %e, "Database save failed");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/graph
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GraphParams {
    pub title: Option<String>,
    pub chart_type: Option<String>,
    pub categories: Option<String>,
    pub values: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub graph_base64: String,
    pub description: String,
}

impl From<RenderedChart> for GraphResponse {
    fn from(chart: RenderedChart) -> Self {
        Self {
            graph_base64: chart.image_base64,
            description: chart.description,
        }
    }
}

pub async fn get_graph(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<GraphParams>,
) -> Result<Json<GraphResponse>, ApiError> {
    let title = match params.title.as_deref() {
        None | Some("") => DEFAULT_TITLE.to_string(),
        Some(title) => validate_title(title)?,
    };
    let kind = match params.chart_type.as_deref() {
        None | Some("") => ChartKind::Bar,
        Some(kind) => validate_chart_type(kind)?,
    };

    let bounds = ListBounds::default().with_max_items(MAX_CHART_POINTS);
    let categories = validate_list_input(params.categories.as_deref(), "categories", bounds)?;
    let values = validate_numeric_list(params.values.as_deref(), "values", bounds)?;
    if let (Some(c), Some(v)) = (&categories, &values) {
        if c.len() != v.len() {
            return Err(Error::validation(
                format!(
                    "Categories and values must have the same length (got {} and {})",
                    c.len(),
                    v.len()
                ),
                "categories,values",
            )
            .into());
        }
    }

    info!(kind = %kind, title = %title, "Generating chart");
    let explicit_values = values.is_some();
    let data = ChartData::from_parts(categories, values);

    // Sample and random-filled data must not be served twice.
    let key = data.as_ref().filter(|_| explicit_values).map(|d| {
        CallKey::new("render_chart")
            .kwarg("kind", kind.as_str())
            .kwarg("title", &title)
            .kwarg("categories", &d.categories)
            .kwarg("values", &d.values)
            .finish()
    });
    if let Some(hit) = key.as_ref().and_then(|k| state.chart_cache.get(k)) {
        debug!(kind = %kind, "Chart served from cache");
        return Ok(Json(hit.into()));
    }

    let rendered = tokio::task::spawn_blocking(move || chart::render_chart(kind, &title, data))
        .await
        .map_err(|e| {
            Error::runtime_with_context(
                format!("Failed to generate graph: {e}"),
                ErrorContext::new().with_source("chart"),
            )
        })??;

    if let Some(key) = key {
        state.chart_cache.set(&key, rendered.clone());
    }
    info!(bytes = rendered.image_base64.len(), "Graph generated");
    Ok(Json(rendered.into()))
}

// ---------------------------------------------------------------------------
// POST /api/report
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub project_id: Option<String>,
    pub idea: Option<String>,
    pub hypothesis: Option<String>,
    pub graph_description: Option<String>,
    #[serde(default)]
    pub save_to_db: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
    pub project_id: Option<String>,
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    let project_id = params.project_id.filter(|id| !id.trim().is_empty());
    let (idea, hypothesis) = match &project_id {
        Some(id) => {
            let project = state
                .store()?
                .get(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Project not found"))?;
            (Some(project.idea), Some(project.hypothesis))
        }
        None => (params.idea, params.hypothesis),
    };

    let (Some(idea), Some(hypothesis)) = (
        idea.filter(|s| !s.trim().is_empty()),
        hypothesis.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::http(
            StatusCode::BAD_REQUEST,
            "Either project_id or both idea and hypothesis must be provided",
        ));
    };
    let graph_description = params
        .graph_description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GRAPH_DESCRIPTION.to_string());

    let report = state
        .orchestrator
        .generate_report(&idea, &hypothesis, &graph_description)
        .await?;

    if params.save_to_db {
        if let Some(id) = &project_id {
            attach_report(&state, id, &report).await;
        }
    }

    Ok(Json(ReportResponse { report, project_id }))
}

/// Best-effort update; a failure is logged and the report still returned.
async fn attach_report(state: &AppState, project_id: &str, report: &str) {
    let update = ProjectUpdate::report(report, Utc::now());
    let result = match state.store() {
        Ok(store) => store.update(project_id, &update).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(Some(_)) => info!(project_id, "Report saved to project"),
        Ok(None) => error!(project_id, "Failed to update project with report: not found"),
        Err(e) => error!(project_id, error = %e, "Failed to update project with report"),
    }
}

// ---------------------------------------------------------------------------
// /api/projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(Error::validation_with_value(
            format!("Limit must be between 1 and {MAX_LIST_LIMIT}"),
            "limit",
            limit,
        )
        .into());
    }
    let projects = state.store()?.list(limit as usize).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<Json<Project>, ApiError> {
    state
        .store()?
        .get(&project_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.store()?.delete(&project_id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    info!(project_id = %project_id, "Project deleted");
    Ok(Json(json!({
        "message": "Project deleted successfully",
        "project_id": project_id,
    })))
}
