//! Supabase (PostgREST) client for the `projects` table.
//!
//! Every request carries the service key twice: as `apikey` and as a bearer
//! token. Writes ask for `Prefer: return=representation` so the stored row
//! comes back in the response.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{ProjectStore, PROJECTS_TABLE};
use crate::config::Settings;
use crate::types::{Project, ProjectUpdate};
use crate::{Error, ErrorContext, Result};

const RETURN_REPRESENTATION: &str = "return=representation";

pub struct SupabaseStore {
    http: reqwest::Client,
    table_url: String,
    headers: HeaderMap,
}

impl SupabaseStore {
    pub fn new(http: reqwest::Client, base_url: &str, key: &str) -> Result<Self> {
        let invalid_key = |e: reqwest::header::InvalidHeaderValue| {
            Error::configuration_with_context(
                format!("SUPABASE_KEY is not a valid header value: {}", e),
                ErrorContext::new().with_field_path("SUPABASE_KEY"),
            )
        };
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key)).map_err(invalid_key)?,
        );

        Ok(Self {
            http,
            table_url: format!(
                "{}/rest/v1/{}",
                base_url.trim_end_matches('/'),
                PROJECTS_TABLE
            ),
            headers,
        })
    }

    /// `None` when the database is not configured.
    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Result<Option<Self>> {
        if !settings.database_configured() {
            return Ok(None);
        }
        Self::new(http, &settings.supabase_url, &settings.supabase_key).map(Some)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, &self.table_url)
            .headers(self.headers.clone())
    }

    fn by_id(builder: RequestBuilder, id: &str) -> RequestBuilder {
        builder.query(&[("id", format!("eq.{}", id))])
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, operation: &str) -> Result<T> {
        let db_err = |msg: String| Error::database(msg, operation, Some(PROJECTS_TABLE));

        let response = builder
            .send()
            .await
            .map_err(|e| db_err(format!("Database request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| db_err(format!("Failed to read database response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(db_err(format!(
                "Database returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        debug!(operation, status = status.as_u16(), "Database call succeeded");
        serde_json::from_str(&body)
            .map_err(|e| db_err(format!("Unexpected database response: {}", e)))
    }
}

#[async_trait]
impl ProjectStore for SupabaseStore {
    async fn insert(&self, project: &Project) -> Result<Project> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(project);
        let mut rows: Vec<Project> = self.send(builder, "insert").await?;
        Ok(if rows.is_empty() {
            project.clone()
        } else {
            rows.swap_remove(0)
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Project>> {
        let builder = Self::by_id(self.request(Method::GET), id).query(&[("select", "*")]);
        let rows: Vec<Project> = self.send(builder, "select").await?;
        Ok(rows.into_iter().next())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Project>> {
        let builder = self.request(Method::GET).query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        self.send(builder, "select").await
    }

    async fn update(&self, id: &str, update: &ProjectUpdate) -> Result<Option<Project>> {
        let builder = Self::by_id(self.request(Method::PATCH), id)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(update);
        let rows: Vec<Project> = self.send(builder, "update").await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let builder =
            Self::by_id(self.request(Method::DELETE), id).header("Prefer", RETURN_REPRESENTATION);
        let rows: Vec<Value> = self.send(builder, "delete").await?;
        Ok(!rows.is_empty())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
