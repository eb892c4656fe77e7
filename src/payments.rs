//! Lemon Squeezy checkout sessions.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Settings;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};

const JSON_API: &str = "application/vnd.api+json";

/// A created checkout, reduced to what the frontend needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutClient {
    http: reqwest::Client,
    api_key: String,
    store_id: String,
    base_url: String,
}

impl CheckoutClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        store_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            store_id: store_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(http: reqwest::Client, settings: &Settings) -> Self {
        Self::new(
            http,
            settings.lemon_squeezy_api_key.clone(),
            settings.lemon_squeezy_store_id.clone(),
            settings.lemon_squeezy_base_url.clone(),
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn body(&self, variant_id: &str, email: &str) -> Value {
        json!({
            "data": {
                "type": "checkouts",
                "attributes": {
                    "checkout_data": { "email": email }
                },
                "relationships": {
                    "store": { "data": { "type": "stores", "id": self.store_id } },
                    "variant": { "data": { "type": "variants", "id": variant_id } }
                }
            }
        })
    }

    /// Create a checkout for `variant_id`; anything but `201 Created` is an error.
    ///
    /// Upstream 4xx/5xx statuses are kept; any other unexpected status becomes 502.
    pub async fn create_checkout(&self, variant_id: &str, email: &str) -> Result<CheckoutSession> {
        if !self.is_configured() {
            return Err(Error::configuration_with_context(
                "Lemon Squeezy API key not configured",
                ErrorContext::new().with_field_path("LEMON_SQUEEZY_API_KEY"),
            ));
        }

        let response = self
            .http
            .post(format!("{}/v1/checkouts", self.base_url))
            .bearer_auth(&self.api_key)
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
            .body(self.body(variant_id, email).to_string())
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        if status != StatusCode::CREATED {
            warn!(status = status.as_u16(), variant_id, "Checkout creation failed");
            let status = if status.is_client_error() || status.is_server_error() {
                status
            } else {
                StatusCode::BAD_GATEWAY
            };
            return Err(Error::Remote {
                status: status.as_u16(),
                message: "Failed to create checkout".to_string(),
            });
        }

        let payload: Value = response.json().await.map_err(TransportError::from)?;
        let session = CheckoutSession {
            id: payload
                .pointer("/data/id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            url: payload
                .pointer("/data/attributes/url")
                .and_then(|v| v.as_str())
                .map(String::from),
        };
        info!(checkout_id = %session.id, "Checkout created");
        Ok(session)
    }
}
