//! HTTP error mapping.
//!
//! Every failure leaves the server as a JSON object with an `error` kind and a
//! `message`. Internal failures hide their detail; the [`InternalDetail`]
//! extension carries it so the debug-mode middleware can reveal it.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::Error;

pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Hidden detail of a 500 response, attached as a response extension.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

#[derive(Debug)]
pub enum ApiError {
    /// A failure from the library layer.
    Core(Error),
    /// Explicit status with a message (`HTTPException` in the body).
    Http { status: StatusCode, message: String },
    /// Malformed query string, path or JSON body.
    InvalidRequest(String),
    /// Request refused by the rate limiter.
    RateLimited { retry_after: u64 },
}

impl ApiError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => core_status(e),
            ApiError::Http { status, .. } => *status,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

fn core_status(err: &Error) -> StatusCode {
    match err {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::NoAiService | Error::AiService { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        // Only upstream failures pass through; a stray 2xx/3xx must not read as success.
        Error::Remote { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        Error::Database { .. }
        | Error::Configuration { .. }
        | Error::Runtime { .. }
        | Error::Transport(_)
        | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GeminiServiceError` / `OpenAIServiceError` for a named provider, `AIServiceError` otherwise.
fn ai_error_kind(service: &str) -> &'static str {
    match service {
        "gemini" => "GeminiServiceError",
        "openai" => "OpenAIServiceError",
        _ => "AIServiceError",
    }
}

fn core_body(err: &Error) -> (Value, Option<InternalDetail>) {
    match err {
        Error::Validation { message, field, .. } => (
            json!({ "error": "ValidationError", "message": message, "field": field }),
            None,
        ),
        Error::NoAiService => (
            json!({
                "error": "AIServiceError",
                "message": err.to_string(),
                "service": "unknown",
                "details": {},
            }),
            None,
        ),
        Error::AiService { service, message } => (
            json!({
                "error": ai_error_kind(service),
                "message": message,
                "service": service,
                "details": {},
            }),
            None,
        ),
        Error::Database {
            message,
            operation,
            table,
        } => (
            json!({
                "error": "DatabaseError",
                "message": message,
                "operation": operation,
                "table": table,
            }),
            None,
        ),
        Error::NotFound(message) | Error::Remote { message, .. } => {
            (json!({ "error": "HTTPException", "message": message }), None)
        }
        Error::Configuration { .. }
        | Error::Runtime { .. }
        | Error::Transport(_)
        | Error::Serialization(_) => (
            json!({ "error": "InternalServerError", "message": INTERNAL_MESSAGE }),
            Some(InternalDetail(err.to_string())),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut retry_after = None;

        let (body, detail) = match &self {
            ApiError::Core(err) => {
                if status.is_server_error() {
                    error!(status = status.as_u16(), error = %err, "Request failed");
                } else {
                    warn!(status = status.as_u16(), error = %err, "Request rejected");
                }
                core_body(err)
            }
            ApiError::Http { message, .. } => {
                (json!({ "error": "HTTPException", "message": message }), None)
            }
            ApiError::InvalidRequest(details) => {
                warn!(details = %details, "Request validation error");
                (
                    json!({
                        "error": "ValidationError",
                        "message": "Invalid request parameters",
                        "details": details,
                    }),
                    None,
                )
            }
            ApiError::RateLimited { retry_after: secs } => {
                retry_after = Some(*secs);
                (
                    json!({
                        "error": "RateLimitError",
                        "message": format!("Rate limit exceeded. Try again in {} seconds.", secs),
                        "retry_after": secs,
                    }),
                    None,
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if let Some(detail) = detail {
            response.extensions_mut().insert(detail);
        }
        response
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad", "topic"), StatusCode::BAD_REQUEST),
            (Error::NoAiService, StatusCode::SERVICE_UNAVAILABLE),
            (Error::ai_service("openai", "down"), StatusCode::SERVICE_UNAVAILABLE),
            (
                Error::database("boom", "insert", Some("projects")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::NotFound("Project not found".into()), StatusCode::NOT_FOUND),
            (
                Error::Remote {
                    status: 402,
                    message: "Failed to create checkout".into(),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                Error::Remote {
                    status: 302,
                    message: "Failed to create checkout".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                Error::Remote {
                    status: 200,
                    message: "Failed to create checkout".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_ai_error_kinds() {
        let (body, _) = core_body(&Error::ai_service("gemini", "quota"));
        assert_eq!(body["error"], "GeminiServiceError");
        assert_eq!(body["service"], "gemini");

        let (body, _) = core_body(&Error::NoAiService);
        assert_eq!(body["error"], "AIServiceError");
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = Error::runtime_with_context("disk on fire", Default::default());
        let (body, detail) = core_body(&err);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(detail.unwrap().0.contains("disk on fire"));
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = ApiError::RateLimited { retry_after: 51 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "51");
    }
}
