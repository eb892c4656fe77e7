//! Request middleware: rate limiting, security headers, debug error detail.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use super::error::{ApiError, InternalDetail};
use super::state::AppState;
use crate::resilience::UNKNOWN_CLIENT;

/// Paths that are never counted or decorated with rate-limit headers.
pub const RATE_LIMIT_EXEMPT: [&str; 5] = ["/", "/health", "/docs", "/redoc", "/openapi.json"];

pub const LIMIT_MINUTE: &str = "x-ratelimit-limit-minute";
pub const REMAINING_MINUTE: &str = "x-ratelimit-remaining-minute";
pub const LIMIT_HOUR: &str = "x-ratelimit-limit-hour";
pub const REMAINING_HOUR: &str = "x-ratelimit-remaining-hour";

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    img-src 'self' data: https:; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    font-src 'self' data:; \
    connect-src 'self' https://firebasestorage.googleapis.com https://identitytoolkit.googleapis.com;";

/// First `X-Forwarded-For` entry, else the peer IP, else the shared sentinel.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if RATE_LIMIT_EXEMPT.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_id(req.headers(), peer);

    let decision = state.rate_limiter.check(&client);
    if !decision.allowed {
        let retry_after = decision.retry_after.unwrap_or(1);
        return ApiError::RateLimited { retry_after }.into_response();
    }

    let mut response = next.run(req).await;

    let limiter = &state.rate_limiter;
    let remaining = limiter.remaining(limiter.usage(&client));
    let cfg = limiter.config();
    let headers = response.headers_mut();
    for (name, value) in [
        (LIMIT_MINUTE, cfg.requests_per_minute),
        (REMAINING_MINUTE, remaining.minute),
        (LIMIT_HOUR, cfg.requests_per_hour),
        (REMAINING_HOUR, remaining.hour),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
    response
}

pub async fn security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    if !state.settings.debug {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
    response
}

/// In debug mode, replace the generic 500 message with the hidden detail.
pub async fn reveal_internal_detail(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if !state.settings.debug {
        return response;
    }
    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned() else {
        return response;
    };

    let status = response.status();
    let (parts, _) = response.into_parts();
    let mut revealed =
        (status, Json(json!({ "error": "InternalServerError", "message": detail }))).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            revealed.headers_mut().append(name.clone(), value.clone());
        }
    }
    revealed
}
