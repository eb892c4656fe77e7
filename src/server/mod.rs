//! # HTTP Surface
//!
//! axum router, middleware stack and the serve loop.
//!
//! Layers, outermost first:
//!
//! 1. security headers
//! 2. CORS (local dev origins plus `FRONTEND_URL`)
//! 3. per-client rate limiting
//! 4. debug-mode reveal of internal error detail

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::Settings;
use crate::{Error, ErrorContext, Result};

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost",
    "http://127.0.0.1:5173",
];

fn cors_layer(settings: &Settings) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = DEV_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();
    if let Some(frontend) = &settings.frontend_url {
        match HeaderValue::from_str(frontend.trim_end_matches('/')) {
            Ok(origin) => origins.push(origin),
            Err(e) => warn!(frontend_url = %frontend, error = %e, "Ignoring invalid FRONTEND_URL"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([
            HeaderName::from_static(middleware::LIMIT_MINUTE),
            HeaderName::from_static(middleware::REMAINING_MINUTE),
            HeaderName::from_static(middleware::LIMIT_HOUR),
            HeaderName::from_static(middleware::REMAINING_HOUR),
        ])
}

/// Full application router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.settings);
    routes::router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::reveal_internal_detail,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security_headers,
        ))
        .with_state(state)
}

/// Wire collaborators from `settings`, bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(settings: Settings) -> Result<()> {
    info!(
        version = routes::system::API_VERSION,
        debug = settings.debug,
        "Starting AI Science Builder API"
    );
    let address = settings.bind_address();
    let state = Arc::new(AppState::from_settings(settings)?);
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await.map_err(|e| {
        Error::configuration_with_context(
            format!("failed to bind {address}"),
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("server"),
        )
    })?;
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| {
        Error::runtime_with_context(
            "server terminated with an error",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("server"),
        )
    })?;

    info!("Shutting down AI Science Builder API");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
