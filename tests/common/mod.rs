//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use mockito::{Mock, Server, ServerGuard};
use science_builder::config::Settings;
use science_builder::database::{MemoryProjectStore, ProjectStore};
use science_builder::drivers::{ProviderError, TextProvider};
use science_builder::payments::CheckoutClient;
use science_builder::server::{build_router, AppState};
use science_builder::types::{Project, ProjectUpdate, Prompt};
use science_builder::{Error, ErrorContext};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Settings from an explicit key list; everything else takes its default.
pub fn settings(vars: &[(&str, &str)]) -> Settings {
    let vars: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(move |key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test settings")
}

/// Provider with a canned reply that records every prompt it sees.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: &'static str,
    available: bool,
    reply: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedProvider {
    pub fn replying(name: &'static str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: true,
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn unconfigured(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            available: false,
            reply: Err("not configured".to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_text(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .and_then(|p| p.last_user_text().map(str::to_string))
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone().map_err(|message| ProviderError::Status {
            status: 500,
            message,
        })
    }
}

/// Store whose every call fails with an internal error.
pub struct BrokenStore;

fn broken() -> Error {
    Error::runtime_with_context("disk full", ErrorContext::new().with_source("store"))
}

#[async_trait]
impl ProjectStore for BrokenStore {
    async fn insert(&self, _project: &Project) -> science_builder::Result<Project> {
        Err(broken())
    }

    async fn get(&self, _id: &str) -> science_builder::Result<Option<Project>> {
        Err(broken())
    }

    async fn list(&self, _limit: usize) -> science_builder::Result<Vec<Project>> {
        Err(broken())
    }

    async fn update(
        &self,
        _id: &str,
        _update: &ProjectUpdate,
    ) -> science_builder::Result<Option<Project>> {
        Err(broken())
    }

    async fn delete(&self, _id: &str) -> science_builder::Result<bool> {
        Err(broken())
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Router plus handles on the collaborators it was built from.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new(
        settings: Settings,
        providers: Vec<Arc<dyn TextProvider>>,
        store: Option<Arc<dyn ProjectStore>>,
    ) -> Self {
        let checkout = CheckoutClient::from_settings(reqwest::Client::new(), &settings);
        let state = Arc::new(AppState::with_parts(settings, providers, store, checkout));
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Single provider, in-memory store, default settings.
    pub fn with_provider(provider: &Arc<ScriptedProvider>, store: &Arc<MemoryProjectStore>) -> Self {
        Self::new(
            settings(&[]),
            vec![provider.clone() as Arc<dyn TextProvider>],
            Some(store.clone() as Arc<dyn ProjectStore>),
        )
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> TestResponse {
        self.send(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }
}

/// Test fixture that manages a mock upstream server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// JSON response for `method path`, any query string.
    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, path)
            .match_query(mockito::Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
