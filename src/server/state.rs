use std::sync::Arc;
use tracing::info;

use crate::cache::TtlCache;
use crate::chart::RenderedChart;
use crate::config::Settings;
use crate::database::{ProjectStore, SupabaseStore};
use crate::drivers::{GeminiDriver, OpenAiDriver, TextProvider};
use crate::orchestrator::AiOrchestrator;
use crate::payments::CheckoutClient;
use crate::resilience::{RateLimiter, RateLimiterConfig};
use crate::transport::build_client;
use crate::types::ProjectIdea;
use crate::{Error, Result};

/// Everything a handler needs. Built once at startup and shared as `Arc<AppState>`.
pub struct AppState {
    pub settings: Settings,
    pub orchestrator: AiOrchestrator,
    pub ai_cache: Arc<TtlCache<ProjectIdea>>,
    pub chart_cache: Arc<TtlCache<RenderedChart>>,
    pub rate_limiter: RateLimiter,
    pub store: Option<Arc<dyn ProjectStore>>,
    pub checkout: CheckoutClient,
}

impl AppState {
    /// Production wiring: Gemini then OpenAI, Supabase when configured.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let http = build_client(&settings)?;
        let gemini = GeminiDriver::from_settings(http.clone(), &settings);
        let openai = OpenAiDriver::from_settings(http.clone(), &settings);
        let providers = vec![
            Arc::new(gemini) as Arc<dyn TextProvider>,
            Arc::new(openai) as Arc<dyn TextProvider>,
        ];
        let store = SupabaseStore::from_settings(http.clone(), &settings)?
            .map(|s| Arc::new(s) as Arc<dyn ProjectStore>);
        let checkout = CheckoutClient::from_settings(http, &settings);

        info!(
            gemini = settings.gemini_configured(),
            openai = settings.openai_configured(),
            database = store.is_some(),
            payments = checkout.is_configured(),
            "Services configured"
        );
        Ok(Self::with_parts(settings, providers, store, checkout))
    }

    /// Explicit wiring, used by tests to inject fake providers and stores.
    pub fn with_parts(
        settings: Settings,
        providers: Vec<Arc<dyn TextProvider>>,
        store: Option<Arc<dyn ProjectStore>>,
        checkout: CheckoutClient,
    ) -> Self {
        let ai_cache = Arc::new(TtlCache::new(
            "ai_responses",
            settings.ai_cache_ttl,
            settings.ai_cache_max_entries,
        ));
        let chart_cache = Arc::new(TtlCache::new(
            "graphs",
            settings.chart_cache_ttl,
            settings.chart_cache_max_entries,
        ));
        let rate_limiter = RateLimiter::new(
            RateLimiterConfig::new()
                .with_per_minute(settings.requests_per_minute)
                .with_per_hour(settings.requests_per_hour),
        );

        Self {
            orchestrator: AiOrchestrator::new(providers, ai_cache.clone()),
            ai_cache,
            chart_cache,
            rate_limiter,
            store,
            checkout,
            settings,
        }
    }

    /// The project store, or a database error when none is configured.
    pub fn store(&self) -> Result<&Arc<dyn ProjectStore>> {
        self.store.as_ref().ok_or_else(|| {
            Error::database(
                "Supabase client not initialized. Check your credentials.",
                "connect",
                None,
            )
        })
    }
}
