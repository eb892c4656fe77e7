//! Environment-driven settings.
//!
//! Every value has a default so the server starts with an empty environment;
//! unset credentials simply leave the matching collaborator unconfigured.

use crate::error::{Error, ErrorContext};
use crate::Result;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Placeholder value shipped in the example `.env`; treated as "not configured".
pub const GEMINI_PLACEHOLDER_KEY: &str = "your-gemini-api-key-here";

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,

    pub supabase_url: String,
    pub supabase_key: String,
    pub firebase_credentials_path: String,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,

    pub lemon_squeezy_api_key: String,
    pub lemon_squeezy_store_id: String,
    pub lemon_squeezy_base_url: String,

    pub frontend_url: Option<String>,

    pub requests_per_minute: usize,
    pub requests_per_hour: usize,

    pub ai_cache_ttl: Duration,
    pub ai_cache_max_entries: usize,
    pub chart_cache_ttl: Duration,
    pub chart_cache_max_entries: usize,

    pub http_timeout_secs: u64,
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => {
                return Err(Error::configuration_with_context(
                    "failed to read .env file",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("settings"),
                ))
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let settings = Self {
            host: text("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 8000)?,
            debug: text("DEBUG", "false").eq_ignore_ascii_case("true"),

            supabase_url: text("SUPABASE_URL", ""),
            supabase_key: text("SUPABASE_KEY", ""),
            firebase_credentials_path: text("FIREBASE_CREDENTIALS_PATH", ""),

            gemini_api_key: text("GEMINI_API_KEY", ""),
            gemini_model: text("GEMINI_MODEL", "gemini-1.5-flash"),
            gemini_base_url: text(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),

            openai_api_key: text("OPENAI_API_KEY", ""),
            openai_model: text("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: text("OPENAI_BASE_URL", "https://api.openai.com"),

            lemon_squeezy_api_key: text("LEMON_SQUEEZY_API_KEY", ""),
            lemon_squeezy_store_id: text("LEMON_SQUEEZY_STORE_ID", ""),
            lemon_squeezy_base_url: text(
                "LEMON_SQUEEZY_BASE_URL",
                "https://api.lemonsqueezy.com",
            ),

            frontend_url: lookup("FRONTEND_URL").filter(|v| !v.trim().is_empty()),

            requests_per_minute: parse(&lookup, "RATE_LIMIT_PER_MINUTE", 60)?,
            requests_per_hour: parse(&lookup, "RATE_LIMIT_PER_HOUR", 1000)?,

            ai_cache_ttl: Duration::from_secs(parse(&lookup, "AI_CACHE_TTL_SECS", 3600)?),
            ai_cache_max_entries: parse(&lookup, "AI_CACHE_MAX_ENTRIES", 500)?,
            chart_cache_ttl: Duration::from_secs(parse(&lookup, "CHART_CACHE_TTL_SECS", 7200)?),
            chart_cache_max_entries: parse(&lookup, "CHART_CACHE_MAX_ENTRIES", 200)?,

            http_timeout_secs: parse(&lookup, "AI_HTTP_TIMEOUT_SECS", 30)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("GEMINI_BASE_URL", &self.gemini_base_url),
            ("OPENAI_BASE_URL", &self.openai_base_url),
            ("LEMON_SQUEEZY_BASE_URL", &self.lemon_squeezy_base_url),
        ] {
            check_url(key, value)?;
        }
        if !self.supabase_url.is_empty() {
            check_url("SUPABASE_URL", &self.supabase_url)?;
        }
        if self.ai_cache_max_entries == 0 || self.chart_cache_max_entries == 0 {
            return Err(Error::configuration_with_context(
                "cache capacity must be at least 1",
                ErrorContext::new().with_source("settings"),
            ));
        }
        Ok(())
    }

    pub fn gemini_configured(&self) -> bool {
        !self.gemini_api_key.is_empty() && self.gemini_api_key != GEMINI_PLACEHOLDER_KEY
    }

    pub fn openai_configured(&self) -> bool {
        !self.openai_api_key.is_empty()
    }

    pub fn database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_key.is_empty()
    }

    pub fn firebase_configured(&self) -> bool {
        !self.firebase_credentials_path.is_empty()
    }

    pub fn payments_configured(&self) -> bool {
        !self.lemon_squeezy_api_key.is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            Error::configuration_with_context(
                format!("invalid value for {key}"),
                ErrorContext::new()
                    .with_field_path(key)
                    .with_details(format!("{raw:?}: {e}"))
                    .with_source("settings"),
            )
        }),
    }
}

fn check_url(key: &str, value: &str) -> Result<()> {
    url::Url::parse(value).map(|_| ()).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL for {key}"),
            ErrorContext::new()
                .with_field_path(key)
                .with_details(format!("{value:?}: {e}"))
                .with_source("settings"),
        )
    })
}
