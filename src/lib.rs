//! # science-builder
//!
//! Backend for the AI Science Builder: generates science-project ideas,
//! mentor chat replies and markdown reports through interchangeable AI text
//! providers, renders data charts, and persists projects to Supabase.
//!
//! ## Overview
//!
//! The HTTP surface is thin. The interesting parts sit underneath it:
//!
//! - **Provider fallback**: Gemini is tried first, OpenAI second; a failure is
//!   logged and the next provider takes over.
//! - **Caching**: idea generations and rendered charts are memoised in bounded
//!   TTL caches with FIFO eviction.
//! - **Throttling**: every client is held to per-minute and per-hour sliding
//!   windows.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use science_builder::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> science_builder::Result<()> {
//!     let settings = Settings::from_env()?;
//!     science_builder::server::serve(settings).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`validators`] | Input sanitisation and normalisation |
//! | [`cache`] | TTL caches and deterministic call keys |
//! | [`resilience`] | Sliding-window rate limiter |
//! | [`drivers`] | Gemini and OpenAI text providers |
//! | [`orchestrator`] | Provider fallback, prompts and idea parsing |
//! | [`chart`] | PNG chart rendering and data summaries |
//! | [`database`] | Project persistence (Supabase, in-memory) |
//! | [`payments`] | Lemon Squeezy checkout sessions |
//! | [`server`] | axum routes and middleware |
//! | [`config`] | Environment-driven settings |
//! | [`types`] | Prompts, messages and project records |

pub mod cache;
pub mod chart;
pub mod config;
pub mod database;
pub mod drivers;
pub mod orchestrator;
pub mod payments;
pub mod resilience;
pub mod server;
pub mod transport;
pub mod types;
pub mod validators;

pub use config::Settings;
pub use types::{Message, MessageRole, Project, ProjectIdea};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
