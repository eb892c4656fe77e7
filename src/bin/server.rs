//! AI Science Builder API server.
//!
//! Configuration comes from the environment (and `.env`); `RUST_LOG`
//! overrides the default log level.

use science_builder::config::Settings;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    let default_level = if settings.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();

    science_builder::server::serve(settings).await?;
    Ok(())
}
