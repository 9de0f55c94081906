//! # Herald Agent
//!
//! Development host for Herald push registration and dispatch.
//!
//! ## Usage
//!
//! ```bash
//! # Register with a development token and dispatch notifications from a file
//! HERALD_APP_ID=a1b2c3 HERALD_DEVELOPMENT=1 herald < notifications.jsonl
//!
//! # Run with a custom config
//! HERALD_CONFIG=/path/to/herald.toml herald
//!
//! # Pretend to be an Android device
//! HERALD_APP_ID=a1b2c3 HERALD_PLATFORM=android herald
//! ```

mod config;
mod host;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=debug,herald_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!(
        platform = %config.platform,
        app_id = config.app_id.as_deref().unwrap_or("<unset>"),
        "Starting Herald agent"
    );

    // Initialize metrics
    metrics::init_metrics();

    host::run_agent(config).await?;

    Ok(())
}
