//! Math Solver - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the solver API.

use math_solver::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "math_solver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, rate_limit={}/{}s ({:?})",
        config.llm.model,
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs(),
        config.rate_limit.eviction
    );

    api::serve(config).await?;

    Ok(())
}
