//! HTTP API.
//!
//! ## Endpoints
//!
//! - `POST /solve_question?groq_api_key=<key>` - Solve a math or logic question
//! - `GET /health` - Health check

pub mod error;
pub mod rate_limit;
mod routes;
pub mod types;
pub mod validate;

use std::net::SocketAddr;
use std::sync::Arc;

pub use error::ApiError;
pub use routes::{router, AppState};

use crate::config::Config;
use crate::llm::GroqProvider;

/// Bind and serve until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let provider = Arc::new(GroqProvider::new(config.llm.clone()));
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, provider));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
