// Web-based cartoon headshot generator using the Gemini image API

use std::sync::Arc;

use anyhow::Context;
use cartoon_headshot::{web, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cartoon_headshot=info,tower_http=info")),
        )
        .init();

    if std::env::var(cartoon_headshot::gemini::API_KEY_VAR).is_err() {
        tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail until it is");
    }

    let state = web::AppState::new(Arc::new(config.gemini_client()));
    let app = web::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        model = %config.gemini_model,
        "server running, open it in your browser to start"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
