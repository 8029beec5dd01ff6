//! cyberblog - REST API for a personal cybersecurity blog

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cyberblog::{api, config::Config, AppState};

/// How often stale login failures are purged
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cyberblog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cyberblog...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    if config.auth.uses_default_secret() {
        tracing::warn!("JWT_SECRET is not set, signing tokens with the built-in development secret");
    }
    if config.auth.admin_key.is_none() {
        tracing::info!("ADMIN_KEY is not set, admin key verification will reject every key");
    }
    tracing::info!("Configuration loaded");

    let addr = config.bind_address();

    // Build services and load startup data
    let state = AppState::seeded(config)
        .await
        .context("Failed to seed startup data")?;
    tracing::info!("Store initialized");

    // Start rate limiter cleanup task
    {
        let limiter = state.user_service.rate_limiter();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = limiter.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "Purged stale login failures");
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
