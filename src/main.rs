use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_photo_poet::config::Config;
use ai_photo_poet::{build_state, web};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ai_photo_poet=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let state = build_state(&config);
    let sweep_period = (config.session_ttl / 4).max(Duration::from_secs(1));
    let _sweeper = state.sessions.clone().spawn_sweeper(sweep_period);
    let app = web::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        model = %config.gemini.model,
        timeout_secs = config.generation_timeout.as_secs(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "🚀 PoemSnap server running"
    );
    info!("📸 Open http://localhost:{} in your browser to start", config.bind_addr.port());

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
