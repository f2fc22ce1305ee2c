use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use flock_api::app::{app, AppState};
use flock_api::config::config;
use flock_api::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting flock-api in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set when FLOCK_ENV is not development");
    }

    let store = PgStore::connect(&config.database)
        .await
        .context("connecting to the database")?;
    store.migrate().await.context("running migrations")?;
    tracing::info!("database ready");

    let state = AppState::new(Arc::new(store));
    let router = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("🚀 flock-api listening on http://{bind_addr}");

    axum::serve(listener, router).await.context("server")?;
    Ok(())
}
