use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shorturl::app::{create_app, AppState};
use shorturl::config::Config;
use shorturl::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let default_level = if config.site.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.database).await?;

    // Initialize database
    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    match config.site.base_url.as_deref() {
        Some(base_url) => info!("🔗 Short URLs use base {}", base_url),
        None => info!("🔗 Short URLs use the request Host header as base"),
    }
    if config.site.debug {
        info!("🐛 Debug mode enabled - every click is logged");
    }

    let state = Arc::new(AppState::new(storage, &config)?);
    let app = create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/...", addr);
    info!("   - Short links served at http://{}/url/{{code}}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
