//! Main entry point for the image gateway

use image_tier_gateway::{
    api,
    backend::HttpEngine,
    config::{LoggingConfig, Settings},
    AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The API key variable may live in .env
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    init_logging(&settings.logging);

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        engine = %settings.engine.endpoint,
        reuse_pipelines = settings.engine.reuse_pipelines,
        "Loaded configuration"
    );
    for (section, model_type) in settings.unknown_model_types() {
        warn!(
            section = section,
            model_type = model_type,
            "Unknown model type; requests for this tier will be rejected"
        );
    }

    let engine = Arc::new(HttpEngine::new(&settings.engine)?);
    let settings = Arc::new(settings);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState::new(settings, engine));
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
