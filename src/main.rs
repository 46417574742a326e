use anyhow::Result;
use passkey_ceremony::{
    build_service, create_noop_metrics, create_prom_metrics, create_router, create_verifier,
    AppConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let metrics = if config.server.metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };
    let verifier = create_verifier(config.server.verifier.as_deref())?;

    let service = build_service(&config, metrics, verifier).await?;
    let app = create_router(Arc::new(service));

    let endpoint = &config.server.bind_addr;
    info!("Starting at endpoint:{}", endpoint);
    info!(
        "Starting passkey ceremony server v{} (rp_id:{} origin:{})",
        env!("CARGO_PKG_VERSION"),
        config.relying_party.rp_id,
        config.relying_party.origin
    );

    let listener = tokio::net::TcpListener::bind(endpoint).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // ---
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
