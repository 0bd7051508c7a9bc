//! Verso HTTP Gateway binary.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verso_gateway::{build_registry, create_router, AppState, Args, GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = GatewayConfig::from(&args);

    if config.max_body_bytes == 0 {
        anyhow::bail!("max_body_bytes must be greater than zero");
    }

    let registry = build_registry(&config)?;
    info!(
        listen = %config.listen_addr,
        current = %registry.current_version(),
        versions = ?registry.known_versions(),
        header = %config.version_header,
        "Starting Verso Gateway"
    );

    let state = AppState::new(registry, config.clone())?;
    let app = create_router(state)?;

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
