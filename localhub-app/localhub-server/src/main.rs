use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use localhub_api::{create_router, AppState};
use localhub_infrastructure::{create_pool, pg_repositories, run_migrations};
use localhub_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize telemetry; the guard flushes file logs on exit
    let _log_guard = localhub_shared::telemetry::init_telemetry(&config.logging)?;
    info!(env = %config.app.env, "LocalHub server starting...");

    // Connect to Database
    let pool = create_pool(&config.database)
        .await
        .context("failed to connect to the database")?;
    if config.database.run_migrations {
        run_migrations(&pool).await.context("failed to run migrations")?;
    }

    // Wire repositories and services
    let host: std::net::IpAddr = config.app.host.parse().context("invalid app.host")?;
    let addr = SocketAddr::from((host, config.app.port));
    let state = AppState::new(config, pool.clone(), pg_repositories(pool));
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("LocalHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
