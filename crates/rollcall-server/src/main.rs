use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rollcall_core::MonitorConfig;
use rollcall_server::config::ServerConfig;
use rollcall_server::routes;
use rollcall_server::state::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rollcall=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    let monitor_config = MonitorConfig::from_env().context("Invalid monitor configuration")?;
    let addr = server_config.addr();

    let state = Arc::new(AppState::new(monitor_config));

    let monitor = state.monitor().clone();
    tokio::spawn(async move {
        match monitor.auto_start().await {
            Ok(true) => {}
            Ok(false) => tracing::info!("First page is not a meeting page, waiting for START_MONITORING"),
            Err(e) => tracing::error!(error = %e, "Failed to start monitoring"),
        }
    });

    let app = routes::router(Arc::clone(&state), server_config.max_document_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.monitor().stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
