//! Entry point for the `todo-api` binary.

use anyhow::Context;
use todo_api::{app, config::Config, telemetry, AppState, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format)?;

    let store = Store::new(&config.database_path, config.db_busy_timeout);
    store
        .init_schema()
        .await
        .with_context(|| format!("failed to initialise {}", config.database_path.display()))?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, db = %config.database_path.display(), "server starting");

    axum::serve(listener, app(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
