mod api;
mod auth;
mod router;
mod sessions;
mod state;

use std::future::IntoFuture;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use querygate_connector::{connect_all, shutdown};
use querygate_core::Config;
use querygate_tool_runtime::ToolRegistry;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from the file applies.
    querygate_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::from_env()?;
    config.log_summary();

    let backends = connect_all(&config).await;
    let registry = Arc::new(ToolRegistry::new(backends.clone()));
    info!(tools = registry.list().len(), "Tool registry ready");

    let state = Arc::new(AppState::new(config.server.api_key.clone(), registry));
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    // SSE streams never finish on their own, so in-flight connections are
    // not drained: the first signal stops the listener outright.
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        result = os_signal() => {
            result?;
            info!("Shutdown signal received");
        }
    }

    shutdown(&backends).await;
    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C elsewhere.
async fn os_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
