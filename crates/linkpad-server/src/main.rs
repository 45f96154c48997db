#![forbid(unsafe_code)]

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use linkpad_server::{ServerConfig, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linkpad_server=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("reading configuration")?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        max_token_len = config.max_token_len,
        max_inflated_len = config.max_inflated_len,
        "linkpad-server listening"
    );

    axum::serve(listener, build_router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
