use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use workday_engine::{HolidaySetProvider, HttpHolidaySource};

use crate::api::{self, AppState};
use crate::config::AppConfig;

/// Build the shared state from configuration.
///
/// # Errors
///
/// Fails if the holidays URL is invalid or the HTTP client cannot be built.
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let url = config.holidays.source_url()?;
    let source = HttpHolidaySource::new(url, config.holidays.timeout)
        .context("failed to build holidays HTTP client")?;
    let provider = HolidaySetProvider::new(Arc::new(source))
        .with_retry_policy(config.holidays.retry_policy());
    Ok(AppState::new(provider))
}

/// Bind and serve until Ctrl-C.
///
/// # Errors
///
/// Fails if the state cannot be built or the listener cannot bind.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let app = api::router(state);

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(
        addr = %config.server.bind_addr,
        holidays_url = %config.holidays.url,
        "working-days service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
