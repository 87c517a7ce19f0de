//! crawlgate server entry point.
//!
//! Loads configuration, opens the rule database and the robots cache,
//! and serves the crawl-permission API until SIGINT/SIGTERM.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crawlgate_core::AppConfig;
use crawlgate_core::config::LogFormat;

mod api;
mod auth;
mod error;
mod routes;
mod state;

use state::{CacheHandle, Handles};

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry().with(env_filter).with(fmt::layer().json()).init(),
        LogFormat::Text => tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

/// Periodically drop expired robots.txt bodies.
fn spawn_cache_purge(cache: CacheHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            match cache.purge_expired().await {
                Ok(purged) => tracing::debug!(purged, "purged expired robots.txt entries"),
                Err(e) => tracing::warn!(error = %e, "robots.txt cache purge failed"),
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);

    tracing::info!(
        service = %config.service_name,
        env = %config.env,
        api_path = %config.server.api_path,
        cache_backend = ?config.cache.backend,
        auth = config.auth.enabled,
        "starting crawlgate"
    );

    let handles = Handles::open(&config).await?;

    for key in &config.auth.api_keys {
        handles.state.keys.upsert(key, true).await.context("failed to seed api keys")?;
    }
    if !config.auth.api_keys.is_empty() {
        tracing::info!(count = config.auth.api_keys.len(), "seeded api keys");
    }

    let purge = spawn_cache_purge(handles.cache.clone(), config.cache.purge_interval());

    let app = routes::create_router(handles.state.clone(), &config);
    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind to {bind_address}"))?;

    tracing::info!(address = %bind_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    purge.abort();
    handles.close().await?;
    tracing::info!("crawlgate stopped");

    Ok(())
}
