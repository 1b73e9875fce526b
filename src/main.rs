use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use episode_calendar::AppState;
use episode_calendar::config::{CacheBackend, ServerConfig};
use episode_calendar::routes;
use episode_calendar_core::CalendarService;
use episode_calendar_core::bangumi::Client;
use episode_calendar_core::cache::{Cache, MemoryCache, RedisCache};

#[derive(Parser)]
#[command(name = "episode-calendar")]
#[command(about = "Serve an iCalendar feed of upcoming episodes from a Bangumi collection")]
struct Cli {
    /// Config file (defaults to <config dir>/episode-calendar/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut cfg = ServerConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        cfg.host = host;
    }
    if let Some(port) = cli.port {
        cfg.port = port;
    }

    let cache: Arc<dyn Cache> = match cfg.cache_backend {
        CacheBackend::Redis => Arc::new(
            RedisCache::connect(&cfg.redis_settings())
                .await
                .context("Failed to connect to redis")?,
        ),
        CacheBackend::Memory => {
            tracing::warn!("using in-memory cache; entries are lost on restart");
            Arc::new(MemoryCache::new())
        }
    };

    let client = Client::new(&cfg.bangumi_base_url)?;
    let service = CalendarService::new(client, cache, cfg.service_options());
    let app = routes::router(AppState::new(service), cfg.enable_request_logging);

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "episode-calendar listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
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
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("shutting down");
}
