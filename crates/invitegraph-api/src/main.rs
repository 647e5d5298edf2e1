//! invitegraph server binary.
//!
//! Serves profile lookups and invitation networks built from the upstream
//! reputation API.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! invitegraph --config config.yaml
//!
//! # With environment variables only
//! INVITEGRAPH_SERVER__PORT=3000 invitegraph
//!
//! # Offline, against the in-memory upstream
//! INVITEGRAPH_UPSTREAM__BACKEND=memory invitegraph
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn, Level};

use invitegraph_api::http::{create_router_with_observability, AppState};
use invitegraph_api::middleware::RequestMetrics;
use invitegraph_api::observability::{init_logging, init_metrics, LoggingConfig, MetricsState};
use invitegraph_domain::cache::ResponseCache;
use invitegraph_server::handlers::{
    FileRecentSearchStore, MemoryRecentSearchStore, RecentSearchStore,
};
use invitegraph_server::ServerConfig;
use invitegraph_upstream::{HttpUpstreamClient, HttpUpstreamConfig, MemoryUpstream, UpstreamClient};

/// invitegraph - invitation network explorer for the reputation network
#[derive(Parser, Debug)]
#[command(name = "invitegraph")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(LoggingConfig {
        json_format: config.logging.json,
        default_level: parse_log_level(&config.logging.level),
    });

    info!(version = env!("CARGO_PKG_VERSION"), "Starting invitegraph server");

    let metrics_state = if config.metrics.enabled {
        let state = init_metrics()?;
        info!(path = %config.metrics.path, "Metrics enabled");
        Some(state)
    } else {
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    match config.upstream.backend.as_str() {
        "http" => {
            let client = HttpUpstreamClient::from_config(upstream_config(&config))?;
            info!(
                v1 = %config.upstream.api_base_v1,
                v2 = %config.upstream.api_base_v2,
                "Using HTTP upstream"
            );
            run(Arc::new(client), addr, &config, metrics_state).await
        }
        "memory" => {
            warn!("Using in-memory upstream; lookups return only seeded data");
            run(MemoryUpstream::new_shared(), addr, &config, metrics_state).await
        }
        other => {
            error!(backend = other, "Unknown upstream backend");
            anyhow::bail!("Unknown upstream backend: {other}");
        }
    }
}

fn upstream_config(config: &ServerConfig) -> HttpUpstreamConfig {
    HttpUpstreamConfig {
        api_base_v1: config.upstream.api_base_v1.clone(),
        api_base_v2: config.upstream.api_base_v2.clone(),
        user_agent: config.upstream.user_agent.clone(),
        client_name: config.upstream.client_name.clone(),
        timeout: std::time::Duration::from_secs(config.upstream.timeout_secs),
    }
}

fn recent_search_store(config: &ServerConfig) -> Arc<dyn RecentSearchStore> {
    let limits = config.recent_search_limits();
    match (
        config.recent_searches.backend.as_str(),
        config.recent_searches.path.as_deref(),
    ) {
        ("file", Some(path)) => {
            info!(path, "Persisting recent searches to file");
            Arc::new(FileRecentSearchStore::new(path, limits))
        }
        _ => Arc::new(MemoryRecentSearchStore::new(limits)),
    }
}

/// Builds the shared state and serves HTTP until a shutdown signal arrives.
async fn run<U: UpstreamClient>(
    client: Arc<U>,
    addr: SocketAddr,
    config: &ServerConfig,
    metrics_state: Option<MetricsState>,
) -> anyhow::Result<()> {
    let cache = Arc::new(ResponseCache::new(config.cache_config()));
    let cleanup = config
        .cache_cleanup_interval()
        .map(|interval| cache.spawn_cleanup_task(interval));

    let state = AppState::with_config(
        client,
        Arc::clone(&cache),
        recent_search_store(config),
        config,
    );
    let router = create_router_with_observability(
        state,
        metrics_state,
        &config.metrics.path,
        config.server.max_body_bytes,
        Arc::new(RequestMetrics::new()),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(handle) = cleanup {
        handle.abort();
    }

    match result {
        Ok(()) => {
            info!("HTTP server shutdown complete");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "HTTP server error");
            Err(err.into())
        }
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
