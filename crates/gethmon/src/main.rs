//! Sync monitor binary

use clap::Parser;
use gethmon::api::{healthz_handler, metrics_handler, root_handler, status_handler, AppState};
use gethmon::metrics::MetricsCollector;
use gethmon::{EthRpcClient, EtherscanClient, MonitorConfig, SyncMonitor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sync monitor CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP listen address
    #[arg(long)]
    listen_addr: Option<String>,

    /// Local node RPC URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Etherscan API key
    #[arg(long)]
    etherscan_api_key: Option<String>,

    /// Startup grace period (seconds)
    #[arg(long)]
    start_wait: Option<u64>,

    /// Stall check interval (seconds)
    #[arg(long)]
    update_interval: Option<u64>,

    /// Maximum acceptable height difference
    #[arg(long)]
    max_sync_diff: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let env_filter = if args.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("gethmon=info".parse()?)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gethmon v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = MonitorConfig::from_env();

    // Override with CLI arguments
    if let Some(addr) = args.listen_addr {
        config.listen_addr = addr;
    }

    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }

    if let Some(key) = args.etherscan_api_key {
        config.etherscan_api_key = key;
    }

    if let Some(wait) = args.start_wait {
        config.start_wait_secs = wait;
    }

    if let Some(interval) = args.update_interval {
        config.update_interval_secs = interval;
    }

    if let Some(diff) = args.max_sync_diff {
        config.max_sync_diff = diff;
    }

    config.validate()?;

    info!("Configuration:");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Node RPC URL: {}", config.rpc_url);
    info!("  Startup grace period: {}s", config.start_wait_secs);
    info!("  Stall check interval: {}s", config.update_interval_secs);
    info!("  Max sync diff: {}", config.max_sync_diff);
    info!("  RPC timeout: {}s", config.rpc_timeout_secs);

    // Build clients and monitor
    let rpc = Arc::new(EthRpcClient::new(
        config.rpc_url.clone(),
        config.rpc_timeout_duration(),
    )?);

    let reference = Arc::new(EtherscanClient::new(
        config.etherscan_api_key.clone(),
        config.rpc_timeout_duration(),
    )?);

    let state = AppState {
        monitor: Arc::new(SyncMonitor::new(config.clone(), rpc, reference)),
        metrics: MetricsCollector::new(),
    };

    // Build router
    let app = axum::Router::new()
        .route("/", axum::routing::get(root_handler))
        .route("/healthz", axum::routing::get(healthz_handler))
        .route("/status", axum::routing::get(status_handler))
        .route("/metrics", axum::routing::get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
