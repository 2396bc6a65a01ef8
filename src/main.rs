use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::cache;
use caching_proxy::config;
use caching_proxy::http::HttpServer;
use caching_proxy::lifecycle::Shutdown;
use caching_proxy::observability::metrics;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("caching-proxy v0.1.0 starting");

    // Load configuration from the environment; invalid values are fatal
    let config = config::load_config()?;

    tracing::info!(
        origin = %config.origin_url,
        ttl_minutes = config.ttl_minutes,
        port = config.port,
        backend = %config.cache_backend,
        "Configuration loaded"
    );

    // Initialize metrics exporter
    if let Some(metrics_address) = &config.metrics_address {
        if let Ok(addr) = metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Select the cache backend once at startup
    let cache = cache::from_config(&config).await?;

    // Bind TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Graceful shutdown on Ctrl+C
    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    // Create and run HTTP server
    let server = HttpServer::new(config, cache)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
