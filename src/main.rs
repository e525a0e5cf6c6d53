//! image-relay binary.
//!
//! Reads configuration once, then serves the relay until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use image_relay::config::{load_config, Overrides};
use image_relay::lifecycle::signals::spawn_signal_handler;
use image_relay::observability::{logging, metrics};
use image_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "image-relay", version)]
#[command(about = "Relay remote images to browser pages with origin-gated CORS headers", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "IMAGE_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Comma-separated list of allowed origins.
    #[arg(long, env = "ALLOWED_ORIGINS")]
    allowed_origins: Option<String>,

    /// Maximum image size in bytes.
    #[arg(long, env = "MAX_FILE_SIZE")]
    max_file_size: Option<u64>,

    /// Upstream timeout in milliseconds.
    #[arg(long, env = "TIMEOUT")]
    timeout: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            allowed_origins: self.allowed_origins.clone(),
            max_bytes: self.max_file_size,
            timeout_ms: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), &cli.overrides())?;

    logging::init(&config.observability)?;

    tracing::info!("image-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        allowed_origins = ?config.cors.allowed_origins,
        max_bytes = config.upstream.max_bytes,
        timeout_ms = config.upstream.timeout_ms,
        max_concurrent_requests = config.limits.max_concurrent_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
