//! Queuic broker binary.
//!
//! # Usage
//!
//! ```bash
//! # Development: built-in key, defaults everywhere
//! queuic-server
//!
//! # Production: shared secret from the environment
//! QUEUEIC_KEY_STRING=changeme queuic-server --port 9523 --data-dir /var/lib/queuic
//! ```

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use queuic_core::QueueRegistry;
use queuic_server::{DEFAULT_PORT, Server, ServerConfig, admin};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Secret used when `QUEUEIC_KEY_STRING` is not configured.
const DEFAULT_KEY_STRING: &str = "QUEUEIC";

/// Queuic datagram message broker
#[derive(Parser, Debug)]
#[command(name = "queuic-server")]
#[command(about = "Authenticated datagram message broker")]
#[command(version)]
struct Args {
    /// UDP port for the datagram protocol
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// TCP port for the admin HTTP interface
    #[arg(long, default_value_t = admin::DEFAULT_ADMIN_PORT)]
    admin_port: u16,

    /// Directory holding the per-queue snapshot files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Seconds in-flight requests may drain after shutdown
    #[arg(long, default_value_t = 5)]
    shutdown_grace: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Precedence: RUST_LOG, then --log-level, then LOG_LEVEL, then info.
    let level = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Queuic broker starting");

    let secret = match std::env::var("QUEUEIC_KEY_STRING") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!("QUEUEIC_KEY_STRING is not set, falling back to the built-in key");
            DEFAULT_KEY_STRING.to_string()
        }
    };
    let key = queuic_crypto::derive_key(&secret);

    let registry = Arc::new(QueueRegistry::new(&args.data_dir));
    let recovered = registry.load_from_disk()?;
    tracing::info!(recovered, data_dir = %args.data_dir.display(), "registry ready");

    let admin_addr = SocketAddr::from(([0, 0, 0, 0], args.admin_port));
    let admin_registry = Arc::clone(&registry);
    tokio::spawn(async move {
        if let Err(err) = admin::serve(admin_addr, admin_registry).await {
            tracing::error!(error = %err, "admin interface failed");
            std::process::exit(1);
        }
    });

    let config = ServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], args.port)),
        shutdown_grace: Duration::from_secs(args.shutdown_grace),
    };
    let server = Server::bind(config, key, registry).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    server.run().await?;
    tracing::info!("Queuic broker stopped");
    Ok(())
}
