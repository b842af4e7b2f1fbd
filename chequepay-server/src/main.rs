//! Chequepay adaptor HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p chequepay-server --release
//!
//! # Run with custom config path
//! cargo run -p chequepay-server -- --config /path/to/config.toml
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p chequepay-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `4444`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded before anything else.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use chequepay::Adaptor;
use clap::Parser;
use tower_http::{cors, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use chequepay_server::adaptor_router;
use chequepay_server::config::ServerConfig;

/// Redeems payment-channel cheques as Lightning payments.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        tracing::error!("Adaptor failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Several rustls providers may be compiled in; pin one for the process.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = ServerConfig::load_from(&args.config)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        lnd = %config.lightning.base_url,
        adaptor_fee_msat = config.adaptor.adaptor_fee_msat,
        pay_fee_limit_sat = config.adaptor.pay_fee_limit_sat,
        "Loaded configuration"
    );

    let backend = config.lightning.connect()?;
    let adaptor = Arc::new(Adaptor::new(backend, config.adaptor.clone()));

    let app = adaptor_router(adaptor)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Adaptor listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Adaptor shut down gracefully");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {e}");
                    let _ = ctrl_c.await;
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = ctrl_c.await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
        }
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
