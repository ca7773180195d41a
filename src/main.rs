//! spillway (v0.1)
//!
//! A small HTTP/1.1 server built on Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                     SPILLWAY                      │
//!                    │                                                   │
//!   Client Request   │  ┌──────────┐    ┌───────────┐    ┌───────────┐  │
//!   ─────────────────┼─▶│   net    │───▶│   http    │───▶│  handler  │  │
//!                    │  │ listener │    │  session  │    │  (demo)   │  │
//!                    │  └──────────┘    └─────┬─────┘    └─────┬─────┘  │
//!                    │                        │                │        │
//!                    │                        ▼                ▼        │
//!                    │                  ┌───────────┐    ┌───────────┐  │
//!                    │                  │  payload  │    │ exchange  │  │
//!                    │                  │ mem|disk  │    │send/chunk │  │
//!                    │                  └───────────┘    └─────┬─────┘  │
//!   Client Response  │                                         │        │
//!   ◀────────────────┼─────────────────────────────────────────┘        │
//!                    │                                                   │
//!                    │   config · observability · lifecycle             │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use spillway::config::{load_config, ServerConfig};
use spillway::demo::DemoHandler;
use spillway::lifecycle::{wait_for_signal, Shutdown};
use spillway::net::Listener;
use spillway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "spillway")]
#[command(about = "HTTP/1.1 server with keep-alive, 100-continue and chunked streaming", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("spillway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        spill_threshold = config.payload.spill_threshold,
        spill_dir = %config.payload.spill_dir().display(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Bind failure is fatal.
    let listener = Listener::bind(&config.listener).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let handler = Arc::new(DemoHandler::new(config.payload.clone(), config.demo.clone()));
    let shutdown = Shutdown::new();
    let server = tokio::spawn(listener.serve(handler, config.session.clone(), shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
