//! # ssexi-demo
//!
//! Demo server binary.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use ssexi_demo::{DemoConfig, DemoServer};
use tracing::info;

/// SSEXI demo server.
#[derive(Parser, Debug)]
#[command(name = "ssexi-demo", about = "SSEXI demo server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8001")]
    port: u16,

    /// Milliseconds between push stream ticks.
    #[arg(long, default_value = "1000")]
    tick_ms: u64,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = ssexi_settings::get_settings();
    if cli.json_logs || settings.logging.json {
        ssexi_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        ssexi_core::logging::init_subscriber(&settings.logging.level);
    }

    let server = DemoServer::new(DemoConfig {
        host: cli.host,
        port: cli.port,
        tick_ms: cli.tick_ms,
    });
    let addr = server.config().bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "demo server listening");

    axum::serve(listener, server.router())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
