// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RADIUS Server
//!
//! Standalone RADIUS (RFC 2865/2866/3576) server built on `radius-core`,
//! wired with in-memory reference implementations of every collaborator
//! trait the core depends on.
//!
//! # Usage
//!
//! ```bash
//! # Start server on the default auth port (1812)
//! radius-server --nas-file nas.json
//!
//! # Custom bind address/port and config file
//! radius-server --port 1812 --config server.json --nas-file nas.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use radius_core::{Collaborators, Listener, ServerConfig, StatsKind};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod collaborators;
mod handlers;

/// RADIUS Server - standalone AAA server for RADIUS NAS devices.
#[derive(Parser, Debug)]
#[command(name = "radius-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP port to listen on.
    #[arg(short, long, default_value = "1812")]
    port: u16,

    /// Bind address (0.0.0.0 for all interfaces).
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Server configuration file (JSON format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// NAS registry file (JSON format): array of NAS entries.
    #[arg(long)]
    nas_file: Option<PathBuf>,

    /// Reply retention window in milliseconds.
    #[arg(long, default_value = "5000")]
    resend_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let server_config = if let Some(config_path) = &args.config {
        info!("Loading config from {:?}", config_path);
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig {
            bind_address: args.bind.parse()?,
            port: args.port,
            resend_timeout_ms: args.resend_timeout_ms,
            ..Default::default()
        }
    };

    let nas_registry = match &args.nas_file {
        Some(path) => {
            info!("Loading NAS registry from {:?}", path);
            collaborators::nas::InMemoryNasRegistry::from_file(path)?
        }
        None => {
            info!("No --nas-file given, starting with an empty NAS registry");
            collaborators::nas::InMemoryNasRegistry::empty()
        }
    };

    let node_monitor = collaborators::nodes::SingleNodeMonitor::new("local".to_string());
    let codec = collaborators::codec::MinimalRadiusCodec::new();
    let admission = collaborators::admission::TokenBucketAdmissionQueue::new(
        server_config.rate_config.capacity,
        server_config.rate_config.refill_per_sec,
    );
    let remote_executor = collaborators::remote::UnreachableRemoteExecutor;
    let logger = collaborators::logging::TracingRequestLogger;

    let mut handler_registry = collaborators::handlers::StaticHandlerRegistry::new();
    handler_registry.register("auth.accept-all", Arc::new(handlers::AcceptAllHandler));
    handler_registry.register("acct.log-only", Arc::new(handlers::AcctLogHandler));

    let addr: SocketAddr =
        format!("{}:{}", server_config.bind_address, server_config.port).parse()?;

    info!("+----------------------------------------------------+");
    info!(
        "|       RADIUS Server v{}                        |",
        env!("CARGO_PKG_VERSION")
    );
    info!("+----------------------------------------------------+");
    info!("|  Bind:           {:40} |", addr);
    info!(
        "|  Resend timeout: {:40} |",
        format!("{}ms", server_config.resend_timeout_ms)
    );
    info!(
        "|  Resend retries: {:40} |",
        server_config.resend_retries
    );
    info!("+----------------------------------------------------+");

    let listener = Listener::new(
        server_config,
        Collaborators {
            nas_registry: Arc::new(nas_registry),
            node_monitor: Arc::new(node_monitor),
            codec: Arc::new(codec),
            admission: Arc::new(admission),
            remote_executor: Arc::new(remote_executor),
            handler_registry: Arc::new(handler_registry),
            logger: Arc::new(logger),
        },
    )?;

    let listener_handle = listener.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received, stopping server...");
        listener_handle.shutdown();
    });

    listener.run().await?;

    let snapshot = listener.stats(StatsKind::Read);
    info!(server = ?snapshot.server, "final counters");
    info!("RADIUS server stopped");
    Ok(())
}
