//! Queue Sync Daemon (qsync-sd) - Main entry point
//!
//! Accepts job triggers from the session service over HTTP and runs the
//! synchronization jobs against its GraphQL API.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use qsync_common::config::resolve_config_path;
use qsync_sd::api::AppState;
use qsync_sd::logging;
use qsync_sd::oracle::GraphQlOracle;
use qsync_sd::scheduler::Scheduler;
use qsync_sd::SessionSync;
use tracing::info;

/// Command-line arguments for qsync-sd
#[derive(Parser, Debug)]
#[command(name = "qsync-sd")]
#[command(about = "Queue/playback synchronization daemon")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "QSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "ADDR")]
    addr: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// GraphQL endpoint of the session service
    #[arg(long, env = "GRAPHQL_SERVER")]
    graphql_server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the log level
    let config_path = resolve_config_path(args.config.as_deref());
    let mut config =
        logging::load_config(config_path.as_deref()).context("Failed to load configuration")?;

    if let Some(addr) = args.addr {
        config.server.addr = addr.to_string();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(graphql_server) = args.graphql_server {
        config.oracle.graphql_server = graphql_server;
    }

    logging::init(&config.logging.level);

    // Log build identification immediately after tracing init
    info!(
        "Starting qsync-sd v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using compiled defaults"),
    }

    let ip: IpAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.server.addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let oracle = GraphQlOracle::new(
        config.oracle.graphql_server.clone(),
        config.oracle.request_timeout(),
    )
    .context("Failed to build session oracle client")?;
    info!("Session oracle: {}", oracle.endpoint());

    let timings = config.timings.clone();
    info!(
        "Timings: status every {:?} (armed after {:?}), pause watch every {:?} for {:?}, device search every {:?} for {:?}",
        timings.status_interval(),
        timings.status_arm_delay(),
        timings.paused_interval(),
        timings.resume_ceiling(),
        timings.device_interval(),
        timings.device_ceiling()
    );

    let sync = SessionSync::new(Scheduler::current(), Arc::new(oracle), timings);

    qsync_sd::server::run(addr, AppState::new(sync))
        .await
        .context("Server error")?;

    Ok(())
}
