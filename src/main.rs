//! Decoy Router
//!
//! A reverse proxy that decides, per request, whether the client sees the
//! primary site or the decoy site.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    DECOY ROUTER                       │
//!                     │                                                       │
//!   Client Request    │  ┌────────┐   ┌──────────────────────────────────┐    │
//!   ──────────────────┼─▶│  http  │──▶│         routing engine           │    │
//!                     │  │ server │   │  ┌──────────┐ ┌─────┐ ┌────────┐ │    │
//!                     │  └────────┘   │  │ classify │ │ geo │ │ reput- │ │    │
//!                     │               │  │ (+rDNS)  │ │     │ │ ation  │ │    │
//!                     │               │  └──────────┘ └─────┘ └────────┘ │    │
//!                     │               │        random delay + policy     │    │
//!                     │               └────────────────┬─────────────────┘    │
//!                     │                                ▼                      │
//!   Client Response   │  ┌────────┐             ┌─────────────┐               │
//!   ◀─────────────────┼──│ stream │◀────────────│    proxy    │◀──────────────┼── Primary
//!                     │  └────────┘             │  upstream   │◀──────────────┼── Decoy
//!                     │                         └─────────────┘               │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use decoy_router::config::{load_config, Overrides};
use decoy_router::lifecycle;
use decoy_router::observability::init_logging;

#[derive(Debug, Parser)]
#[command(name = "decoy-router", version, about = "Classifying reverse proxy")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Destination for admitted traffic.
    #[arg(long, env = "PRIMARY_URL")]
    primary_url: Option<String>,

    /// Destination for everything else.
    #[arg(long, env = "DECOY_URL")]
    decoy_url: Option<String>,

    /// Reputation dataset (`asn,organization[,category]` rows).
    #[arg(long, env = "REPUTATION_PATH")]
    reputation_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = Overrides {
        port: args.port,
        primary_url: args.primary_url,
        decoy_url: args.decoy_url,
        reputation_path: args.reputation_path,
    };
    let config = load_config(args.config.as_deref(), overrides)?;

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        policy = ?config.policy.shape,
        "decoy-router starting"
    );

    lifecycle::run(config).await?;
    Ok(())
}
