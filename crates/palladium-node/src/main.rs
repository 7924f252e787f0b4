//! Palladium Node - the consensus core behind an RPC surface.
//!
//! This is the main entry point for the palladium-node binary.

use anyhow::{Context, Result};
use clap::Parser;
use palladium_chain::ChainState;
use palladium_consensus::{select_params, Network, RegtestOverrides};
use palladium_rpc::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::NodeConfig;

/// Palladium consensus-core node.
#[derive(Parser, Debug)]
#[command(name = "palladium-node")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "palladium-node.toml")]
    config: PathBuf,

    /// Network to run on (main, test, regtest)
    #[arg(short, long, default_value = "main")]
    network: String,

    /// RPC bind address
    #[arg(long)]
    rpc_bind: Option<String>,

    /// Segwit activation height override (regtest only, -1 disables)
    #[arg(long)]
    segwitheight: Option<i64>,

    /// AuxPoW activation height override (regtest only, -1 disables)
    #[arg(long)]
    auxpowstartheight: Option<i64>,

    /// Version bits deployment override, deployment:start:timeout
    /// (regtest only, repeatable)
    #[arg(long)]
    vbparams: Vec<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Palladium Node v{}", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::load(&args.config, &args)?;
    let network: Network = config
        .network
        .parse()
        .map_err(|err| anyhow::anyhow!("{}", err))?;

    let overrides = RegtestOverrides {
        segwit_height: args.segwitheight,
        auxpow_start_height: args.auxpowstartheight,
        vbparams: args.vbparams.clone(),
    };
    if network != Network::Regtest
        && (overrides.segwit_height.is_some()
            || overrides.auxpow_start_height.is_some()
            || !overrides.vbparams.is_empty())
    {
        anyhow::bail!("activation overrides are only valid on regtest");
    }

    // Configuration problems abort here, before any worker starts.
    let params = select_params(network, &overrides)
        .map_err(|err| anyhow::anyhow!("{}", err))
        .context("invalid chain parameters")?;

    info!(network = %params.network, "chain params selected");
    info!(genesis = %params.genesis.hash(), "genesis verified");

    let state = AppState::new(ChainState::new(Arc::new(params.clone())));
    let signal = Arc::clone(&state.signal);

    let addr = config
        .rpc
        .bind_address
        .parse()
        .context("invalid rpc bind address")?;

    tokio::select! {
        result = palladium_rpc::serve(addr, state) => {
            result.context("rpc server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            signal.request_shutdown();
        }
    }

    info!("Palladium node stopped");
    Ok(())
}
