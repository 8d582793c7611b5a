use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interop_relayer::chains::{EvmRpcChain, InteropChain};
use interop_relayer::interop::compute_asset_id;
use interop_relayer::relay::{cancellation, CancelToken, RelayProgress};
use interop_relayer::{ChainSide, RelayDirection, RelayOrchestrator, RelaySettings, RelayerConfig, RelayerMetrics};

#[derive(Parser)]
#[command(name = "relayer")]
#[command(about = "Interop relayer for messages and token bundles between two L2 chains")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/relayer.toml")]
    pub config: String,

    /// Log level (defaults to global.log_level from the configuration)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message to L1 and verify its inclusion on the other chain
    SendMessage {
        message: String,
        /// a-to-b or b-to-a
        #[arg(long, default_value = "a-to-b")]
        direction: RelayDirection,
    },
    /// Bridge tokens to the relayer account on the other chain
    TransferTokens {
        /// Amount in the token's smallest unit
        #[arg(long)]
        amount: String,
        /// Token on the source chain (defaults to the configured asset)
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "a-to-b")]
        direction: RelayDirection,
    },
    /// Compute an asset id
    AssetId {
        /// Chain the token is native to
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        token: String,
    },
    /// Look up the token registered for the configured asset
    WrappedToken {
        /// a or b
        #[arg(long)]
        chain: ChainSide,
    },
    /// Show finalized heights of both chains
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = RelayerConfig::load_layered(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    config.validate()?;

    // Initialize logging
    let level = cli.log_level.clone().unwrap_or_else(|| config.global.log_level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("interop_relayer={},relayer={}", level, level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loaded configuration from: {}", cli.config);

    match cli.command {
        Commands::SendMessage { message, direction } => {
            let (orchestrator, metrics) = build_orchestrator(&config)?;
            let cancel = cancel_on_ctrl_c();
            let progress = |event: &RelayProgress| println!("{}", event);

            let outcome = orchestrator
                .send_interop_message(&message, direction, &progress, &cancel)
                .await;
            print_metrics(metrics.as_deref());
            println!("{}", serde_json::to_string_pretty(&outcome?)?);
        }
        Commands::TransferTokens {
            amount,
            token,
            direction,
        } => {
            let amount = U256::from_str(&amount).map_err(|e| anyhow::anyhow!("invalid amount {}: {}", amount, e))?;
            let token = match token {
                Some(token) => parse_address(&token)?,
                None => config
                    .asset
                    .map(|origin| origin.token)
                    .context("no --token given and no [asset] configured")?,
            };

            let (orchestrator, metrics) = build_orchestrator(&config)?;
            let cancel = cancel_on_ctrl_c();
            let progress = |event: &RelayProgress| println!("{}", event);

            let outcome = orchestrator
                .transfer_tokens_interop(token, amount, direction, &progress, &cancel)
                .await;
            print_metrics(metrics.as_deref());
            println!("{}", serde_json::to_string_pretty(&outcome?)?);
        }
        Commands::AssetId { chain_id, token } => {
            let token = parse_address(&token)?;
            let asset_id = compute_asset_id(chain_id, config.contracts.native_token_vault, token);
            println!("{}", asset_id);
        }
        Commands::WrappedToken { chain } => {
            let origin = config.asset.context("no [asset] configured")?;
            let asset_id = origin.asset_id(config.contracts.native_token_vault);
            let (orchestrator, _) = build_orchestrator(&config)?;

            match orchestrator.wrapped_token_address(chain, asset_id).await? {
                Some(token) => {
                    let balance = orchestrator
                        .token_balance(chain, token, config.global.account)
                        .await?;
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "asset_id": asset_id,
                            "token": token,
                            "balance": balance,
                        }))?
                    );
                }
                None => println!("Asset {} is not bridged to chain {} yet", asset_id, config.chain(chain).name),
            }
        }
        Commands::Status => {
            show_status(&config).await?;
        }
    }

    Ok(())
}

fn parse_address(text: &str) -> anyhow::Result<Address> {
    Address::from_str(text).map_err(|e| anyhow::anyhow!("invalid address {}: {}", text, e))
}

fn build_orchestrator(config: &RelayerConfig) -> anyhow::Result<(RelayOrchestrator, Option<Arc<RelayerMetrics>>)> {
    let chain_a = EvmRpcChain::new(&config.chain_a, config.polling.receipt)?;
    let chain_b = EvmRpcChain::new(&config.chain_b, config.polling.receipt)?;
    let mut orchestrator = RelayOrchestrator::new(
        Arc::new(chain_a),
        Arc::new(chain_b),
        RelaySettings::from_config(config),
    );

    let metrics = if config.metrics.enabled {
        let metrics = Arc::new(RelayerMetrics::new()?);
        orchestrator = orchestrator.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };
    Ok((orchestrator, metrics))
}

/// Cancel the in-flight relay on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancelToken {
    let (handle, token) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling relay");
            handle.cancel();
        }
    });
    token
}

fn print_metrics(metrics: Option<&RelayerMetrics>) {
    if let Some(metrics) = metrics {
        match metrics.render() {
            Ok(text) => println!("{}", text),
            Err(e) => warn!("Failed to render metrics: {}", e),
        }
    }
}

async fn show_status(config: &RelayerConfig) -> anyhow::Result<()> {
    for side in [ChainSide::A, ChainSide::B] {
        let chain_config = config.chain(side);
        let chain = EvmRpcChain::new(chain_config, config.polling.receipt)?;
        match chain.finalized_block_number().await {
            Ok(Some(height)) => println!("{} ({}): finalized block {}", chain_config.name, chain.chain_id(), height),
            Ok(None) => println!("{} ({}): no finalized block reported", chain_config.name, chain.chain_id()),
            Err(e) => println!("{} ({}): unreachable: {}", chain_config.name, chain.chain_id(), e),
        }
    }
    Ok(())
}
