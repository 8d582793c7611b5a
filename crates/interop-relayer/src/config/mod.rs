use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::interop::abi::SystemContracts;
use crate::interop::asset::AssetOrigin;
use crate::relay::{ChainSide, PollPolicy};

/// Prefix of environment variables overriding file values, e.g.
/// `INTEROP_RELAYER__CHAIN_A__RPC_ENDPOINT`.
pub const ENV_PREFIX: &str = "INTEROP_RELAYER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayerConfig {
    pub global: GlobalConfig,
    pub chain_a: ChainConfig,
    pub chain_b: ChainConfig,
    #[serde(default)]
    pub contracts: SystemContracts,
    #[serde(default)]
    pub polling: PollingConfig,
    /// Origin of the token moved by `transfer-tokens`
    #[serde(default)]
    pub asset: Option<AssetOrigin>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Log level for the relayer
    pub log_level: String,
    /// Account that sends, approves and executes. Signing is done by the node.
    pub account: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    /// JSON-RPC endpoint
    pub rpc_endpoint: String,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Per-phase polling budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub finality: PollPolicy,
    pub proof: PollPolicy,
    pub root: PollPolicy,
    pub receipt: PollPolicy,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            finality: PollPolicy::finality_default(),
            proof: PollPolicy::proof_default(),
            root: PollPolicy::root_default(),
            receipt: PollPolicy::receipt_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Print the Prometheus exposition after each relay
    pub enabled: bool,
}

impl RelayerConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the TOML file, then apply `INTEROP_RELAYER__*` environment overrides
    pub fn load_layered<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Save configuration to TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn chain(&self, side: ChainSide) -> &ChainConfig {
        match side {
            ChainSide::A => &self.chain_a,
            ChainSide::B => &self.chain_b,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain_a.chain_id == self.chain_b.chain_id {
            anyhow::bail!("chain_a and chain_b share chain id {}", self.chain_a.chain_id);
        }
        for chain in [&self.chain_a, &self.chain_b] {
            if chain.rpc_endpoint.trim().is_empty() {
                anyhow::bail!("chain {} has no rpc_endpoint", chain.name);
            }
        }
        let budgets = [
            ("finality", &self.polling.finality),
            ("proof", &self.polling.proof),
            ("root", &self.polling.root),
            ("receipt", &self.polling.receipt),
        ];
        for (phase, policy) in budgets {
            if policy.max_attempts == 0 {
                anyhow::bail!("polling.{}.max_attempts must be at least 1", phase);
            }
        }
        Ok(())
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig {
                log_level: "info".to_string(),
                // Rich account of the local development chains
                account: address!("36615cf349d7f6344891b1e7ca7c72883f5dc049"),
            },
            chain_a: ChainConfig {
                chain_id: 6565,
                name: "chain-a".to_string(),
                rpc_endpoint: "http://localhost:3050".to_string(),
                request_timeout_secs: default_request_timeout(),
            },
            chain_b: ChainConfig {
                chain_id: 6566,
                name: "chain-b".to_string(),
                rpc_endpoint: "http://localhost:3051".to_string(),
                request_timeout_secs: default_request_timeout(),
            },
            contracts: SystemContracts::default(),
            polling: PollingConfig::default(),
            asset: Some(AssetOrigin::new(
                6565,
                address!("e441cf0795af14ddb9f7984da85cd36db1b8790d"),
            )),
            metrics: MetricsConfig::default(),
        }
    }
}
