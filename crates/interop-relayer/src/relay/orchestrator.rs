// End-to-end relay of messages and token bundles between two chains
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::executor::{verify_message_inclusion, BundleExecutor};
use super::finality::FinalityWaiter;
use super::polling::CancelToken;
use super::progress::{ProgressSink, RelayProgress};
use super::proof::ProofFetcher;
use super::root::RootPropagationWaiter;
use super::state::{RelayPhase, RelayState};
use super::submit_and_wait;
use crate::chains::{read_contract, ChainError, InteropChain, TransactionReceipt, TransactionRequest};
use crate::config::{PollingConfig, RelayerConfig};
use crate::error::{RelayError, RelayFailure};
use crate::interop::abi::{IInteropCenter, IL1Messenger, INativeTokenVault, SystemContracts, IERC20};
use crate::interop::address::encode_chain_only;
use crate::interop::asset::{compute_asset_id, AssetId, AssetOrigin};
use crate::interop::bundle::{
    build_transfer_bundle, bundle_message_payload, encode_bundle_for_execution, extract_bundle,
    transfer_call_starters, unbundler_attributes,
};
use crate::interop::proof::{build_inclusion_proof, ProofResponse, ProvenMessage};
use crate::metrics::RelayerMetrics;

const GWEI: u128 = 1_000_000_000;

/// Gas limit for `sendBundle`; estimation is unreliable for bundle submission
pub const SEND_BUNDLE_GAS: u64 = 5_000_000;

/// One of the two configured chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainSide {
    A,
    B,
}

impl FromStr for ChainSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Ok(ChainSide::A),
            "b" => Ok(ChainSide::B),
            other => Err(format!("unknown chain {:?}, expected a or b", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayDirection {
    #[serde(rename = "A→B")]
    AToB,
    #[serde(rename = "B→A")]
    BToA,
}

impl RelayDirection {
    pub fn source(&self) -> ChainSide {
        match self {
            RelayDirection::AToB => ChainSide::A,
            RelayDirection::BToA => ChainSide::B,
        }
    }

    pub fn destination(&self) -> ChainSide {
        match self {
            RelayDirection::AToB => ChainSide::B,
            RelayDirection::BToA => ChainSide::A,
        }
    }
}

impl fmt::Display for RelayDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayDirection::AToB => f.write_str("A→B"),
            RelayDirection::BToA => f.write_str("B→A"),
        }
    }
}

impl FromStr for RelayDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a-to-b" | "a→b" | "ab" => Ok(RelayDirection::AToB),
            "b-to-a" | "b→a" | "ba" => Ok(RelayDirection::BToA),
            other => Err(format!("unknown direction {:?}, expected a-to-b or b-to-a", other)),
        }
    }
}

/// Result of a verified message relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRelayOutcome {
    pub tx_hash: B256,
    pub direction: RelayDirection,
    pub message: String,
    pub batch_number: u64,
    pub message_index: u64,
    pub completed_at: DateTime<Utc>,
}

/// Result of an executed token transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenTransferOutcome {
    pub send_tx_hash: B256,
    pub execute_tx_hash: B256,
    pub amount: U256,
    pub direction: RelayDirection,
    pub asset_id: AssetId,
    pub batch_number: u64,
    pub message_index: u64,
    pub completed_at: DateTime<Utc>,
}

/// Everything a relay needs besides the chain clients
#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    pub account: Address,
    pub contracts: SystemContracts,
    pub polling: PollingConfig,
    pub asset_origin: Option<AssetOrigin>,
}

impl RelaySettings {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            contracts: SystemContracts::default(),
            polling: PollingConfig::default(),
            asset_origin: None,
        }
    }

    pub fn from_config(config: &RelayerConfig) -> Self {
        Self {
            account: config.global.account,
            contracts: config.contracts,
            polling: config.polling,
            asset_origin: config.asset,
        }
    }
}

/// Phase bookkeeping of one relay: state transitions, progress and failures
struct RelayRun<'a> {
    state: RelayState,
    progress: &'a dyn ProgressSink,
}

impl<'a> RelayRun<'a> {
    fn new(progress: &'a dyn ProgressSink) -> Self {
        Self {
            state: RelayState::default(),
            progress,
        }
    }

    /// Run the blocking work of `phase` and advance once it succeeds
    async fn phase<T, F>(&mut self, phase: RelayPhase, work: F) -> Result<T, RelayFailure>
    where
        F: Future<Output = Result<T, RelayError>>,
    {
        self.progress.report(&RelayProgress::PhaseStarted { phase });
        match work.await {
            Ok(value) => {
                self.state
                    .advance(phase)
                    .map_err(|e| self.fail(phase, e))?;
                self.progress.report(&RelayProgress::PhaseCompleted { phase });
                info!("Phase complete: {}", phase);
                Ok(value)
            }
            Err(e) => Err(self.fail(phase, e)),
        }
    }

    fn fail(&mut self, phase: RelayPhase, err: RelayError) -> RelayFailure {
        error!("Relay failed during {}: {}", phase, err);
        self.state.fail(phase, err.to_string());
        RelayFailure::new(phase, err)
    }
}

pub struct RelayOrchestrator {
    chain_a: Arc<dyn InteropChain>,
    chain_b: Arc<dyn InteropChain>,
    settings: RelaySettings,
    metrics: Option<Arc<RelayerMetrics>>,
}

impl RelayOrchestrator {
    pub fn new(chain_a: Arc<dyn InteropChain>, chain_b: Arc<dyn InteropChain>, settings: RelaySettings) -> Self {
        Self {
            chain_a,
            chain_b,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<RelayerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn chain(&self, side: ChainSide) -> &dyn InteropChain {
        match side {
            ChainSide::A => self.chain_a.as_ref(),
            ChainSide::B => self.chain_b.as_ref(),
        }
    }

    /// Asset id of `token` moved out of `source_chain_id` when the vault
    /// reports none. The configured origin applies to its own token only;
    /// any other token is taken as native to the source chain.
    pub fn asset_id_for(&self, token: Address, source_chain_id: u64) -> AssetId {
        let vault = self.settings.contracts.native_token_vault;
        match self.settings.asset_origin {
            Some(origin) if origin.token == token => origin.asset_id(vault),
            _ => compute_asset_id(source_chain_id, vault, token),
        }
    }

    /// Asset id the bundle burns for `token`. The vault registration wins and
    /// must agree with the configured origin when that names the same token.
    fn resolve_asset_id(
        &self,
        token: Address,
        source_chain_id: u64,
        registered: Option<AssetId>,
    ) -> Result<AssetId, RelayError> {
        let Some(registered) = registered else {
            return Ok(self.asset_id_for(token, source_chain_id));
        };
        let vault = self.settings.contracts.native_token_vault;
        match self.settings.asset_origin {
            Some(origin) if origin.token == token && origin.asset_id(vault) != registered => {
                Err(RelayError::AssetMismatch {
                    token,
                    registered,
                    configured: origin.asset_id(vault),
                })
            }
            _ => Ok(registered),
        }
    }

    /// Send `message` to L1 from the source chain and prove its inclusion on
    /// the destination chain.
    pub async fn send_interop_message(
        &self,
        message: &str,
        direction: RelayDirection,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<MessageRelayOutcome, RelayFailure> {
        let relay_id = Uuid::new_v4();
        let span = info_span!("relay", id = %relay_id, flow = "message", direction = %direction);
        self.observe(self.message_flow(message, direction, progress, cancel))
            .instrument(span)
            .await
    }

    /// Move `amount` of `token` from the source chain to the relayer account
    /// on the destination chain.
    pub async fn transfer_tokens_interop(
        &self,
        token: Address,
        amount: U256,
        direction: RelayDirection,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<TokenTransferOutcome, RelayFailure> {
        let relay_id = Uuid::new_v4();
        let span = info_span!("relay", id = %relay_id, flow = "token", direction = %direction);
        self.observe(self.token_flow(token, amount, direction, progress, cancel))
            .instrument(span)
            .await
    }

    /// Token registered for `asset_id` on `side`; `None` until the asset
    /// has been bridged there.
    pub async fn wrapped_token_address(&self, side: ChainSide, asset_id: AssetId) -> Result<Option<Address>, RelayError> {
        let chain = self.chain(side);
        let lookup = INativeTokenVault::tokenAddressCall { _assetId: asset_id };
        match read_contract(chain, self.settings.contracts.native_token_vault, &lookup).await {
            Ok(ret) if ret._0 == Address::ZERO => Ok(None),
            Ok(ret) => Ok(Some(ret._0)),
            Err(ChainError::Rpc { code, message, .. }) => {
                warn!("tokenAddress({}) reverted on chain {}: {} {}", asset_id, chain.chain_id(), code, message);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn token_balance(&self, side: ChainSide, token: Address, owner: Address) -> Result<U256, RelayError> {
        let ret = read_contract(self.chain(side), token, &IERC20::balanceOfCall { owner }).await?;
        Ok(ret._0)
    }

    async fn observe<T, F>(&self, relay: F) -> Result<T, RelayFailure>
    where
        F: Future<Output = Result<T, RelayFailure>>,
    {
        let started = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.relays_started.inc();
        }

        let result = relay.await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) => metrics.record_completed(started.elapsed()),
                Err(failure) => metrics.record_failed(failure.phase),
            }
        }
        result
    }

    fn endpoints(&self, direction: RelayDirection) -> (&dyn InteropChain, &dyn InteropChain) {
        (self.chain(direction.source()), self.chain(direction.destination()))
    }

    async fn message_flow(
        &self,
        message: &str,
        direction: RelayDirection,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<MessageRelayOutcome, RelayFailure> {
        let (source, destination) = self.endpoints(direction);
        let contracts = &self.settings.contracts;
        let account = self.settings.account;
        let message_bytes = Bytes::copy_from_slice(message.as_bytes());
        let mut run = RelayRun::new(progress);

        progress.report(&RelayProgress::Connected {
            source_chain: source.chain_id(),
            destination_chain: destination.chain_id(),
        });
        info!(
            "Relaying message from chain {} to chain {}",
            source.chain_id(),
            destination.chain_id()
        );

        let receipt = run
            .phase(RelayPhase::BundleSubmitted, async {
                let call = IL1Messenger::sendToL1Call {
                    _message: message_bytes.clone(),
                };
                let tx = TransactionRequest::contract_call(contracts.l1_messenger, &call).sender(account);
                let estimate = cancel
                    .run(async { source.estimate_gas(&tx).await.map_err(RelayError::Submission) })
                    .await?;
                let tx = tx
                    .gas(estimate.saturating_mul(2))
                    .eip1559_fees(GWEI, 0);
                let receipt = submit_and_wait(source, &tx, RelayPhase::BundleSubmitted, progress, cancel).await?;
                ensure_success(source, &receipt)?;
                Ok(receipt)
            })
            .await?;

        let proof = self.await_source_proof(&mut run, source, &receipt, progress, cancel).await?;
        self.await_root(&mut run, source, destination, &proof, cancel).await?;

        let tx_number_in_batch = tx_number_in_batch(&receipt).map_err(|e| run.fail(RelayPhase::Executed, e))?;
        let inclusion = build_inclusion_proof(
            source.chain_id(),
            &proof,
            ProvenMessage {
                tx_number_in_batch,
                sender: account,
                data: message_bytes,
            },
        );
        run.phase(
            RelayPhase::Executed,
            verify_message_inclusion(destination, contracts.message_verification, &inclusion),
        )
        .await?;

        info!("Message {} verified on chain {}", receipt.transaction_hash, destination.chain_id());
        Ok(MessageRelayOutcome {
            tx_hash: receipt.transaction_hash,
            direction,
            message: message.to_string(),
            batch_number: proof.batch_number,
            message_index: proof.id,
            completed_at: Utc::now(),
        })
    }

    async fn token_flow(
        &self,
        token: Address,
        amount: U256,
        direction: RelayDirection,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<TokenTransferOutcome, RelayFailure> {
        let (source, destination) = self.endpoints(direction);
        let contracts = &self.settings.contracts;
        let account = self.settings.account;
        let mut run = RelayRun::new(progress);

        progress.report(&RelayProgress::Connected {
            source_chain: source.chain_id(),
            destination_chain: destination.chain_id(),
        });
        info!(
            "Transferring {} of token {} from chain {} to chain {}",
            amount,
            token,
            source.chain_id(),
            destination.chain_id()
        );

        let asset_id = run
            .phase(RelayPhase::TokenRegistrationChecked, async {
                let registered = self.ensure_registered(source, token, progress, cancel).await?;
                self.resolve_asset_id(token, source.chain_id(), registered)
            })
            .await?;
        info!("Moving asset {}", asset_id);

        run.phase(RelayPhase::Approved, async {
            let approve = IERC20::approveCall {
                spender: contracts.native_token_vault,
                amount,
            };
            let tx = TransactionRequest::contract_call(token, &approve).sender(account);
            let receipt = submit_and_wait(source, &tx, RelayPhase::Approved, progress, cancel).await?;
            ensure_success(source, &receipt)
        })
        .await?;

        let send_bundle = run
            .phase(RelayPhase::BundleBuilt, async {
                let burn = build_transfer_bundle(asset_id, amount, account, Address::ZERO);
                Ok(IInteropCenter::sendBundleCall {
                    _destinationChainId: encode_chain_only(U256::from(destination.chain_id())),
                    _callStarters: transfer_call_starters(contracts.asset_router, burn),
                    _bundleAttributes: unbundler_attributes(account),
                })
            })
            .await?;

        let (receipt, bundle) = run
            .phase(RelayPhase::BundleSubmitted, async {
                let tx = TransactionRequest::contract_call(contracts.interop_center, &send_bundle)
                    .sender(account)
                    .gas(SEND_BUNDLE_GAS)
                    .gas_price(GWEI);
                let receipt = submit_and_wait(source, &tx, RelayPhase::BundleSubmitted, progress, cancel).await?;
                ensure_success(source, &receipt)?;
                let bundle = extract_bundle(receipt.transaction_hash, &receipt.logs, Some(contracts.interop_center))?;
                Ok((receipt, bundle))
            })
            .await?;
        info!(
            "Bundle sent in {} (block {}, {} call(s))",
            receipt.transaction_hash,
            receipt.block_number,
            bundle.calls.len()
        );

        let proof = self.await_source_proof(&mut run, source, &receipt, progress, cancel).await?;
        self.await_root(&mut run, source, destination, &proof, cancel).await?;

        let tx_number_in_batch = tx_number_in_batch(&receipt).map_err(|e| run.fail(RelayPhase::Executed, e))?;
        let encoded_bundle = encode_bundle_for_execution(&bundle);
        let inclusion = build_inclusion_proof(
            source.chain_id(),
            &proof,
            ProvenMessage {
                tx_number_in_batch,
                sender: contracts.interop_center,
                data: bundle_message_payload(&encoded_bundle),
            },
        );
        let executor = BundleExecutor::new(destination, contracts.interop_handler).with_sender(account);
        let execution = run
            .phase(
                RelayPhase::Executed,
                executor.execute(encoded_bundle, inclusion, progress, cancel),
            )
            .await?;

        Ok(TokenTransferOutcome {
            send_tx_hash: receipt.transaction_hash,
            execute_tx_hash: execution.transaction_hash,
            amount,
            direction,
            asset_id,
            batch_number: proof.batch_number,
            message_index: proof.id,
            completed_at: Utc::now(),
        })
    }

    /// Register `token` on the source vault unless it already has an asset id,
    /// then return the id the vault reports. A failed lookup is treated as
    /// unregistered.
    async fn ensure_registered(
        &self,
        source: &dyn InteropChain,
        token: Address,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Option<AssetId>, RelayError> {
        let vault = self.settings.contracts.native_token_vault;
        let lookup = INativeTokenVault::assetIdCall { _tokenAddress: token };
        let existing = cancel
            .run(async { Ok(read_contract(source, vault, &lookup).await) })
            .await?;

        match existing {
            Ok(ret) if ret._0 != B256::ZERO => {
                info!("Token {} already registered as {}", token, ret._0);
                return Ok(Some(ret._0));
            }
            Ok(_) => info!("Token {} not registered on chain {}", token, source.chain_id()),
            Err(e) => warn!("assetId lookup for {} failed, registering: {}", token, e),
        }

        let register = INativeTokenVault::ensureTokenIsRegisteredCall { _nativeToken: token };
        let tx = TransactionRequest::contract_call(vault, &register).sender(self.settings.account);
        let receipt = submit_and_wait(source, &tx, RelayPhase::TokenRegistrationChecked, progress, cancel).await?;
        ensure_success(source, &receipt)?;

        let registered = cancel
            .run(async { Ok(read_contract(source, vault, &lookup).await) })
            .await?;
        match registered {
            Ok(ret) if ret._0 != B256::ZERO => Ok(Some(ret._0)),
            Ok(_) => {
                warn!("Vault reports no asset id for {} after registration", token);
                Ok(None)
            }
            Err(e) => {
                warn!("assetId lookup for {} failed after registration: {}", token, e);
                Ok(None)
            }
        }
    }

    async fn await_source_proof(
        &self,
        run: &mut RelayRun<'_>,
        source: &dyn InteropChain,
        receipt: &TransactionReceipt,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ProofResponse, RelayFailure> {
        let polling = &self.settings.polling;

        run.phase(
            RelayPhase::Finalized,
            FinalityWaiter::new(source, polling.finality).wait_for_finality(receipt.block_number, cancel),
        )
        .await?;

        run.phase(
            RelayPhase::ProofObtained,
            ProofFetcher::new(source, polling.proof).fetch_inclusion_proof(receipt.transaction_hash, progress, cancel),
        )
        .await
    }

    async fn await_root(
        &self,
        run: &mut RelayRun<'_>,
        source: &dyn InteropChain,
        destination: &dyn InteropChain,
        proof: &ProofResponse,
        cancel: &CancelToken,
    ) -> Result<(), RelayFailure> {
        let waiter = RootPropagationWaiter::new(
            destination,
            self.settings.contracts.interop_root_storage,
            self.settings.polling.root,
        );
        run.phase(
            RelayPhase::RootPropagated,
            waiter.wait_for_root(source.chain_id(), proof.batch_number, proof.root, cancel),
        )
        .await
    }
}

fn ensure_success(chain: &dyn InteropChain, receipt: &TransactionReceipt) -> Result<(), RelayError> {
    if receipt.status {
        Ok(())
    } else {
        Err(RelayError::SubmissionReverted {
            chain_id: chain.chain_id(),
            tx_hash: receipt.transaction_hash,
        })
    }
}

fn tx_number_in_batch(receipt: &TransactionReceipt) -> Result<u16, RelayError> {
    u16::try_from(receipt.transaction_index).map_err(|_| {
        RelayError::Chain(ChainError::InvalidResponse(format!(
            "transaction index {} of {} does not fit in uint16",
            receipt.transaction_index, receipt.transaction_hash
        )))
    })
}
