// Chain-client collaborators used by the relay

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interop::proof::ProofResponse;

pub mod evm_rpc;
pub mod mock;

pub use evm_rpc::EvmRpcChain;
pub use mock::MockChain;

/// Errors raised by a chain client. Whether one is fatal is decided by the
/// relay phase that observed it, not here.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("ABI decode error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),
}

/// Generic chain interface for interop operations
#[async_trait]
pub trait InteropChain: Send + Sync {
    /// Numeric chain id
    fn chain_id(&self) -> u64;

    /// Estimate gas for a transaction
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError>;

    /// Sign and submit a transaction, returning its hash
    async fn submit_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError>;

    /// Wait until the transaction is mined
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ChainError>;

    /// Height of the latest finalized block, if the node reports one
    async fn finalized_block_number(&self) -> Result<Option<u64>, ChainError>;

    /// Inclusion proof of an L2->L1 log; `None` until the batch is finalized
    async fn inclusion_proof(
        &self,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<ProofResponse>, ChainError>;

    /// Read-only contract call against the latest state
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;
}

/// Transaction to be signed and submitted by the chain client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionRequest {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            ..Default::default()
        }
    }

    /// Transaction invoking a typed contract call
    pub fn contract_call<C: SolCall>(to: Address, call: &C) -> Self {
        Self::new(to, call.abi_encode())
    }

    pub fn sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn eip1559_fees(mut self, max_fee: u128, max_priority_fee: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee);
        self.max_priority_fee_per_gas = Some(max_priority_fee);
        self
    }

    /// First four bytes of the calldata, if present
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// Log emitted by a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub transaction_index: u64,
    pub status: bool,
    pub logs: Vec<ReceiptLog>,
}

/// ABI-encode a typed call, run it read-only and decode the return value.
pub async fn read_contract<C: SolCall>(
    chain: &dyn InteropChain,
    to: Address,
    call: &C,
) -> Result<C::Return, ChainError> {
    let output = chain.call(to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&output, true)?)
}
