// JSON-RPC client for EVM-compatible interop chains
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{ChainError, InteropChain, ReceiptLog, TransactionReceipt, TransactionRequest};
use crate::config::ChainConfig;
use crate::interop::proof::ProofResponse;
use crate::relay::polling::{poll_until, CancelToken, PollError, PollOutcome, PollPolicy};

/// Chain reached over HTTP JSON-RPC. Transactions are signed by the node
/// (`eth_sendTransaction`), which must hold the relayer account.
pub struct EvmRpcChain {
    chain_id: u64,
    rpc_endpoint: String,
    receipt_policy: PollPolicy,
    next_id: AtomicU64,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: String,
    transaction_index: String,
    status: Option<String>,
    #[serde(default)]
    logs: Vec<ReceiptLog>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    number: String,
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_quantity(text: &str) -> Result<u64, ChainError> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("quantity without 0x prefix: {:?}", text)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("invalid quantity {:?}: {}", text, e)))
}

/// Transaction object as expected by `eth_estimateGas` / `eth_sendTransaction`
pub fn transaction_object(tx: &TransactionRequest) -> Value {
    let mut object = Map::new();
    if let Some(from) = tx.from {
        object.insert("from".into(), json!(from));
    }
    object.insert("to".into(), json!(tx.to));
    object.insert("data".into(), json!(tx.data));
    object.insert("value".into(), json!(format!("0x{:x}", tx.value)));
    if let Some(gas) = tx.gas {
        object.insert("gas".into(), json!(format!("0x{:x}", gas)));
    }
    if let Some(gas_price) = tx.gas_price {
        object.insert("gasPrice".into(), json!(format!("0x{:x}", gas_price)));
    }
    if let Some(max_fee) = tx.max_fee_per_gas {
        object.insert("maxFeePerGas".into(), json!(format!("0x{:x}", max_fee)));
    }
    if let Some(priority_fee) = tx.max_priority_fee_per_gas {
        object.insert("maxPriorityFeePerGas".into(), json!(format!("0x{:x}", priority_fee)));
    }
    Value::Object(object)
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TransactionReceipt, ChainError> {
        // Pre-Byzantium receipts carry no status; every interop chain has one.
        let status = match self.status.as_deref() {
            Some(status) => parse_quantity(status)? == 1,
            None => return Err(ChainError::InvalidResponse("receipt without status".to_string())),
        };
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            block_number: parse_quantity(&self.block_number)?,
            transaction_index: parse_quantity(&self.transaction_index)?,
            status,
            logs: self.logs,
        })
    }
}

impl EvmRpcChain {
    pub fn new(config: &ChainConfig, receipt_policy: PollPolicy) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            chain_id: config.chain_id,
            rpc_endpoint: config.rpc_endpoint.clone(),
            receipt_policy,
            next_id: AtomicU64::new(1),
            client,
        })
    }

    pub fn rpc_endpoint(&self) -> &str {
        &self.rpc_endpoint
    }

    /// Perform one JSON-RPC request. A `null` result only deserializes into
    /// an `Option`.
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("RPC {} #{} -> {}", method, id, self.rpc_endpoint);

        let response: Value = self
            .client
            .post(&self.rpc_endpoint)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let error: RpcErrorObject = serde_json::from_value(error.clone())
                .map_err(|e| ChainError::InvalidResponse(format!("malformed error object: {}", e)))?;
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        let result = response.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("{} result: {}", method, e)))
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>, ChainError> {
        let raw: Option<RawReceipt> = self.request("eth_getTransactionReceipt", json!([tx_hash])).await?;
        raw.map(RawReceipt::into_receipt).transpose()
    }
}

#[async_trait]
impl InteropChain for EvmRpcChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        let estimate: String = self.request("eth_estimateGas", json!([transaction_object(tx)])).await?;
        parse_quantity(&estimate)
    }

    async fn submit_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        self.request("eth_sendTransaction", json!([transaction_object(tx)])).await
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ChainError> {
        let cancel = CancelToken::never();
        let result = poll_until(&self.receipt_policy, &cancel, "receipt", |_| async move {
            match self.receipt(tx_hash).await {
                Ok(Some(receipt)) => PollOutcome::Ready(receipt),
                Ok(None) => PollOutcome::Pending,
                Err(e) => PollOutcome::Transient(e.to_string()),
            }
        })
        .await;

        // The token never fires and no attempt is fatal, so exhaustion is the
        // only way out of the loop.
        result.map_err(|err| {
            if let PollError::Exhausted { last_error, .. } = err {
                debug!("Receipt of {} missing (last error: {:?})", tx_hash, last_error);
            }
            ChainError::ReceiptTimeout(tx_hash)
        })
    }

    async fn finalized_block_number(&self) -> Result<Option<u64>, ChainError> {
        let block: Option<RawBlock> = self
            .request("eth_getBlockByNumber", json!(["finalized", false]))
            .await?;
        block.map(|b| parse_quantity(&b.number)).transpose()
    }

    async fn inclusion_proof(&self, tx_hash: B256, log_index: u64) -> Result<Option<ProofResponse>, ChainError> {
        self.request("zks_getL2ToL1LogProof", json!([tx_hash, log_index])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }
}
