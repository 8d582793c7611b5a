// Scriptable in-memory chain for relay tests
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use tracing::debug;

use super::{ChainError, InteropChain, ReceiptLog, TransactionReceipt, TransactionRequest};
use crate::interop::abi::{
    BundleAttributes, IERC20, IERC7786Attributes, IInteropCenter, IInteropRootStorage, IMessageVerification,
    INativeTokenVault, InteropBundle, InteropBundleSent, InteropCall, SystemContracts,
};
use crate::interop::asset::{compute_asset_id, AssetId};
use crate::interop::bundle::{bundle_hash, bundle_message_payload, encode_bundle_for_execution};
use crate::interop::proof::ProofResponse;

/// Scripted read result; `Err` surfaces as a JSON-RPC error
pub type MockRead<T> = Result<T, String>;

/// One request received by a mock chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    EstimateGas { to: Address },
    SubmitTransaction { to: Address, selector: Option<[u8; 4]> },
    WaitForReceipt { tx_hash: B256 },
    FinalizedBlock,
    InclusionProof { tx_hash: B256, log_index: u64 },
    Call { to: Address, selector: Option<[u8; 4]> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub chain_id: u64,
    pub call: MockCall,
}

/// Request log shared by several mock chains, in arrival order
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<JournalEntry>>>);

impl Journal {
    fn record(&self, chain_id: u64, call: MockCall) {
        let mut entries = self.0.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(JournalEntry { chain_id, call });
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first entry matching `predicate`
    pub fn position<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&JournalEntry) -> bool,
    {
        self.entries().iter().position(predicate)
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&JournalEntry) -> bool,
    {
        self.entries().iter().filter(|entry| predicate(entry)).count()
    }
}

/// Steps returned in order; the last one repeats forever
#[derive(Debug)]
struct Script<T> {
    steps: Vec<T>,
    cursor: usize,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<T>) -> Self {
        Self { steps, cursor: 0 }
    }

    fn next(&mut self) -> Option<T> {
        let last = self.steps.len().checked_sub(1)?;
        let step = self.steps[self.cursor.min(last)].clone();
        self.cursor += 1;
        Some(step)
    }
}

#[derive(Debug)]
struct MockState {
    block_number: u64,
    nonce: u64,
    gas_estimate: u64,
    transaction_index: u64,
    finalized: Script<MockRead<Option<u64>>>,
    proofs: Script<MockRead<Option<ProofResponse>>>,
    roots: HashMap<(u64, u64), Script<MockRead<B256>>>,
    registered: HashMap<Address, AssetId>,
    wrapped: HashMap<AssetId, Address>,
    balances: HashMap<(Address, Address), U256>,
    message_included: bool,
    reverting: HashSet<[u8; 4]>,
    rejected: HashSet<[u8; 4]>,
    unconfirmed: HashSet<[u8; 4]>,
    bundle_event_copies: usize,
    receipts: HashMap<B256, TransactionReceipt>,
    submitted: Vec<TransactionRequest>,
}

/// In-memory `InteropChain`. Models just enough of the system contracts for
/// a relay to run end to end: `sendBundle` emits `InteropBundleSent`,
/// `ensureTokenIsRegistered` registers the asset, and reads are answered by
/// selector. Finality, proofs and roots follow scripts.
pub struct MockChain {
    chain_id: u64,
    contracts: SystemContracts,
    journal: Journal,
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            contracts: SystemContracts::default(),
            journal: Journal::default(),
            state: Mutex::new(MockState {
                block_number: 100,
                nonce: 0,
                gas_estimate: 100_000,
                transaction_index: 0,
                finalized: Script::new(Vec::new()),
                proofs: Script::new(Vec::new()),
                roots: HashMap::new(),
                registered: HashMap::new(),
                wrapped: HashMap::new(),
                balances: HashMap::new(),
                message_included: true,
                reverting: HashSet::new(),
                rejected: HashSet::new(),
                unconfirmed: HashSet::new(),
                bundle_event_copies: 1,
                receipts: HashMap::new(),
                submitted: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record requests into a journal shared with other chains
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_block_number(self, block_number: u64) -> Self {
        self.state().block_number = block_number;
        self
    }

    pub fn with_transaction_index(self, index: u64) -> Self {
        self.state().transaction_index = index;
        self
    }

    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.state().gas_estimate = gas;
        self
    }

    /// Finalized heights returned by successive polls. Without a script every
    /// mined block is immediately final.
    pub fn script_finalized(self, steps: Vec<MockRead<Option<u64>>>) -> Self {
        self.state().finalized = Script::new(steps);
        self
    }

    /// Proof query results; without a script no proof is ever available
    pub fn script_proofs(self, steps: Vec<MockRead<Option<ProofResponse>>>) -> Self {
        self.state().proofs = Script::new(steps);
        self
    }

    /// `interopRoots(chain, batch)` results; unscripted pairs read as zero
    pub fn script_root(self, origin_chain_id: u64, batch_number: u64, steps: Vec<MockRead<B256>>) -> Self {
        self.state()
            .roots
            .insert((origin_chain_id, batch_number), Script::new(steps));
        self
    }

    pub fn with_registered_token(self, token: Address, asset_id: AssetId) -> Self {
        self.state().registered.insert(token, asset_id);
        self
    }

    pub fn with_wrapped_token(self, asset_id: AssetId, token: Address) -> Self {
        self.state().wrapped.insert(asset_id, token);
        self
    }

    pub fn with_balance(self, token: Address, owner: Address, balance: U256) -> Self {
        self.state().balances.insert((token, owner), balance);
        self
    }

    pub fn with_message_included(self, included: bool) -> Self {
        self.state().message_included = included;
        self
    }

    /// Transactions calling `selector` are mined with a failed status
    pub fn reverting(self, selector: [u8; 4]) -> Self {
        self.state().reverting.insert(selector);
        self
    }

    /// Transactions calling `selector` are refused at submission
    pub fn rejecting(self, selector: [u8; 4]) -> Self {
        self.state().rejected.insert(selector);
        self
    }

    /// Transactions calling `selector` are applied but their receipt never shows up
    pub fn unconfirmed(self, selector: [u8; 4]) -> Self {
        self.state().unconfirmed.insert(selector);
        self
    }

    /// Number of `InteropBundleSent` logs emitted per `sendBundle`
    pub fn with_bundle_event_copies(self, copies: usize) -> Self {
        self.state().bundle_event_copies = copies;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Every transaction accepted so far
    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.state().submitted.clone()
    }

    pub fn submitted_with(&self, selector: [u8; 4]) -> usize {
        self.state()
            .submitted
            .iter()
            .filter(|tx| tx.selector() == Some(selector))
            .count()
    }

    pub fn is_registered(&self, token: Address) -> bool {
        self.state().registered.contains_key(&token)
    }

    fn revert_error() -> ChainError {
        ChainError::Rpc {
            code: 3,
            message: "execution reverted".to_string(),
            data: None,
        }
    }

    fn read_error(message: String) -> ChainError {
        ChainError::Rpc {
            code: -32603,
            message,
            data: None,
        }
    }

    /// Logs and side effects of a successfully mined transaction
    fn apply(&self, state: &mut MockState, tx: &TransactionRequest, tx_hash: B256) -> Vec<ReceiptLog> {
        match tx.selector() {
            Some(IInteropCenter::sendBundleCall::SELECTOR) => {
                match self.bundle_from_call(tx, tx_hash) {
                    Some(bundle) => {
                        let encoded = encode_bundle_for_execution(&bundle);
                        let event = InteropBundleSent {
                            l2l1MsgHash: keccak256(bundle_message_payload(&encoded)),
                            interopBundleHash: bundle_hash(&bundle),
                            interopBundle: bundle,
                        };
                        let data = event.encode_log_data();
                        let log = ReceiptLog {
                            address: self.contracts.interop_center,
                            topics: data.topics().to_vec(),
                            data: data.data,
                        };
                        vec![log; state.bundle_event_copies]
                    }
                    None => Vec::new(),
                }
            }
            Some(INativeTokenVault::ensureTokenIsRegisteredCall::SELECTOR) => {
                if let Ok(call) = INativeTokenVault::ensureTokenIsRegisteredCall::abi_decode(&tx.data, true) {
                    let asset_id = compute_asset_id(self.chain_id, self.contracts.native_token_vault, call._nativeToken);
                    state.registered.insert(call._nativeToken, asset_id);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Rebuild the bundle the interop center would enqueue for `sendBundle`
    fn bundle_from_call(&self, tx: &TransactionRequest, tx_hash: B256) -> Option<InteropBundle> {
        let call = IInteropCenter::sendBundleCall::abi_decode(&tx.data, true).ok()?;

        // ERC-7930 chain-only: version(2) type(2) len(1) reference(len) addrlen(1)
        let destination = &call._destinationChainId;
        let reference_len = *destination.get(4)? as usize;
        let destination_chain_id = U256::from_be_slice(destination.get(5..5 + reference_len)?);

        let sender = tx.from.unwrap_or_default();
        let calls = call
            ._callStarters
            .iter()
            .map(|starter| {
                // ERC-7930 address-only: 6-byte header then the address
                let to = Address::from_slice(starter.to.get(6..26)?);
                Some(InteropCall {
                    version: FixedBytes([0x01]),
                    shadowAccount: false,
                    to,
                    from: sender,
                    value: U256::ZERO,
                    data: starter.data.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        let unbundler = call
            ._bundleAttributes
            .iter()
            .find_map(|attribute| IERC7786Attributes::unbundlerAddressCall::abi_decode(attribute, true).ok())
            .map(|attribute| attribute._unbundlerAddress)
            .unwrap_or_default();

        Some(InteropBundle {
            version: FixedBytes([0x01]),
            sourceChainId: U256::from(self.chain_id),
            destinationChainId: destination_chain_id,
            interopBundleSalt: keccak256(tx_hash),
            calls,
            bundleAttributes: BundleAttributes {
                executionAddress: Bytes::new(),
                unbundlerAddress: unbundler,
            },
        })
    }

    fn answer(&self, to: Address, data: &[u8]) -> Result<Bytes, ChainError> {
        let mut state = self.state();
        let selector: Option<[u8; 4]> = data.get(..4).and_then(|s| s.try_into().ok());

        let encoded = match selector {
            Some(INativeTokenVault::assetIdCall::SELECTOR) => {
                let call = INativeTokenVault::assetIdCall::abi_decode(data, true)?;
                state
                    .registered
                    .get(&call._tokenAddress)
                    .copied()
                    .unwrap_or(B256::ZERO)
                    .abi_encode()
            }
            Some(INativeTokenVault::tokenAddressCall::SELECTOR) => {
                let call = INativeTokenVault::tokenAddressCall::abi_decode(data, true)?;
                state
                    .wrapped
                    .get(&call._assetId)
                    .copied()
                    .unwrap_or(Address::ZERO)
                    .abi_encode()
            }
            Some(IInteropRootStorage::interopRootsCall::SELECTOR) => {
                let call = IInteropRootStorage::interopRootsCall::abi_decode(data, true)?;
                let key = (call.chainId.saturating_to::<u64>(), call.batchNumber.saturating_to::<u64>());
                let root = match state.roots.get_mut(&key).and_then(|script| script.next()) {
                    Some(Ok(root)) => root,
                    Some(Err(message)) => return Err(Self::read_error(message)),
                    None => B256::ZERO,
                };
                root.abi_encode()
            }
            Some(IMessageVerification::proveL2MessageInclusionSharedCall::SELECTOR) => {
                IMessageVerification::proveL2MessageInclusionSharedCall::abi_decode(data, true)?;
                state.message_included.abi_encode()
            }
            Some(IERC20::balanceOfCall::SELECTOR) => {
                let call = IERC20::balanceOfCall::abi_decode(data, true)?;
                state
                    .balances
                    .get(&(to, call.owner))
                    .copied()
                    .unwrap_or(U256::ZERO)
                    .abi_encode()
            }
            _ => return Err(Self::revert_error()),
        };
        Ok(encoded.into())
    }
}

#[async_trait]
impl InteropChain for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        self.journal.record(self.chain_id, MockCall::EstimateGas { to: tx.to });
        Ok(self.state().gas_estimate)
    }

    async fn submit_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        self.journal.record(
            self.chain_id,
            MockCall::SubmitTransaction {
                to: tx.to,
                selector: tx.selector(),
            },
        );

        let mut state = self.state();
        if tx.selector().map_or(false, |s| state.rejected.contains(&s)) {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "transaction rejected".to_string(),
                data: Some(serde_json::json!({ "to": tx.to })),
            });
        }

        state.nonce += 1;
        state.block_number += 1;
        let tx_hash = keccak256((U256::from(self.chain_id), U256::from(state.nonce)).abi_encode_params());
        let status = !tx.selector().map_or(false, |s| state.reverting.contains(&s));
        let logs = if status { self.apply(&mut state, tx, tx_hash) } else { Vec::new() };

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: state.block_number,
            transaction_index: state.transaction_index,
            status,
            logs,
        };
        debug!(
            "Mock chain {} mined {} in block {} (status: {})",
            self.chain_id, tx_hash, receipt.block_number, status
        );
        if !tx.selector().map_or(false, |s| state.unconfirmed.contains(&s)) {
            state.receipts.insert(tx_hash, receipt);
        }
        state.submitted.push(tx.clone());
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ChainError> {
        self.journal.record(self.chain_id, MockCall::WaitForReceipt { tx_hash });
        self.state()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ChainError::ReceiptTimeout(tx_hash))
    }

    async fn finalized_block_number(&self) -> Result<Option<u64>, ChainError> {
        self.journal.record(self.chain_id, MockCall::FinalizedBlock);
        let mut state = self.state();
        match state.finalized.next() {
            Some(Ok(height)) => Ok(height),
            Some(Err(message)) => Err(Self::read_error(message)),
            None => Ok(Some(state.block_number)),
        }
    }

    async fn inclusion_proof(&self, tx_hash: B256, log_index: u64) -> Result<Option<ProofResponse>, ChainError> {
        self.journal
            .record(self.chain_id, MockCall::InclusionProof { tx_hash, log_index });
        match self.state().proofs.next() {
            Some(Ok(proof)) => Ok(proof),
            Some(Err(message)) => Err(Self::read_error(message)),
            None => Ok(None),
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let selector = data.get(..4).and_then(|s| s.try_into().ok());
        self.journal.record(self.chain_id, MockCall::Call { to, selector });
        self.answer(to, &data)
    }
}
