// Relay error taxonomy

use alloy_primitives::{Address, B256};
use thiserror::Error;

use crate::chains::ChainError;
use crate::interop::bundle::BundleError;
use crate::relay::state::RelayPhase;

/// How an error should be treated by whoever receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Read failures and "not yet available" states; handled inside poll loops
    Transient,
    /// A phase ran out of its polling budget
    BudgetExhausted,
    /// Cross-chain state disagrees with what is being relayed
    ProtocolViolation,
    /// A transaction was rejected at send time or reverted
    SubmissionRejected,
    /// A transaction was broadcast but its receipt was never observed
    OutcomeUnknown,
    Cancelled,
    Internal,
}

/// Errors produced by relay phases
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Block {block_number} was not finalized in time after {attempts} polls (last finalized: {last_finalized:?}, last error: {})", .last_error.as_deref().unwrap_or("none"))]
    FinalityTimeout {
        block_number: u64,
        last_finalized: Option<u64>,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Log proof for {tx_hash} did not become available in time after {attempts} polls. Last error: {}", .last_error.as_deref().unwrap_or("none"))]
    ProofUnavailable {
        tx_hash: B256,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Interop root for chain {chain_id} batch {batch_number} did not become available in time after {attempts} polls (last error: {})", .last_error.as_deref().unwrap_or("none"))]
    RootPropagationTimeout {
        chain_id: u64,
        batch_number: u64,
        attempts: u32,
        last_error: Option<String>,
    },

    #[error("Interop root mismatch for chain {chain_id} batch {batch_number}: expected {expected}, got {actual}")]
    RootMismatch {
        chain_id: u64,
        batch_number: u64,
        expected: B256,
        actual: B256,
    },

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("Failed to submit transaction: {0}")]
    Submission(#[source] ChainError),

    #[error("Transaction {tx_hash} reverted on chain {chain_id}")]
    SubmissionReverted { chain_id: u64, tx_hash: B256 },

    #[error("No receipt for transaction {tx_hash} on chain {chain_id}: {source}")]
    ReceiptUnavailable {
        chain_id: u64,
        tx_hash: B256,
        #[source]
        source: ChainError,
    },

    #[error("Execute bundle transaction {tx_hash} reverted on chain {chain_id}")]
    ExecutionReverted { chain_id: u64, tx_hash: B256 },

    #[error("Message {index} of batch {batch_number} from chain {chain_id} was NOT included")]
    MessageNotIncluded {
        chain_id: u64,
        batch_number: u64,
        index: u64,
    },

    #[error("Token {token} is registered as {registered}, configured asset is {configured}")]
    AssetMismatch {
        token: Address,
        registered: B256,
        configured: B256,
    },

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Relay cancelled")]
    Cancelled,

    #[error("Invalid relay transition from {from} to {to}")]
    InvalidTransition { from: RelayPhase, to: RelayPhase },
}

impl RelayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RelayError::FinalityTimeout { .. }
            | RelayError::ProofUnavailable { .. }
            | RelayError::RootPropagationTimeout { .. } => ErrorClass::BudgetExhausted,
            RelayError::RootMismatch { .. }
            | RelayError::Bundle(_)
            | RelayError::MessageNotIncluded { .. }
            | RelayError::AssetMismatch { .. } => ErrorClass::ProtocolViolation,
            RelayError::Submission(_)
            | RelayError::SubmissionReverted { .. }
            | RelayError::ExecutionReverted { .. } => ErrorClass::SubmissionRejected,
            RelayError::ReceiptUnavailable { .. } => ErrorClass::OutcomeUnknown,
            RelayError::Chain(err) => match err {
                ChainError::Transport(_) | ChainError::Rpc { .. } => ErrorClass::Transient,
                ChainError::Abi(_) | ChainError::InvalidResponse(_) => ErrorClass::ProtocolViolation,
                ChainError::ReceiptTimeout(_) => ErrorClass::OutcomeUnknown,
            },
            RelayError::Cancelled => ErrorClass::Cancelled,
            RelayError::InvalidTransition { .. } => ErrorClass::Internal,
        }
    }

    /// Whether a caller may start the relay again. Never true once a
    /// transaction may have landed, nor for protocol violations.
    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::BudgetExhausted | ErrorClass::Transient)
    }
}

/// Terminal failure of one relay: the phase that failed and why
#[derive(Error, Debug)]
#[error("Relay failed during {phase}: {source}")]
pub struct RelayFailure {
    pub phase: RelayPhase,
    #[source]
    pub source: RelayError,
}

impl RelayFailure {
    pub fn new(phase: RelayPhase, source: RelayError) -> Self {
        Self { phase, source }
    }

    pub fn class(&self) -> ErrorClass {
        self.source.class()
    }
}
