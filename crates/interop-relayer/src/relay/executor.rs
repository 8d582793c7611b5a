// Destination-side execution and verification
use alloy_primitives::{Address, Bytes};
use tracing::{error, info};

use super::polling::CancelToken;
use super::progress::ProgressSink;
use super::state::RelayPhase;
use super::submit_and_wait;
use crate::chains::{read_contract, InteropChain, TransactionReceipt, TransactionRequest};
use crate::error::RelayError;
use crate::interop::abi::{IInteropHandler, IMessageVerification, MessageInclusionProof};

/// Submits a bundle with its inclusion proof to the destination handler
pub struct BundleExecutor<'a> {
    chain: &'a dyn InteropChain,
    handler: Address,
    sender: Option<Address>,
}

impl<'a> BundleExecutor<'a> {
    pub fn new(chain: &'a dyn InteropChain, handler: Address) -> Self {
        Self {
            chain,
            handler,
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Execute once. A reverted receipt is `ExecutionReverted` and is never
    /// resubmitted: the destination rejected the proof or the bundle.
    pub async fn execute(
        &self,
        encoded_bundle: Bytes,
        proof: MessageInclusionProof,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<TransactionReceipt, RelayError> {
        let call = IInteropHandler::executeBundleCall {
            _bundle: encoded_bundle,
            _proof: proof,
        };
        let mut tx = TransactionRequest::contract_call(self.handler, &call);
        if let Some(sender) = self.sender {
            tx = tx.sender(sender);
        }

        let receipt = submit_and_wait(self.chain, &tx, RelayPhase::Executed, progress, cancel).await?;
        if !receipt.status {
            error!(
                "executeBundle {} reverted on chain {}",
                receipt.transaction_hash,
                self.chain.chain_id()
            );
            return Err(RelayError::ExecutionReverted {
                chain_id: self.chain.chain_id(),
                tx_hash: receipt.transaction_hash,
            });
        }

        info!(
            "Bundle executed on chain {} in tx {}",
            self.chain.chain_id(),
            receipt.transaction_hash
        );
        Ok(receipt)
    }
}

/// Ask the destination chain whether a message is provably included in the
/// source batch. `false` is `MessageNotIncluded`.
pub async fn verify_message_inclusion(
    chain: &dyn InteropChain,
    verifier: Address,
    proof: &MessageInclusionProof,
) -> Result<(), RelayError> {
    let call = IMessageVerification::proveL2MessageInclusionSharedCall {
        chainId: proof.chainId,
        batchNumber: proof.l1BatchNumber,
        index: proof.l2MessageIndex,
        message: proof.message.clone(),
        proof: proof.proof.clone(),
    };
    let included = read_contract(chain, verifier, &call).await?._0;

    if included {
        Ok(())
    } else {
        Err(RelayError::MessageNotIncluded {
            chain_id: proof.chainId.saturating_to(),
            batch_number: proof.l1BatchNumber.saturating_to(),
            index: proof.l2MessageIndex.saturating_to(),
        })
    }
}
