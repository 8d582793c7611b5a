// Fetching L2->L1 log proofs once a transaction is finalized
use alloy_primitives::B256;
use tracing::info;

use super::polling::{poll_until, CancelToken, PollOutcome, PollPolicy};
use super::progress::{ProgressSink, RelayProgress};
use super::state::RelayPhase;
use crate::chains::{ChainError, InteropChain};
use crate::error::RelayError;
use crate::interop::proof::ProofResponse;

/// Index of the relayed log within its transaction
pub const RELAYED_LOG_INDEX: u64 = 0;

/// Attempts between two `Waiting` progress reports
pub const PROGRESS_EVERY: u32 = 10;

/// Map one proof query to a poll outcome: absent means not ready yet, and
/// errors are kept for diagnostics only.
pub fn classify_proof(result: Result<Option<ProofResponse>, ChainError>) -> PollOutcome<ProofResponse> {
    match result {
        Ok(Some(proof)) => PollOutcome::Ready(proof),
        Ok(None) => PollOutcome::Pending,
        Err(e) => PollOutcome::Transient(e.to_string()),
    }
}

pub struct ProofFetcher<'a> {
    chain: &'a dyn InteropChain,
    policy: PollPolicy,
}

impl<'a> ProofFetcher<'a> {
    pub fn new(chain: &'a dyn InteropChain, policy: PollPolicy) -> Self {
        Self { chain, policy }
    }

    /// Must only be called after the transaction's block is finalized.
    pub async fn fetch_inclusion_proof(
        &self,
        tx_hash: B256,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ProofResponse, RelayError> {
        let chain = self.chain;
        let max_attempts = self.policy.max_attempts;

        let proof = poll_until(&self.policy, cancel, "inclusion proof", move |attempt| async move {
            if attempt % PROGRESS_EVERY == 0 {
                progress.report(&RelayProgress::Waiting {
                    phase: RelayPhase::ProofObtained,
                    remaining_attempts: max_attempts - attempt,
                });
            }
            classify_proof(chain.inclusion_proof(tx_hash, RELAYED_LOG_INDEX).await)
        })
        .await
        .map_err(|err| {
            err.into_relay_error(|attempts, last_error| RelayError::ProofUnavailable {
                tx_hash,
                attempts,
                last_error,
            })
        })?;

        info!(
            "Log proof for {} available: batch {}, index {}",
            tx_hash, proof.batch_number, proof.id
        );
        Ok(proof)
    }
}
