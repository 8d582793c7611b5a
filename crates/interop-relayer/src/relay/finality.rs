// Waiting for a source-chain block to be finalized
use std::sync::Mutex;

use tracing::{debug, info};

use super::polling::{poll_until, CancelToken, PollOutcome, PollPolicy};
use crate::chains::InteropChain;
use crate::error::RelayError;

/// Observation of the finalized tag relative to a target height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalityStatus {
    Pending,
    Finalized,
    TimedOut,
}

/// A node that reports no finalized block yet is treated as height zero.
pub fn classify_finality(finalized: Option<u64>, target: u64) -> FinalityStatus {
    if finalized.unwrap_or(0) >= target {
        FinalityStatus::Finalized
    } else {
        FinalityStatus::Pending
    }
}

pub struct FinalityWaiter<'a> {
    chain: &'a dyn InteropChain,
    policy: PollPolicy,
}

impl<'a> FinalityWaiter<'a> {
    pub fn new(chain: &'a dyn InteropChain, policy: PollPolicy) -> Self {
        Self { chain, policy }
    }

    /// Poll the finalized tag until it reaches `block_number`. Read errors
    /// count as ordinary retries. Returns the observed finalized height.
    pub async fn wait_for_finality(&self, block_number: u64, cancel: &CancelToken) -> Result<u64, RelayError> {
        let chain = self.chain;
        let last_seen = Mutex::new(None::<u64>);
        let last_seen_ref = &last_seen;

        info!(
            "Waiting for block {} to be finalized on chain {}",
            block_number,
            chain.chain_id()
        );

        let result = poll_until(&self.policy, cancel, "finality", move |_| async move {
            match chain.finalized_block_number().await {
                Ok(finalized) => {
                    if let Ok(mut seen) = last_seen_ref.lock() {
                        *seen = finalized;
                    }
                    match classify_finality(finalized, block_number) {
                        FinalityStatus::Finalized => PollOutcome::Ready(finalized.unwrap_or(0)),
                        _ => {
                            debug!("Finalized height {:?} below target {}", finalized, block_number);
                            PollOutcome::Pending
                        }
                    }
                }
                Err(e) => PollOutcome::Transient(e.to_string()),
            }
        })
        .await;

        let last_finalized = last_seen.lock().ok().and_then(|seen| *seen);
        result.map_err(|err| {
            err.into_relay_error(|attempts, last_error| RelayError::FinalityTimeout {
                block_number,
                last_finalized,
                attempts,
                last_error,
            })
        })
    }
}
