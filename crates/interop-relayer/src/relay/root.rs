// Waiting for a source batch root to appear on the destination chain
use alloy_primitives::{Address, B256, U256};
use tracing::{info, warn};

use super::polling::{poll_until, CancelToken, PollOutcome, PollPolicy};
use crate::chains::{read_contract, InteropChain};
use crate::error::RelayError;
use crate::interop::abi::IInteropRootStorage;

/// Observed root relative to the expected one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus {
    Absent,
    Matched,
    Mismatched(B256),
}

/// Roots are compared as bytes; a zero root means not yet propagated.
pub fn classify_root(observed: B256, expected: B256) -> RootStatus {
    if observed == B256::ZERO {
        RootStatus::Absent
    } else if observed == expected {
        RootStatus::Matched
    } else {
        RootStatus::Mismatched(observed)
    }
}

pub struct RootPropagationWaiter<'a> {
    chain: &'a dyn InteropChain,
    root_storage: Address,
    policy: PollPolicy,
}

impl<'a> RootPropagationWaiter<'a> {
    pub fn new(chain: &'a dyn InteropChain, root_storage: Address, policy: PollPolicy) -> Self {
        Self {
            chain,
            root_storage,
            policy,
        }
    }

    /// Poll root storage for `(origin_chain_id, batch_number)`. A different
    /// non-zero root fails at once with `RootMismatch`.
    pub async fn wait_for_root(
        &self,
        origin_chain_id: u64,
        batch_number: u64,
        expected_root: B256,
        cancel: &CancelToken,
    ) -> Result<(), RelayError> {
        let chain = self.chain;
        let storage = self.root_storage;
        let lookup = IInteropRootStorage::interopRootsCall {
            chainId: U256::from(origin_chain_id),
            batchNumber: U256::from(batch_number),
        };
        let lookup = &lookup;

        info!(
            "Waiting for interop root of chain {} batch {} on chain {} (expected {})",
            origin_chain_id,
            batch_number,
            chain.chain_id(),
            expected_root
        );

        poll_until(&self.policy, cancel, "interop root", move |_| async move {
            let observed = match read_contract(chain, storage, lookup).await {
                Ok(ret) => ret._0,
                Err(e) => return PollOutcome::Transient(e.to_string()),
            };
            match classify_root(observed, expected_root) {
                RootStatus::Absent => PollOutcome::Pending,
                RootStatus::Matched => PollOutcome::Ready(()),
                RootStatus::Mismatched(actual) => {
                    warn!("Interop root mismatch: expected {}, got {}", expected_root, actual);
                    PollOutcome::Fatal(RelayError::RootMismatch {
                        chain_id: origin_chain_id,
                        batch_number,
                        expected: expected_root,
                        actual,
                    })
                }
            }
        })
        .await
        .map_err(|err| {
            err.into_relay_error(|attempts, last_error| RelayError::RootPropagationTimeout {
                chain_id: origin_chain_id,
                batch_number,
                attempts,
                last_error,
            })
        })
    }
}
