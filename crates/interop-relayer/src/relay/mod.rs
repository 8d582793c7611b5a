// Interop relay: phase waiters and the orchestrator that sequences them

pub mod executor;
pub mod finality;
pub mod orchestrator;
pub mod polling;
pub mod progress;
pub mod proof;
pub mod root;
pub mod state;

pub use executor::{verify_message_inclusion, BundleExecutor};
pub use finality::{FinalityStatus, FinalityWaiter};
pub use orchestrator::{
    ChainSide, MessageRelayOutcome, RelayDirection, RelayOrchestrator, RelaySettings, TokenTransferOutcome,
};
pub use polling::{cancellation, poll_until, CancelHandle, CancelToken, PollError, PollOutcome, PollPolicy};
pub use progress::{progress_channel, NoProgress, ProgressSink, RelayProgress};
pub use proof::ProofFetcher;
pub use root::{RootPropagationWaiter, RootStatus};
pub use state::{RelayPhase, RelayState};

use tracing::debug;

use crate::chains::{InteropChain, TransactionReceipt, TransactionRequest};
use crate::error::RelayError;

/// Submit a transaction and wait for its receipt, both raced against
/// cancellation. The receipt status is left to the caller.
pub(crate) async fn submit_and_wait(
    chain: &dyn InteropChain,
    tx: &TransactionRequest,
    phase: RelayPhase,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<TransactionReceipt, RelayError> {
    let tx_hash = cancel
        .run(async { chain.submit_transaction(tx).await.map_err(RelayError::Submission) })
        .await?;
    debug!("Submitted {} on chain {} during {}", tx_hash, chain.chain_id(), phase);
    progress.report(&RelayProgress::TransactionSent { phase, tx_hash });

    // past this point the transaction may have landed
    let receipt = cancel
        .run(async {
            chain
                .wait_for_receipt(tx_hash)
                .await
                .map_err(|source| RelayError::ReceiptUnavailable {
                    chain_id: chain.chain_id(),
                    tx_hash,
                    source,
                })
        })
        .await?;
    debug!(
        "Transaction {} mined in block {} (status: {})",
        tx_hash, receipt.block_number, receipt.status
    );
    Ok(receipt)
}
