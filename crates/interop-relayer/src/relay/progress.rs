// Phase-boundary progress events
use std::fmt;

use alloy_primitives::B256;
use futures::channel::mpsc;
use serde::Serialize;

use super::state::RelayPhase;

/// Progress of one relay, emitted before and after each blocking phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RelayProgress {
    Connected { source_chain: u64, destination_chain: u64 },
    PhaseStarted { phase: RelayPhase },
    PhaseCompleted { phase: RelayPhase },
    TransactionSent { phase: RelayPhase, tx_hash: B256 },
    Waiting { phase: RelayPhase, remaining_attempts: u32 },
}

impl fmt::Display for RelayProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayProgress::Connected {
                source_chain,
                destination_chain,
            } => write!(f, "Connected to chains {} and {}", source_chain, destination_chain),
            RelayProgress::PhaseStarted { phase } => f.write_str(match phase {
                RelayPhase::Init => "Starting relay...",
                RelayPhase::TokenRegistrationChecked => "Checking token registration...",
                RelayPhase::Approved => "Approving token transfer...",
                RelayPhase::BundleBuilt => "Building interop bundle...",
                RelayPhase::BundleSubmitted => "Sending transaction on source chain...",
                RelayPhase::Finalized => "Waiting for block to be finalized...",
                RelayPhase::ProofObtained => "Waiting for proof...",
                RelayPhase::RootPropagated => "Waiting for interop root to propagate...",
                RelayPhase::Executed => "Executing on destination chain...",
            }),
            RelayProgress::PhaseCompleted { phase } => f.write_str(match phase {
                RelayPhase::Init => "✓ Relay started",
                RelayPhase::TokenRegistrationChecked => "✓ Token registered",
                RelayPhase::Approved => "✓ Token approved",
                RelayPhase::BundleBuilt => "✓ Bundle built",
                RelayPhase::BundleSubmitted => "✓ Transaction confirmed",
                RelayPhase::Finalized => "✓ Block finalized",
                RelayPhase::ProofObtained => "✓ Proof obtained",
                RelayPhase::RootPropagated => "✓ Interop root matched",
                RelayPhase::Executed => "✓ Executed on destination chain",
            }),
            RelayProgress::TransactionSent { phase, tx_hash } => {
                write!(f, "Transaction sent ({}): {}", phase, tx_hash)
            }
            RelayProgress::Waiting {
                phase,
                remaining_attempts,
            } => write!(f, "Still waiting for {}... ({} attempts left)", phase, remaining_attempts),
        }
    }
}

/// Receives progress events synchronously. Must not affect the relay.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &RelayProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&RelayProgress) + Send + Sync,
{
    fn report(&self, event: &RelayProgress) {
        self(event)
    }
}

/// Event stream: a dropped receiver silently discards further events.
impl ProgressSink for mpsc::UnboundedSender<RelayProgress> {
    fn report(&self, event: &RelayProgress) {
        let _ = self.unbounded_send(event.clone());
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: &RelayProgress) {}
}

/// Sink/stream pair for consumers that prefer a `Stream` of events
pub fn progress_channel() -> (mpsc::UnboundedSender<RelayProgress>, mpsc::UnboundedReceiver<RelayProgress>) {
    mpsc::unbounded()
}
