// Per-relay protocol state machine

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RelayError;

/// Phases of one relay, in protocol order. A phase value names the work that
/// completes on entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelayPhase {
    Init,
    TokenRegistrationChecked,
    Approved,
    BundleBuilt,
    BundleSubmitted,
    Finalized,
    ProofObtained,
    RootPropagated,
    Executed,
}

impl RelayPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RelayPhase::Init => "initialization",
            RelayPhase::TokenRegistrationChecked => "token registration",
            RelayPhase::Approved => "approval",
            RelayPhase::BundleBuilt => "bundle construction",
            RelayPhase::BundleSubmitted => "submission",
            RelayPhase::Finalized => "finality",
            RelayPhase::ProofObtained => "inclusion proof",
            RelayPhase::RootPropagated => "root propagation",
            RelayPhase::Executed => "execution",
        }
    }
}

impl fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-local state of one in-flight relay. Never persisted, never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    Active(RelayPhase),
    Failed { phase: RelayPhase, reason: String },
}

impl Default for RelayState {
    fn default() -> Self {
        RelayState::Active(RelayPhase::Init)
    }
}

impl RelayState {
    /// Move forward to `next`. Phases may be skipped (the message flow has no
    /// token phases) but never revisited.
    pub fn advance(&mut self, next: RelayPhase) -> Result<(), RelayError> {
        match *self {
            RelayState::Active(current) if next > current => {
                *self = RelayState::Active(next);
                Ok(())
            }
            RelayState::Active(current) => Err(RelayError::InvalidTransition { from: current, to: next }),
            RelayState::Failed { phase, .. } => Err(RelayError::InvalidTransition { from: phase, to: next }),
        }
    }

    /// Terminal failure while working towards `phase`
    pub fn fail(&mut self, phase: RelayPhase, reason: impl Into<String>) {
        *self = RelayState::Failed {
            phase,
            reason: reason.into(),
        };
    }

    pub fn phase(&self) -> RelayPhase {
        match self {
            RelayState::Active(phase) => *phase,
            RelayState::Failed { phase, .. } => *phase,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Active(RelayPhase::Executed) | RelayState::Failed { .. })
    }
}
