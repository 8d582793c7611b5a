// Interop Relayer Library
// Relays messages and token bundles between two L2 chains using finalized inclusion proofs

pub mod chains;
pub mod config;
pub mod error;
pub mod interop;
pub mod metrics;
pub mod relay;

// Re-export commonly used types for convenience
pub use chains::{ChainError, EvmRpcChain, InteropChain, MockChain, TransactionReceipt, TransactionRequest};
pub use config::{ChainConfig, PollingConfig, RelayerConfig};
pub use error::{ErrorClass, RelayError, RelayFailure};
pub use metrics::RelayerMetrics;
pub use relay::{
    cancellation, CancelHandle, CancelToken, ChainSide, MessageRelayOutcome, ProgressSink, RelayDirection,
    RelayOrchestrator, RelayPhase, RelayProgress, RelaySettings, TokenTransferOutcome,
};
