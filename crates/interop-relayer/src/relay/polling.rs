// Bounded polling with an explicit retry/fatal boundary, and cooperative cancellation
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::RelayError;

/// Fixed-interval polling budget for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay between attempts, e.g. "100ms" or "1s"
    #[serde(serialize_with = "serialize_interval", deserialize_with = "deserialize_interval")]
    pub interval: Duration,
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }

    /// 100 ms x 600: one minute
    pub fn finality_default() -> Self {
        Self::new(Duration::from_millis(100), 600)
    }

    /// 500 ms x 240: two minutes
    pub fn proof_default() -> Self {
        Self::new(Duration::from_millis(500), 240)
    }

    /// 1 s x 300: five minutes
    pub fn root_default() -> Self {
        Self::new(Duration::from_secs(1), 300)
    }

    pub fn receipt_default() -> Self {
        Self::new(Duration::from_millis(500), 240)
    }

    /// Upper bound on time spent sleeping between attempts
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

fn serialize_interval<S: Serializer>(interval: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*interval).to_string())
}

fn deserialize_interval<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

/// Result of a single poll attempt
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// Done, stop polling
    Ready(T),
    /// Not available yet, keep polling
    Pending,
    /// Read failed, keep polling and remember the error
    Transient(String),
    /// Stop immediately
    Fatal(RelayError),
}

/// Why a poll loop ended without a value
#[derive(Debug)]
pub enum PollError {
    Exhausted { attempts: u32, last_error: Option<String> },
    Cancelled,
    Fatal(RelayError),
}

impl PollError {
    /// Map to a relay error, building the phase-specific timeout from the
    /// attempt count and last transient error.
    pub fn into_relay_error<F>(self, exhausted: F) -> RelayError
    where
        F: FnOnce(u32, Option<String>) -> RelayError,
    {
        match self {
            PollError::Exhausted { attempts, last_error } => exhausted(attempts, last_error),
            PollError::Cancelled => RelayError::Cancelled,
            PollError::Fatal(err) => err,
        }
    }
}

/// Run `attempt` once per interval until it yields `Ready` or `Fatal`, the
/// budget runs out, or `cancel` fires. The attempt closure receives the
/// 1-based attempt number. There is no sleep after the final attempt.
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancelToken,
    label: &str,
    mut attempt: F,
) -> Result<T, PollError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = PollOutcome<T>>,
{
    let mut last_error = None;

    for n in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            debug!("{} cancelled before attempt {}", label, n);
            return Err(PollError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            outcome = attempt(n) => outcome,
        };

        match outcome {
            PollOutcome::Ready(value) => {
                debug!("{} ready after {} attempt(s)", label, n);
                return Ok(value);
            }
            PollOutcome::Fatal(err) => return Err(PollError::Fatal(err)),
            PollOutcome::Pending => {
                debug!("{} pending ({}/{})", label, n, policy.max_attempts);
            }
            PollOutcome::Transient(err) => {
                warn!("{} attempt {}/{} failed: {}", label, n, policy.max_attempts, err);
                last_error = Some(err);
            }
        }

        if n < policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = sleep(policy.interval) => {}
            }
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}

/// Owner side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

/// Observer side of a cancellation signal; cheap to clone
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

/// Create a linked handle/token pair
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelToken { receiver })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            receiver: self.sender.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }

    /// Race a relay step against cancellation.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, RelayError>
    where
        F: Future<Output = Result<T, RelayError>>,
    {
        if self.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(RelayError::Cancelled),
            result = fut => result,
        }
    }
}
