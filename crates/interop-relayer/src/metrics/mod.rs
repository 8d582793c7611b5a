// Relay metrics

use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;

use crate::relay::RelayPhase;

pub struct RelayerMetrics {
    pub relays_started: Counter,
    pub relays_completed: Counter,
    /// Failed relays, labelled by the phase that failed
    pub relays_failed: CounterVec,
    pub relay_duration: Histogram,

    registry: Arc<Registry>,
}

impl RelayerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let relays_started = Counter::new("interop_relays_started_total", "Total relays started")?;
        let relays_completed = Counter::new("interop_relays_completed_total", "Total relays executed end to end")?;
        let relays_failed = CounterVec::new(
            Opts::new("interop_relays_failed_total", "Total relays that failed, by phase"),
            &["phase"],
        )?;
        let relay_duration = Histogram::with_opts(
            HistogramOpts::new("interop_relay_duration_seconds", "Time from submission to execution")
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        )?;

        registry.register(Box::new(relays_started.clone()))?;
        registry.register(Box::new(relays_completed.clone()))?;
        registry.register(Box::new(relays_failed.clone()))?;
        registry.register(Box::new(relay_duration.clone()))?;

        Ok(Self {
            relays_started,
            relays_completed,
            relays_failed,
            relay_duration,
            registry,
        })
    }

    pub fn record_completed(&self, elapsed: Duration) {
        self.relays_completed.inc();
        self.relay_duration.observe(elapsed.as_secs_f64());
    }

    pub fn record_failed(&self, phase: RelayPhase) {
        self.relays_failed.with_label_values(&[phase.name()]).inc();
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> prometheus::Result<String> {
        use prometheus::Encoder;

        let mut buffer = Vec::new();
        prometheus::TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
