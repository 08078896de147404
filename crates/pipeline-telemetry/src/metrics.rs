//! Prometheus-backed metrics sink for pipeline stages.
//!
//! All stage counters land in one `IntCounterVec`,
//! `pipeline_stage_events_total{counter="<name>"}`, so new counters need no
//! registration step.

use pipeline_types::MetricsSink;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

/// Metric family holding every stage counter.
pub const STAGE_EVENTS_METRIC: &str = "pipeline_stage_events_total";

/// `MetricsSink` that records into a Prometheus registry.
pub struct PrometheusMetrics {
    registry: Registry,
    events: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create a sink with its own registry.
    pub fn new() -> Result<Self, TelemetryError> {
        Self::with_registry(Registry::new())
    }

    /// Create a sink that registers into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, TelemetryError> {
        let events = IntCounterVec::new(
            Opts::new(STAGE_EVENTS_METRIC, "Pipeline stage events by counter name"),
            &["counter"],
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        registry
            .register(Box::new(events.clone()))
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        Ok(Self { registry, events })
    }

    /// Current value of one counter.
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.events.with_label_values(&[name]).get()
    }

    /// Render all metrics in the Prometheus text exposition format.
    pub fn gather(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsSink for PrometheusMetrics {
    fn incr(&self, name: &str, value: u64) {
        self.events.with_label_values(&[name]).inc_by(value);
    }
}
