//! # Metrics Capability
//!
//! Stages receive a `MetricsSink` at construction and report counters through
//! it. The sink decides where counters end up (Prometheus, memory, nowhere).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Counter sink handed to stages at construction.
pub trait MetricsSink: Send + Sync {
    /// Add `value` to the counter `name`.
    fn incr(&self, name: &str, value: u64);
}

/// Shared handle to a metrics sink.
pub type SharedMetrics = Arc<dyn MetricsSink>;

/// Discards every counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr(&self, _name: &str, _value: u64) {}
}

/// In-memory counters, for tests and local inspection.
#[derive(Debug, Default)]
pub struct LocalMetrics {
    counters: Mutex<HashMap<String, u64>>,
}

impl LocalMetrics {
    /// Create an empty set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter (0 if never incremented).
    #[must_use]
    pub fn get(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }
}

impl MetricsSink for LocalMetrics {
    fn incr(&self, name: &str, value: u64) {
        *self.counters.lock().entry(name.to_string()).or_insert(0) += value;
    }
}
