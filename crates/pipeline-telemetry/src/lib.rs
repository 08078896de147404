//! # Pipeline Telemetry
//!
//! Logging and metrics plumbing for pipeline processes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pipeline_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let telemetry = init_telemetry(&TelemetryConfig::from_env())?;
//! let stage = registry.construct(&config, telemetry.metrics())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `pipeline` | Service name in log lines |
//! | `PIPELINE_LOG_LEVEL` | `info` | Log level filter |
//! | `PIPELINE_JSON_LOGS` | `false` | JSON log output |
//! | `PIPELINE_CONSOLE_OUTPUT` | `true` | Write logs to stderr |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{PrometheusMetrics, STAGE_EVENTS_METRIC};
pub use tracing_setup::{build_filter, init_tracing};

use pipeline_types::SharedMetrics;
use std::sync::Arc;
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialized logging plus the metrics sink handed to stages.
pub struct Telemetry {
    metrics: Arc<PrometheusMetrics>,
}

impl Telemetry {
    /// Metrics sink to pass to stage constructors.
    #[must_use]
    pub fn metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }

    /// Concrete Prometheus sink, for exposition.
    #[must_use]
    pub fn prometheus(&self) -> &PrometheusMetrics {
        &self.metrics
    }
}

/// Install the global tracing subscriber and create the metrics sink.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<Telemetry, TelemetryError> {
    let metrics = Arc::new(PrometheusMetrics::new()?);
    init_tracing(config)?;
    Ok(Telemetry { metrics })
}
