//! # Pipeline Runtime
//!
//! Reads transactions (one per line) from stdin, passes them through the
//! configured buffer stage, and writes them to stdout.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (tracing to stderr, Prometheus counters)
//! 2. Load configuration from the environment
//! 3. Construct the buffer stage via the registry
//! 4. Run until end of input or Ctrl+C
//!
//! A stage that fails to confirm close within the shutdown timeout is treated
//! as stuck: the process exits with a non-zero status.

use anyhow::{Context, Result};
use pipeline_runtime::{PipelineRuntime, RuntimeConfig};
use pipeline_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

async fn run() -> Result<()> {
    let telemetry = init_telemetry(&TelemetryConfig::for_service("pipeline-runtime"))
        .context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    info!(
        buffer = %config.buffer.buffer_type,
        shutdown_timeout = ?config.shutdown_timeout,
        "Starting pipeline runtime"
    );

    let runtime = PipelineRuntime::new(config, telemetry.metrics());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let summary = runtime
        .run(
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            shutdown,
        )
        .await?;

    info!(
        delivered = summary.delivered,
        interrupted = summary.interrupted,
        "Pipeline runtime finished"
    );
    if let Ok(metrics) = telemetry.prometheus().gather() {
        tracing::debug!(metrics = %metrics, "Final stage metrics");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Exit explicitly: a blocking stdin read would otherwise hold the runtime
    // open after an interrupted run.
    match run().await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!(error = ?e, "Pipeline runtime aborted");
            eprintln!("pipeline-runtime: {e:#}");
            std::process::exit(1);
        }
    }
}
