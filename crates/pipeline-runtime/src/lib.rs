//! # Pipeline Runtime
//!
//! Orchestrates one buffer stage between a line-oriented producer and a
//! writer-backed consumer.
//!
//! ```text
//!   input lines ──→ producer task ──inbound──→ [buffer stage] ──outbound──→ writer
//!                        ↑                                                    │
//!                        └───────────── ack / StageClosed ────────────────────┘
//! ```
//!
//! ## Shutdown Sequence
//!
//! 1. End of input closes inbound, or the shutdown future fires `stop_consuming`
//! 2. Keep reading outbound until the stage closes it
//! 3. `wait_for_close(shutdown_timeout)`; a timeout is a forced-abort condition

pub mod config;

pub use config::RuntimeConfig;

use anyhow::{Context, Result};
use pipeline_buffer::{Buffer, BufferRegistry};
use pipeline_types::{Message, SharedMetrics, Transaction};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Transactions written to the output and acknowledged.
    pub delivered: u64,
    /// Whether shutdown was requested before end of input.
    pub interrupted: bool,
}

/// Drives one buffer stage from construction to confirmed close.
pub struct PipelineRuntime {
    config: RuntimeConfig,
    registry: BufferRegistry,
    metrics: SharedMetrics,
}

impl PipelineRuntime {
    /// Create a runtime using the built-in buffer variants.
    pub fn new(config: RuntimeConfig, metrics: SharedMetrics) -> Self {
        Self::with_registry(config, BufferRegistry::with_defaults(), metrics)
    }

    /// Create a runtime with a custom registry.
    pub fn with_registry(
        config: RuntimeConfig,
        registry: BufferRegistry,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            config,
            registry,
            metrics,
        }
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run until the input ends or `shutdown` resolves, then wait for the
    /// stage to close.
    ///
    /// Returns an error if the stage cannot be built or does not confirm close
    /// within `shutdown_timeout`. The latter means the stage may still be
    /// running and the process should exit.
    pub async fn run<R, W, S>(&self, input: R, mut output: W, shutdown: S) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let stage = self
            .registry
            .construct(&self.config.buffer, self.metrics.clone())
            .context("Failed to construct buffer stage")?;

        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.inbound_capacity);
        stage
            .start_receiving(inbound_rx)
            .context("Failed to attach inbound source")?;

        info!(
            buffer = %self.config.buffer.buffer_type,
            inbound_capacity = self.config.inbound_capacity,
            "Pipeline running"
        );

        let producer = tokio::spawn(produce(input, inbound_tx));
        let outbound = stage.transaction_chan();
        let mut summary = RunSummary::default();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                next = outbound.recv() => {
                    let Some(transaction) = next else { break };
                    match write_message(&mut output, transaction.payload()).await {
                        Ok(()) => {
                            transaction.ack();
                            summary.delivered += 1;
                        }
                        Err(e) => {
                            warn!(error = %e, "Failed to write transaction");
                            transaction.reject(e.to_string());
                        }
                    }
                }
                () = &mut shutdown, if !summary.interrupted => {
                    info!("Shutdown signal received");
                    summary.interrupted = true;
                    stage.stop_consuming();
                }
            }
        }
        output.flush().await.context("Failed to flush output")?;

        // A producer blocked on input that never ends must not outlive the run.
        producer.abort();

        close_stage(stage.as_ref(), self.config.shutdown_timeout).await?;
        info!(delivered = summary.delivered, "Pipeline closed");
        Ok(summary)
    }
}

/// Stop a stage and wait for its close confirmation.
pub async fn close_stage(stage: &dyn Buffer, timeout: std::time::Duration) -> Result<()> {
    stage.stop_consuming();
    if let Err(e) = stage.wait_for_close(timeout).await {
        error!(error = %e, "Buffer stage did not close in time");
        return Err(e).context("Buffer stage failed to shut down");
    }
    Ok(())
}

/// Read lines into transactions until the input ends or the stage stops
/// accepting them.
async fn produce<R>(input: R, inbound: mpsc::Sender<Transaction>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                break;
            }
        };

        let (transaction, outcome) = Transaction::new(Message::from_bytes(line));
        if inbound.send(transaction).await.is_err() {
            debug!("Inbound closed, producer stopping");
            break;
        }

        tokio::spawn(async move {
            if let Err(e) = outcome.outcome().await {
                warn!(error = %e, "Transaction not delivered");
            }
        });
    }
    debug!("Producer finished");
}

/// Write each part on its own line.
async fn write_message<W>(output: &mut W, message: &Message) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for part in message.parts() {
        output.write_all(part).await?;
        output.write_all(b"\n").await?;
    }
    Ok(())
}
