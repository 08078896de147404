//! # Pass-Through Buffer (`none`)
//!
//! Adds no buffering. Each transaction is handed directly to the consumer, so
//! backpressure from the output reaches the producer immediately. Richer
//! variants are validated against this one.

use crate::config::BufferConfig;
use crate::forward::ForwardingLoop;
use crate::lifecycle::Lifecycle;
use crate::registry::{ConstructionError, TypeSpec};
use crate::stage::{Buffer, TransactionReceiver};
use async_trait::async_trait;
use parking_lot::Mutex;
use pipeline_types::{PipelineError, RunState, SharedMetrics, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Inbound wiring. Moves from `Detached` to `Attached` exactly once.
enum Attachment {
    /// Not started; holds the outbound sender until the loop takes it.
    Detached(mpsc::Sender<Transaction>),
    /// Loop spawned. The handle is detached on drop; the loop exits at its
    /// next suspension point once close is requested.
    Attached(JoinHandle<()>),
}

/// Buffer variant that forwards transactions without queueing them.
pub struct PassThroughBuffer {
    lifecycle: Arc<Lifecycle>,
    attachment: Mutex<Attachment>,
    outbound: TransactionReceiver,
    metrics: SharedMetrics,
}

impl PassThroughBuffer {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "none";

    /// Registry description.
    pub const DESCRIPTION: &'static str = "\
No buffer (default). The lowest latency option: transactions pass straight \
through without extra work, and back pressure from the output is applied \
directly down the pipeline.";

    /// Create an unstarted stage.
    #[must_use]
    pub fn new(metrics: SharedMetrics) -> Self {
        // The loop waits for each transaction to be taken before reading the
        // next, so the single slot never holds more than the one in flight.
        let (outbound_tx, outbound_rx) = mpsc::channel(1);
        Self {
            lifecycle: Arc::new(Lifecycle::new()),
            attachment: Mutex::new(Attachment::Detached(outbound_tx)),
            outbound: TransactionReceiver::new(outbound_rx),
            metrics,
        }
    }

    /// Registry constructor.
    pub fn construct(
        _config: &BufferConfig,
        metrics: SharedMetrics,
    ) -> Result<Box<dyn Buffer>, ConstructionError> {
        Ok(Box::new(Self::new(metrics)))
    }

    /// Registry entry for this variant.
    #[must_use]
    pub fn type_spec() -> TypeSpec {
        TypeSpec {
            constructor: Self::construct,
            description: Self::DESCRIPTION,
        }
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.lifecycle.state()
    }

    /// Returns true once an inbound source has been attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        matches!(*self.attachment.lock(), Attachment::Attached(_))
    }
}

#[async_trait]
impl Buffer for PassThroughBuffer {
    fn start_receiving(&self, inbound: mpsc::Receiver<Transaction>) -> Result<(), PipelineError> {
        let mut attachment = self.attachment.lock();
        let Attachment::Detached(outbound) = &*attachment else {
            warn!(buffer = Self::TYPE_NAME, "Inbound source already attached");
            return Err(PipelineError::AlreadyStarted);
        };

        let forwarding = ForwardingLoop::new(
            Self::TYPE_NAME,
            inbound,
            outbound.clone(),
            Arc::clone(&self.lifecycle),
            Arc::clone(&self.metrics),
        );

        if !self.lifecycle.mark_running() {
            debug!(
                buffer = Self::TYPE_NAME,
                "Stop requested before start, loop will close immediately"
            );
        }

        // Replacing the variant drops the stage's copy of the sender; the loop
        // now holds the only one.
        *attachment = Attachment::Attached(tokio::spawn(forwarding.run()));
        Ok(())
    }

    fn transaction_chan(&self) -> TransactionReceiver {
        self.outbound.clone()
    }

    fn stop_consuming(&self) {
        self.close_async();
    }

    fn close_async(&self) {
        self.lifecycle.request_close();
    }

    async fn wait_for_close(&self, timeout: Duration) -> Result<(), PipelineError> {
        self.lifecycle.wait_closed(timeout).await
    }
}

impl Drop for PassThroughBuffer {
    fn drop(&mut self) {
        self.lifecycle.request_close();
    }
}
