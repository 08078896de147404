//! # Stage Contract
//!
//! The capability set every buffer variant implements, and the outbound
//! handle the orchestrator reads from.

use async_trait::async_trait;
use pipeline_types::{PipelineError, Transaction};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

/// Errors from non-blocking reads of the outbound channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// The stage closed its outbound channel and it is empty.
    #[error("Transaction channel closed")]
    Closed,
}

/// An asynchronous failure reported on a stage's error side channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StageFault {
    /// Human-readable description.
    pub message: String,
}

/// Receiving side of a stage's error side channel.
pub type ErrorReceiver = mpsc::Receiver<Vec<StageFault>>;

/// A buffer stage sitting between a producer and a consumer.
///
/// Orchestrators drive every variant the same way:
///
/// ```rust,ignore
/// stage.start_receiving(inbound)?;
/// let outbound = stage.transaction_chan();
/// while let Some(tx) = outbound.recv().await {
///     deliver(tx).await;
/// }
/// // ...or, on shutdown:
/// stage.stop_consuming();
/// stage.wait_for_close(Duration::from_secs(5)).await?;
/// ```
#[async_trait]
pub trait Buffer: Send + Sync {
    /// Attach the inbound source and spawn the forwarding loop.
    ///
    /// Callable once. A second call returns `PipelineError::AlreadyStarted`
    /// and leaves the first attachment running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    fn start_receiving(&self, inbound: mpsc::Receiver<Transaction>) -> Result<(), PipelineError>;

    /// The outbound channel. Available before `start_receiving`; every call
    /// returns a handle to the same channel. Closed exactly once, when the
    /// forwarding loop terminates.
    ///
    /// A transaction handed off just before a stop stays in the channel after
    /// it closes. Readers must drain until `recv` returns `None`; a
    /// transaction left unread is answered `Dropped` once the stage is gone.
    fn transaction_chan(&self) -> TransactionReceiver;

    /// Optional side channel for asynchronous errors.
    ///
    /// Variants without one report failures only through each transaction's
    /// response path.
    fn errors_chan(&self) -> Option<ErrorReceiver> {
        None
    }

    /// Stop consuming inbound. Idempotent and non-blocking.
    fn stop_consuming(&self);

    /// Request shutdown. Safe to call any number of times from any number of
    /// tasks; only the first call has an effect.
    fn close_async(&self);

    /// Wait for the close confirmation, up to `timeout`.
    ///
    /// A `Timeout` means the stage may still be running; treat it as a
    /// forced-abort condition rather than a retryable error.
    async fn wait_for_close(&self, timeout: Duration) -> Result<(), PipelineError>;
}

/// Cloneable handle onto a stage's outbound channel.
#[derive(Debug, Clone)]
pub struct TransactionReceiver {
    inner: Arc<Mutex<mpsc::Receiver<Transaction>>>,
}

impl TransactionReceiver {
    /// Wrap the receiving half of an outbound channel.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<Transaction>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Receive the next transaction.
    ///
    /// # Returns
    ///
    /// - `Some(transaction)` - The next forwarded transaction
    /// - `None` - The channel was closed and is empty
    pub async fn recv(&self) -> Option<Transaction> {
        self.inner.lock().await.recv().await
    }

    /// Try to receive the next transaction without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(transaction))` - A transaction was ready
    /// - `Ok(None)` - Nothing ready, or another reader holds the channel
    /// - `Err(ReceiveError::Closed)` - The channel was closed and is empty
    pub fn try_recv(&self) -> Result<Option<Transaction>, ReceiveError> {
        let Ok(mut receiver) = self.inner.try_lock() else {
            return Ok(None);
        };
        match receiver.try_recv() {
            Ok(transaction) => Ok(Some(transaction)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(ReceiveError::Closed),
        }
    }
}
