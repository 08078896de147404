//! # Forwarding Loop
//!
//! Background task that moves transactions from inbound to outbound.
//!
//! ```text
//! Running ──inbound closed──→ Draining ──→ Closed
//!    │                           ↑
//!    └──close requested──────────┘
//! ```
//!
//! Both suspension points (waiting for the next inbound transaction and
//! waiting for the consumer to take the current one) race the close request.
//! `tokio::select!` picks among ready branches at random, so neither side can
//! starve the other under sustained load.
//!
//! The hand-off is a rendezvous: the outbound channel has a single slot and
//! the loop does not read inbound again until the consumer has emptied it.
//! Backpressure therefore reaches the producer one transaction at a time.

use crate::lifecycle::{CloseSignal, Lifecycle};
use crate::{METRIC_ABANDONED, METRIC_FORWARDED};
use pipeline_types::{ResponseError, SharedMetrics, Transaction};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Why the loop left the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The producer closed the inbound channel and it is empty.
    InboundClosed,
    /// A close was requested.
    CloseRequested,
    /// Every outbound receiver was dropped.
    OutboundGone,
}

impl LoopExit {
    /// Short label for log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InboundClosed => "inbound_closed",
            Self::CloseRequested => "close_requested",
            Self::OutboundGone => "outbound_gone",
        }
    }
}

/// The forwarding task. Owns the inbound receiver and the only outbound sender.
pub struct ForwardingLoop {
    inbound: mpsc::Receiver<Transaction>,
    outbound: mpsc::Sender<Transaction>,
    lifecycle: Arc<Lifecycle>,
    close: CloseSignal,
    metrics: SharedMetrics,
    buffer_type: &'static str,
}

impl ForwardingLoop {
    /// Wire a loop. Nothing runs until `run` is awaited (normally spawned).
    #[must_use]
    pub fn new(
        buffer_type: &'static str,
        inbound: mpsc::Receiver<Transaction>,
        outbound: mpsc::Sender<Transaction>,
        lifecycle: Arc<Lifecycle>,
        metrics: SharedMetrics,
    ) -> Self {
        let close = lifecycle.close_signal();
        Self {
            inbound,
            outbound,
            lifecycle,
            close,
            metrics,
            buffer_type,
        }
    }

    /// Forward until end-of-stream or a close request, then finalize.
    pub async fn run(mut self) {
        debug!(buffer = self.buffer_type, "Forwarding loop started");
        let exit = self.forward().await;
        self.finish(exit).await;
    }

    async fn forward(&mut self) -> LoopExit {
        loop {
            if self.close.is_requested() {
                return LoopExit::CloseRequested;
            }

            let transaction = tokio::select! {
                received = self.inbound.recv() => match received {
                    Some(transaction) => transaction,
                    None => return LoopExit::InboundClosed,
                },
                () = self.close.requested() => return LoopExit::CloseRequested,
            };

            if let Err(exit) = self.hand_off(transaction).await {
                return exit;
            }
        }
    }

    /// Place one transaction in the outbound slot and wait for it to be taken.
    async fn hand_off(&mut self, transaction: Transaction) -> Result<(), LoopExit> {
        let permit = tokio::select! {
            reserved = self.outbound.reserve() => match reserved {
                Ok(permit) => permit,
                Err(_) => {
                    self.abandon(transaction);
                    return Err(LoopExit::OutboundGone);
                }
            },
            () = self.close.requested() => {
                self.abandon(transaction);
                return Err(LoopExit::CloseRequested);
            }
        };

        // Once in the slot the transaction stays readable even if the
        // channel closes behind it.
        permit.send(transaction);
        self.metrics.incr(METRIC_FORWARDED, 1);
        trace!(buffer = self.buffer_type, "Transaction handed off");

        tokio::select! {
            reserved = self.outbound.reserve() => match reserved {
                Ok(_slot) => Ok(()),
                Err(_) => Err(LoopExit::OutboundGone),
            },
            () = self.close.requested() => Err(LoopExit::CloseRequested),
        }
    }

    /// Tell the sender this transaction will never be delivered.
    fn abandon(&self, transaction: Transaction) {
        transaction.respond(Err(ResponseError::StageClosed));
        self.metrics.incr(METRIC_ABANDONED, 1);
    }

    /// Draining and finalization. Runs exactly once per loop.
    async fn finish(self, exit: LoopExit) {
        let Self {
            mut inbound,
            outbound,
            lifecycle,
            metrics,
            buffer_type,
            ..
        } = self;

        // Stop further sends and fail whatever the producer already queued,
        // so nothing vanishes without an answer.
        inbound.close();
        let mut abandoned = 0u64;
        while let Ok(transaction) = inbound.try_recv() {
            transaction.respond(Err(ResponseError::StageClosed));
            abandoned += 1;
        }
        if abandoned > 0 {
            metrics.incr(METRIC_ABANDONED, abandoned);
        }

        lifecycle.settle_stopped();
        drop(outbound);
        lifecycle.confirm_closed();

        debug!(
            buffer = buffer_type,
            reason = exit.as_str(),
            abandoned,
            "Forwarding loop closed"
        );

        // Senders still holding a reserved slot may send after close. Answer
        // them too; this never delays the close confirmation.
        let mut late = 0u64;
        while let Some(transaction) = inbound.recv().await {
            metrics.incr(METRIC_ABANDONED, 1);
            transaction.respond(Err(ResponseError::StageClosed));
            late += 1;
        }
        if late > 0 {
            debug!(buffer = buffer_type, late, "Answered late transactions");
        }
    }
}
