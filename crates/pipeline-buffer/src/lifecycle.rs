//! # Stage Lifecycle
//!
//! The run flag and the two one-shot signals every buffer variant embeds.
//!
//! ```text
//! Created ──start──→ Running ──stop / end-of-stream──→ Stopped
//!    │                                                    ↑
//!    └──────────────────────stop──────────────────────────┘
//! ```
//!
//! All concurrent mutation goes through a compare-and-set on the run flag.
//! Only the caller that wins the transition to `Stopped` fires the
//! close-request signal, and the close-confirmation signal refuses a second
//! firing, so neither can be double-fired no matter how many callers race.

use pipeline_types::{PipelineError, RunState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Run flag plus close-request and close-confirmation signals.
pub struct Lifecycle {
    /// Encoded `RunState`.
    state: AtomicU8,

    /// Close-request signal. Flips to `true` at most once.
    close_tx: watch::Sender<bool>,

    /// Close-confirmation signal. Flips to `true` at most once.
    closed_tx: watch::Sender<bool>,
}

impl Lifecycle {
    /// Create a lifecycle in the `Created` state with neither signal fired.
    #[must_use]
    pub fn new() -> Self {
        let (close_tx, _) = watch::channel(false);
        let (closed_tx, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(RunState::Created as u8),
            close_tx,
            closed_tx,
        }
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Transition `Created` → `Running`.
    ///
    /// Returns false if the stage was already stopped (a stop requested before
    /// start) or already running.
    pub fn mark_running(&self) -> bool {
        self.state
            .compare_exchange(
                RunState::Created as u8,
                RunState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Request shutdown.
    ///
    /// Transitions `Created`/`Running` → `Stopped`. Only the winning caller
    /// fires the close-request signal; every other call is a no-op. Returns
    /// whether this call won.
    pub fn request_close(&self) -> bool {
        let won = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (RunState::from_u8(raw) != RunState::Stopped).then_some(RunState::Stopped as u8)
            })
            .is_ok();

        if won {
            self.close_tx.send_replace(true);
            debug!("Close requested");
        }
        won
    }

    /// Returns true once a close has been requested.
    #[must_use]
    pub fn is_close_requested(&self) -> bool {
        *self.close_tx.borrow()
    }

    /// A handle the forwarding loop races against its suspension points.
    #[must_use]
    pub fn close_signal(&self) -> CloseSignal {
        CloseSignal {
            rx: self.close_tx.subscribe(),
        }
    }

    /// First finalization step: settle the run flag on `Stopped`.
    pub fn settle_stopped(&self) {
        self.state.store(RunState::Stopped as u8, Ordering::Release);
    }

    /// Last finalization step: fire the close-confirmation signal.
    ///
    /// Returns false if the confirmation had already fired.
    pub fn confirm_closed(&self) -> bool {
        self.closed_tx.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    /// Returns true once the close confirmation has fired.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    /// Wait for the close confirmation, bounded by `timeout`.
    ///
    /// Any number of callers may wait concurrently.
    pub async fn wait_closed(&self, timeout: Duration) -> Result<(), PipelineError> {
        let mut closed_rx = self.closed_tx.subscribe();
        tokio::time::timeout(timeout, wait_until_set(&mut closed_rx))
            .await
            .map_err(|_| PipelineError::Timeout { timeout })
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the close-request signal.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    rx: watch::Receiver<bool>,
}

impl CloseSignal {
    /// Resolves once a close has been requested. Cancel safe.
    pub async fn requested(&mut self) {
        wait_until_set(&mut self.rx).await;
    }

    /// Returns true if a close has already been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Resolves once the flag is `true`, or once its sender is gone.
async fn wait_until_set(rx: &mut watch::Receiver<bool>) {
    // A dropped sender means the owning lifecycle is gone, which is as final
    // as the flag being set.
    let _ = rx.wait_for(|set| *set).await;
}
