//! # Error Types
//!
//! Defines the errors a stage reports synchronously to its caller.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by stage lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// An inbound source was already attached to this stage.
    ///
    /// The caller's bug; the existing attachment is left intact.
    #[error("stage already started: an inbound source is already attached")]
    AlreadyStarted,

    /// The close confirmation did not arrive before the deadline.
    ///
    /// The stage may still be running. Callers decide whether to retry the
    /// wait or escalate (e.g. terminate the process).
    #[error("timed out after {timeout:?} waiting for stage to close")]
    Timeout { timeout: Duration },
}

/// Stage operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// Constructed, no inbound source attached yet.
    Created = 0,
    /// Forwarding loop is running.
    Running = 1,
    /// Stop requested or the loop has exited.
    Stopped = 2,
}

impl RunState {
    /// Decode a raw state value. Unknown values are treated as `Stopped`.
    #[must_use]
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}
