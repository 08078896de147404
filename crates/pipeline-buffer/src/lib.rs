//! # Pipeline Buffer - Buffer Stages Between Producer and Consumer
//!
//! A buffer stage is interposed between an upstream producer of transactions
//! and a downstream consumer. Every variant obeys the same lifecycle contract:
//!
//! ```text
//!                  ┌───────────────────────────────┐
//!   inbound  ───→  │  ForwardingLoop (one task)    │  ───→  transaction_chan()
//!   (mpsc)         │    races every wait against   │        (closed exactly once)
//!                  │    the close request          │
//!                  └───────────────────────────────┘
//!                         ↑ close_async()      │ close confirmation
//!                         │                    ↓
//!                      Lifecycle  ──────→  wait_for_close(timeout)
//! ```
//!
//! ## Contract
//!
//! - **Single attach:** `start_receiving` succeeds once; later calls return
//!   `PipelineError::AlreadyStarted` without touching the running loop.
//! - **Idempotent stop:** `stop_consuming`/`close_async` can be called any
//!   number of times from any task; only the first call fires the signal.
//! - **Ordered finalization:** run flag → `Stopped`, outbound closed, close
//!   confirmation fired. Always in the loop's own exit path.
//! - **No silent loss:** transactions the loop holds or finds queued when it
//!   closes are answered with `ResponseError::StageClosed`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod forward;
pub mod lifecycle;
pub mod none;
pub mod registry;
pub mod stage;

// Re-export main types
pub use config::BufferConfig;
pub use forward::{ForwardingLoop, LoopExit};
pub use lifecycle::{CloseSignal, Lifecycle};
pub use none::PassThroughBuffer;
pub use registry::{BufferRegistry, ConstructionError, Constructor, TypeSpec};
pub use stage::{Buffer, ErrorReceiver, ReceiveError, StageFault, TransactionReceiver};

/// Variant selected when configuration names none.
pub const DEFAULT_BUFFER_TYPE: &str = "none";

/// Counter: transactions placed on the outbound channel.
pub const METRIC_FORWARDED: &str = "buffer_transactions_forwarded";

/// Counter: transactions answered with `StageClosed` during shutdown.
pub const METRIC_ABANDONED: &str = "buffer_transactions_abandoned";
