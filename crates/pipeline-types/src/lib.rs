//! # Pipeline Types Crate
//!
//! Types shared by every stage of the pipeline.
//!
//! ## Design Principles
//!
//! - **Opaque payloads**: Stages move a `Message` without inspecting it.
//! - **Write-once responses**: Every `Transaction` carries exactly one response
//!   path back to its sender; answering consumes the transaction.
//! - **Small error surface**: `PipelineError` only names failures a caller can
//!   act on (`AlreadyStarted`, `Timeout`).

pub mod errors;
pub mod metrics;
pub mod transaction;

pub use errors::*;
pub use metrics::{LocalMetrics, MetricsSink, NoopMetrics, SharedMetrics};
pub use transaction::{Message, Response, ResponseError, ResponseReceiver, Transaction};
