//! # Integration Tests
//!
//! Each module exercises stages as a producer and a consumer would: through
//! `BufferRegistry`, the `Buffer` trait, and the transaction response path.

pub mod runtime_flows;
