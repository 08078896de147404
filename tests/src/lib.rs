//! # Pipeline Buffer Test Suite
//!
//! Workspace-level tests that drive buffer stages only through their public
//! surface.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── contract.rs       # Lifecycle contract, run against every registered variant
//!     ├── concurrency.rs    # Racing stop/close/wait and sustained load
//!     └── runtime_flows.rs  # Runtime + telemetry wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pipeline-tests
//!
//! # By category
//! cargo test -p pipeline-tests integration::contract::
//! cargo test -p pipeline-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p pipeline-tests
//! ```

// Test code favours readable assertions over error plumbing
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod integration;
