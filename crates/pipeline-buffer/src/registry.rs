//! # Buffer Registry
//!
//! Maps variant names to constructors so orchestrators can select a buffer
//! from configuration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = BufferRegistry::with_defaults();
//! let stage = registry.construct(&BufferConfig::from_env(), Arc::new(NoopMetrics))?;
//! ```

use crate::config::BufferConfig;
use crate::none::PassThroughBuffer;
use crate::stage::Buffer;
use pipeline_types::SharedMetrics;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while building a stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// No variant registered under this name.
    #[error("Unknown buffer type: {0}")]
    UnknownType(String),

    /// The configuration was rejected.
    #[error("Invalid buffer configuration: {0}")]
    InvalidConfig(String),
}

/// Shared constructor signature for every buffer variant.
pub type Constructor = fn(&BufferConfig, SharedMetrics) -> Result<Box<dyn Buffer>, ConstructionError>;

/// A registered variant.
#[derive(Debug, Clone, Copy)]
pub struct TypeSpec {
    /// Builds the stage.
    pub constructor: Constructor,
    /// Operator-facing description.
    pub description: &'static str,
}

/// Name → constructor table.
pub struct BufferRegistry {
    specs: HashMap<String, TypeSpec>,
}

impl BufferRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in variants.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PassThroughBuffer::TYPE_NAME, PassThroughBuffer::type_spec());
        registry
    }

    /// Register a variant, replacing any existing entry with the same name.
    pub fn register(&mut self, name: impl Into<String>, spec: TypeSpec) {
        let name = name.into();
        if self.specs.insert(name.clone(), spec).is_some() {
            warn!(buffer = %name, "Buffer type already registered, replacing");
        } else {
            debug!(buffer = %name, "Buffer type registered");
        }
    }

    /// Returns true if a variant is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Description of a registered variant.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.specs.get(name).map(|spec| spec.description)
    }

    /// Build the variant named by `config`.
    pub fn construct(
        &self,
        config: &BufferConfig,
        metrics: SharedMetrics,
    ) -> Result<Box<dyn Buffer>, ConstructionError> {
        config.validate()?;

        let spec = self
            .specs
            .get(&config.buffer_type)
            .ok_or_else(|| ConstructionError::UnknownType(config.buffer_type.clone()))?;

        debug!(buffer = %config.buffer_type, "Constructing buffer");
        (spec.constructor)(config, metrics)
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
