//! # Buffer Configuration
//!
//! Selects which buffer variant the registry constructs.

use crate::registry::ConstructionError;
use crate::DEFAULT_BUFFER_TYPE;
use serde::{Deserialize, Serialize};
use std::env;

/// Buffer selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Registered variant name (default: `none`).
    #[serde(rename = "type")]
    pub buffer_type: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_type: DEFAULT_BUFFER_TYPE.to_string(),
        }
    }
}

impl BufferConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PIPELINE_BUFFER_TYPE`: Variant name (default: none)
    pub fn from_env() -> Self {
        Self {
            buffer_type: env::var("PIPELINE_BUFFER_TYPE")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| DEFAULT_BUFFER_TYPE.to_string()),
        }
    }

    /// Reject configurations no registry could satisfy.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.buffer_type.trim().is_empty() {
            return Err(ConstructionError::InvalidConfig(
                "buffer type must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
