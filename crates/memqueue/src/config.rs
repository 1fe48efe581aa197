//! Registry configuration.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by a registry and every queue it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Visibility timeout used by [`Queue::read_default`](crate::Queue::read_default), in milliseconds
    pub default_visibility_timeout_ms: u64,
    /// Largest payload accepted by `enqueue`, in bytes
    pub max_payload_size: usize,
}

impl RegistryConfig {
    pub fn default_visibility_timeout(&self) -> Duration {
        Duration::from_millis(self.default_visibility_timeout_ms)
    }

    /// Reject settings no queue could operate under
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_payload_size == 0 {
            return Err(ValidationError::OutOfRange {
                field: "max_payload_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_visibility_timeout_ms: 30_000,
            max_payload_size: 256 * 1024,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
