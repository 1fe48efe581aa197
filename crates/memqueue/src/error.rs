//! Error types for queue and registry operations.

use std::time::Duration;
use thiserror::Error;

/// Standard result type for memqueue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error type for all queue and registry operations.
///
/// None of these are fatal: a failed operation leaves the queue and the
/// registry exactly as they were.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue name already registered: {name}")]
    DuplicateName { name: String },

    #[error("Queue not found: {name}")]
    UnknownName { name: String },

    #[error("Queue '{name}' has been closed")]
    QueueDisabled { name: String },

    #[error("No entity available on queue '{queue}'")]
    NoEntity { queue: String },

    #[error("Payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: usize, max_size: usize },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if the condition may clear on its own, so the same call can be
    /// retried later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DuplicateName { .. } => false,
            Self::UnknownName { .. } => false,
            Self::QueueDisabled { .. } => false,
            Self::NoEntity { .. } => true,
            Self::PayloadTooLarge { .. } => false,
            Self::Validation(_) => false,
        }
    }

    /// Check if error should be retried
    pub fn should_retry(&self) -> bool {
        self.is_transient()
    }

    /// Get suggested retry delay
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::NoEntity { .. } => Some(Duration::from_millis(10)),
            _ => None,
        }
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
