//! Error types for the resilience layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::classify::ErrorRecord;

// == Perf Error Enum ==
/// Unified error type for the resilience layer.
#[derive(Error, Debug)]
pub enum PerfError {
    /// Retries exhausted (or short-circuited); carries the classified failure
    #[error("{} after {attempts} attempt(s): {}", .record.code, .record.detail)]
    Exhausted {
        record: ErrorRecord,
        attempts: u32,
    },

    /// Retry loop aborted through its cancel token
    #[error("Operation cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// Batch aborted through its cancel token between chunks
    #[error("Batch cancelled after {completed} item(s)")]
    BatchCancelled { completed: usize },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PerfError {
    /// Returns the classified record for exhausted retries.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            PerfError::Exhausted { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Returns the user-facing message for this error.
    pub fn user_message(&self) -> &str {
        match self {
            PerfError::Exhausted { record, .. } => &record.message,
            PerfError::Cancelled { .. } | PerfError::BatchCancelled { .. } => {
                "The operation was cancelled."
            }
            PerfError::InvalidConfig(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the resilience layer.
pub type Result<T> = std::result::Result<T, PerfError>;
