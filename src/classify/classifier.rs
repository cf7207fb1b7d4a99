//! Error Classifier Module
//!
//! Turns raw failures into logged, user-presentable error records.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{ErrorCode, ErrorLog, RawError};

// == Error Record ==
/// A classified failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Classified code
    pub code: ErrorCode,
    /// User-facing remediation message for `code`
    pub message: String,
    /// Original failure description
    pub detail: String,
    /// Caller-supplied label for where the failure happened
    pub context: Option<String>,
    /// When the failure was classified
    pub timestamp: DateTime<Utc>,
}

// == Error Classifier ==
/// Classifies failures and owns the error log.
///
/// Construct one per owning module and share it by reference or `Arc`.
#[derive(Debug)]
pub struct ErrorClassifier {
    log: Mutex<ErrorLog>,
}

impl ErrorClassifier {
    // == Constructor ==
    /// Creates a classifier whose log retains at most `log_capacity` records.
    pub fn new(log_capacity: usize) -> Self {
        Self {
            log: Mutex::new(ErrorLog::new(log_capacity)),
        }
    }

    // == Classify ==
    /// Classifies `raw`, appends the record to the error log and returns it.
    pub fn classify(&self, raw: impl Into<RawError>, context: Option<&str>) -> ErrorRecord {
        let raw = raw.into();
        let code = ErrorCode::from_raw(&raw);
        let record = ErrorRecord {
            message: user_message(&code).to_string(),
            code,
            detail: raw.message,
            context: context.map(str::to_string),
            timestamp: Utc::now(),
        };

        error!(
            code = %record.code,
            context = record.context.as_deref().unwrap_or("-"),
            "{}",
            record.detail
        );

        self.lock().push(record.clone());
        record
    }

    // == Error Log Access ==
    /// Returns the retained records, oldest first.
    pub fn error_log(&self) -> Vec<ErrorRecord> {
        self.lock().snapshot()
    }

    /// Empties the error log.
    pub fn clear_error_log(&self) {
        self.lock().clear();
    }

    /// Number of records evicted because the log was full.
    pub fn dropped_records(&self) -> u64 {
        self.lock().dropped()
    }

    fn lock(&self) -> MutexGuard<'_, ErrorLog> {
        // A panic mid-push cannot leave the ring buffer inconsistent.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(super::DEFAULT_ERROR_LOG_CAPACITY)
    }
}

// == User Message ==
/// Returns the fixed user-facing message for a code.
pub fn user_message(code: &ErrorCode) -> &'static str {
    match code {
        ErrorCode::Network => "Please check your internet connection and try again.",
        ErrorCode::Timeout => "The request timed out. Please try again.",
        ErrorCode::Permission => "Permission denied. Please check the app permissions in your settings.",
        ErrorCode::Http(400) => "Invalid request. Please check your input and try again.",
        ErrorCode::Http(401) => "Authentication failed. Please sign in again.",
        ErrorCode::Http(403) => "Access denied. Please check your API key.",
        ErrorCode::Http(404) => "The requested information could not be found.",
        ErrorCode::Http(429) => "Too many requests. Please wait a moment and try again.",
        ErrorCode::Http(500..=599) => "Server error. Please try again later.",
        _ => "An unexpected error occurred. Please try again.",
    }
}

// == Offline Detection ==
/// True iff the failure classifies as a network error.
pub fn is_offline(raw: &RawError) -> bool {
    ErrorCode::from_raw(raw) == ErrorCode::Network
}
