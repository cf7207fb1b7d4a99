//! Classify Module
//!
//! Maps raw failures to a closed error taxonomy with user-facing remediation
//! messages, and keeps a bounded log of classified errors.

mod classifier;
mod code;
mod log;
mod raw;

// Re-export public types
pub use classifier::{is_offline, user_message, ErrorClassifier, ErrorRecord};
pub use code::ErrorCode;
pub use log::ErrorLog;
pub use raw::RawError;

// == Public Constants ==
/// Default number of records retained by the error log
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 100;
