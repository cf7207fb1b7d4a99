//! Retry Module
//!
//! Retry with exponential backoff for fallible async operations.

mod executor;
mod policy;

// Re-export public types
pub use executor::RetryExecutor;
pub use policy::{RetryOn, RetryPolicy};
