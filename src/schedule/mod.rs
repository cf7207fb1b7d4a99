//! Schedule Module
//!
//! Invocation-rate control for side-effecting operations.
//!
//! # Schedulers
//! - Debounce: coalesces a burst of calls per key into one trailing call
//! - Throttle: admits at most one call per interval, dropping the rest

mod debounce;
mod throttle;

pub use debounce::{Debounced, Debouncer};
pub use throttle::{throttle, Throttle, Throttled};
