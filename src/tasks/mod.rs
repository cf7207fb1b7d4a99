//! Background Tasks Module
//!
//! Optional background tasks a caller may start alongside the layer.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
