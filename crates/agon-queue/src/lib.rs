//! # Agon Queue
//!
//! Bounded concurrency for topic execution.
//!
//! Features:
//! - Unbounded submissions, at most N running
//! - FIFO start order for queued work
//! - Per-submission results; a failure or panic never affects siblings

pub mod pool;

pub use pool::{PoolError, PoolStats, TaskHandle, TaskPool, DEFAULT_MAX_CONCURRENCY};
