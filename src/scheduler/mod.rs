//! Batching scheduler.
//!
//! State changes in one synchronous burst queue jobs; a single asynchronous
//! flush later runs each distinct job once.
//!
//! - [`queue_job`] / [`flush_jobs`]: the pending queue.
//! - [`event_loop::run_until`] / [`next_tick`]: the turn that drives flushes.

pub mod event_loop;
pub mod queue;

pub use event_loop::{block_on, in_event_loop, next_tick, run_until};
pub use queue::{flush_jobs, has_pending_flush, pending_jobs, queue_job, Job};
