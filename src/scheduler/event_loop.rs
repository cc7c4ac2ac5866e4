//! The asynchronous turn that drives flushes.
//!
//! Inside [`run_until`] (or [`block_on`]) a scheduled flush is spawned as a
//! local tokio task, so it runs once the current synchronous burst yields.
//! Outside an event loop the flush stays pending until [`next_tick`] or an
//! explicit [`flush_jobs`](super::flush_jobs).

use std::cell::Cell;
use std::future::Future;

use tokio::task::LocalSet;

use super::queue;

thread_local! {
    static LOOP_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct LoopGuard;

impl LoopGuard {
    fn enter() -> Self {
        LOOP_DEPTH.with(|depth| depth.set(depth.get() + 1));
        LoopGuard
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        let _ = LOOP_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Whether the current thread is inside [`run_until`].
pub fn in_event_loop() -> bool {
    LOOP_DEPTH.with(Cell::get) > 0
}

pub(crate) fn schedule_flush() {
    if in_event_loop() {
        tracing::trace!("flush scheduled");
        tokio::task::spawn_local(async {
            queue::flush_jobs();
        });
    } else {
        tracing::trace!("flush deferred until next tick");
    }
}

/// Drive `future` on a local task set so queued jobs flush asynchronously.
///
/// Must be awaited on a current-thread tokio runtime. Any flush still pending
/// when `future` completes is drained before returning.
pub async fn run_until<F: Future>(future: F) -> F::Output {
    let local = LocalSet::new();
    let guard = LoopGuard::enter();
    let output = local.run_until(future).await;
    drop(guard);
    drop(local);
    while queue::has_pending_flush() {
        queue::flush_jobs();
    }
    output
}

/// Build a current-thread runtime and drive `future` to completion with
/// [`run_until`].
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(run_until(future)))
}

/// Wait for the next flush.
///
/// Yields once so a spawned flush can run, then flushes directly if one is
/// still pending.
pub async fn next_tick() {
    tokio::task::yield_now().await;
    if queue::has_pending_flush() {
        queue::flush_jobs();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{queue_job, Job};
    use std::rc::Rc;

    fn counting_job() -> (Job, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let runs_c = runs.clone();
        (Job::new(move || runs_c.set(runs_c.get() + 1)), runs)
    }

    #[tokio::test]
    async fn flush_runs_after_yield_inside_loop() {
        let (job, runs) = counting_job();
        let runs_c = runs.clone();
        run_until(async move {
            assert!(in_event_loop());
            queue_job(job.clone());
            queue_job(job);
            assert_eq!(runs_c.get(), 0);
            next_tick().await;
            assert_eq!(runs_c.get(), 1);
        })
        .await;
        assert_eq!(runs.get(), 1);
        assert!(!in_event_loop());
    }

    #[tokio::test]
    async fn leaving_loop_drains_pending_flush() {
        let (job, runs) = counting_job();
        run_until(async move {
            queue_job(job);
        })
        .await;
        assert_eq!(runs.get(), 1);
        assert!(!queue::has_pending_flush());
    }

    #[test]
    fn next_tick_flushes_outside_loop() {
        let (job, runs) = counting_job();
        queue_job(job);
        assert_eq!(runs.get(), 0);
        tokio_test::block_on(next_tick());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn block_on_returns_output() {
        let (job, runs) = counting_job();
        let out = block_on(async move {
            queue_job(job);
            next_tick().await;
            7
        });
        assert_eq!(out.ok(), Some(7));
        assert_eq!(runs.get(), 1);
    }
}
