//! Pending job queue.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexSet;

use super::event_loop;

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A deferred unit of work. Two jobs are equal when they share the same
/// allocation, which is how the queue deduplicates.
#[derive(Clone)]
pub struct Job(Rc<dyn Fn()>);

impl Job {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Job(Rc::new(f))
    }

    pub fn run(&self) {
        (self.0)()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for Job {}

impl Hash for Job {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({:p})", self.addr())
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

thread_local! {
    static QUEUE: RefCell<Vec<Job>> = const { RefCell::new(Vec::new()) };
    static FLUSH_PENDING: Cell<bool> = const { Cell::new(false) };
}

/// Append `job` to the pending queue, scheduling a flush if none is pending.
pub fn queue_job(job: Job) {
    QUEUE.with(|queue| queue.borrow_mut().push(job));
    if !FLUSH_PENDING.with(Cell::get) {
        FLUSH_PENDING.with(|pending| pending.set(true));
        event_loop::schedule_flush();
    }
}

/// Run every pending job once, in first-queued order.
///
/// Jobs queued while the flush runs land in a fresh queue and a fresh flush.
pub fn flush_jobs() {
    let jobs: IndexSet<Job> = QUEUE.with(|queue| queue.take().into_iter().collect());
    FLUSH_PENDING.with(|pending| pending.set(false));
    if jobs.is_empty() {
        return;
    }
    tracing::trace!(jobs = jobs.len(), "flush");
    for job in jobs {
        job.run();
    }
}

/// Whether a flush has been scheduled but has not started.
pub fn has_pending_flush() -> bool {
    FLUSH_PENDING.with(Cell::get)
}

/// Number of entries in the pending queue, duplicates included.
pub fn pending_jobs() -> usize {
    QUEUE.with(|queue| queue.borrow().len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
