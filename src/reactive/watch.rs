//! Watchers: run a callback with `(new, old)` when a source changes.
//!
//! Change notifications go through the batching scheduler, so any number of
//! writes within one burst produce a single callback invocation in the next
//! flush.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashSet;

use super::computed::Computed;
use super::effect::ReactiveEffect;
use super::object::Reactive;
use super::refs::Ref;
use super::runtime::TargetId;
use super::value::{has_changed, Value};
use crate::scheduler::{queue_job, Job};

// ---------------------------------------------------------------------------
// Sources and options
// ---------------------------------------------------------------------------

/// What a watcher observes.
#[derive(Clone)]
pub enum WatchSource {
    /// A reactive object. Always watched deeply.
    Reactive(Reactive),
    Ref(Ref),
    Computed(Computed<Value>),
    /// An arbitrary tracked getter.
    Getter(Rc<dyn Fn() -> Value>),
}

impl WatchSource {
    pub fn getter(f: impl Fn() -> Value + 'static) -> Self {
        WatchSource::Getter(Rc::new(f))
    }
}

impl From<Reactive> for WatchSource {
    fn from(r: Reactive) -> Self {
        WatchSource::Reactive(r)
    }
}

impl From<Ref> for WatchSource {
    fn from(r: Ref) -> Self {
        WatchSource::Ref(r)
    }
}

impl From<Computed<Value>> for WatchSource {
    fn from(c: Computed<Value>) -> Self {
        WatchSource::Computed(c)
    }
}

impl fmt::Debug for WatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchSource::Reactive(r) => f.debug_tuple("Reactive").field(r).finish(),
            WatchSource::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
            WatchSource::Computed(_) => f.write_str("Computed"),
            WatchSource::Getter(_) => f.write_str("Getter"),
        }
    }
}

/// Options recognised by [`watch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Invoke the callback once right away with `old = Null`.
    pub immediate: bool,
    /// Track every nested field and fire on any write, even when the
    /// top-level value keeps its identity.
    pub deep: bool,
}

impl WatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `immediate` (builder).
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Set `deep` (builder).
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }
}

// ---------------------------------------------------------------------------
// watch()
// ---------------------------------------------------------------------------

/// Handle returned by [`watch`].
pub struct WatchHandle {
    effect: ReactiveEffect<Value>,
}

impl WatchHandle {
    /// Stop watching. Pending callbacks already queued do not fire.
    pub fn stop(&self) {
        self.effect.stop();
    }

    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Watch `source` and call `callback(new, old)` after it changes.
///
/// A reactive object source is always deep. With `deep`, the callback fires
/// for every notified change; otherwise only when the new value differs from
/// the old one.
pub fn watch(
    source: impl Into<WatchSource>,
    callback: impl FnMut(&Value, &Value) + 'static,
    options: WatchOptions,
) -> WatchHandle {
    let source = source.into();
    let deep = options.deep || matches!(source, WatchSource::Reactive(_));
    let read: Box<dyn Fn() -> Value> = match source {
        WatchSource::Reactive(r) => Box::new(move || Value::Reactive(r.clone())),
        WatchSource::Ref(r) => Box::new(move || r.get()),
        WatchSource::Computed(c) => Box::new(move || c.get()),
        WatchSource::Getter(f) => Box::new(move || f()),
    };
    let getter = move || {
        let value = read();
        if deep {
            traverse(&value);
        }
        value
    };

    let job_slot: Rc<OnceCell<Job>> = Rc::new(OnceCell::new());
    let effect = ReactiveEffect::with_scheduler(getter, {
        let job_slot = job_slot.clone();
        move || {
            if let Some(job) = job_slot.get() {
                queue_job(job.clone());
            }
        }
    });

    let old = Rc::new(RefCell::new(Value::Null));
    let callback = RefCell::new(callback);
    let job = Job::new({
        let effect = effect.clone();
        let old = old.clone();
        move || {
            if !effect.is_active() {
                return;
            }
            let new = effect.run();
            if !deep && !has_changed(&old.borrow(), &new) {
                return;
            }
            let prev = old.replace(new.clone());
            match callback.try_borrow_mut() {
                Ok(mut callback) => callback(&new, &prev),
                Err(_) => tracing::warn!("watch callback re-entered; skipped"),
            }
        }
    });
    let _ = job_slot.set(job.clone());

    if options.immediate {
        job.run();
    } else {
        *old.borrow_mut() = effect.run();
    }
    WatchHandle { effect }
}

/// Read every field reachable from `value` so the current reader tracks it.
pub fn traverse(value: &Value) {
    let mut seen = FxHashSet::default();
    traverse_inner(value, &mut seen);
}

fn traverse_inner(value: &Value, seen: &mut FxHashSet<TargetId>) {
    let Value::Reactive(r) = value else {
        return;
    };
    if !seen.insert(r.id()) {
        return;
    }
    for key in r.keys() {
        traverse_inner(&r.get(&key), seen);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
