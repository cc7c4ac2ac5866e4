//! Reactive computations ("effects").
//!
//! A [`ReactiveEffect`] wraps a re-runnable closure. While the closure runs,
//! the effect is the current reader: every tracked read subscribes it. When a
//! dependency changes, the effect either re-runs synchronously or, if it has a
//! scheduler, hands the re-run request to the scheduler instead.
//!
//! ```ignore
//! let state = reactive(&Object::from_iter([("count", 0)]));
//! let runner = effect(
//!     { let state = state.clone(); move || println!("count = {}", state.get("count")) },
//!     EffectOptions::default(),
//! );
//! state.set("count", 1); // prints "count = 1"
//! runner.stop();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::runtime::{self, Callback, EffectId};

// ---------------------------------------------------------------------------
// ReactiveEffect
// ---------------------------------------------------------------------------

/// A re-runnable unit of work with an implicit read-dependency set.
///
/// Cloning yields another handle to the same effect. The runtime keeps the
/// effect alive until [`stop`](Self::stop) is called, so dropping every handle
/// does not silence it.
pub struct ReactiveEffect<T: 'static = ()> {
    inner: Rc<EffectInner<T>>,
}

struct EffectInner<T> {
    id: EffectId,
    func: RefCell<Box<dyn FnMut() -> T>>,
}

impl<T: 'static> EffectInner<T> {
    fn run(&self) -> T {
        if !runtime::is_active(self.id) {
            let _paused = runtime::pause_tracking();
            return (self.func.borrow_mut())();
        }
        runtime::cleanup_effect(self.id);
        let _reader = runtime::enter(self.id);
        let mut func = self.func.borrow_mut();
        func()
    }
}

impl<T: 'static> Clone for ReactiveEffect<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> ReactiveEffect<T> {
    /// Create an effect that re-runs synchronously when notified.
    ///
    /// The closure is not run here; call [`run`](Self::run) to collect the
    /// first set of dependencies.
    pub fn new(func: impl FnMut() -> T + 'static) -> Self {
        Self::build(func, false, None)
    }

    /// Create an effect whose change notifications call `scheduler` instead
    /// of re-running inline.
    pub fn with_scheduler(func: impl FnMut() -> T + 'static, scheduler: impl Fn() + 'static) -> Self {
        Self::build(func, false, Some(Rc::new(scheduler)))
    }

    pub(crate) fn build(
        func: impl FnMut() -> T + 'static,
        computed: bool,
        scheduler: Option<Callback>,
    ) -> Self {
        let id = runtime::register_effect(computed, scheduler);
        let inner = Rc::new(EffectInner {
            id,
            func: RefCell::new(Box::new(func)),
        });
        let runner = inner.clone();
        runtime::set_runner(
            id,
            Rc::new(move || {
                let _ = runner.run();
            }),
        );
        Self { inner }
    }

    /// Run the closure as the current reader and return its result.
    ///
    /// Dependencies from the previous run are dropped first, so the new
    /// dependency set reflects exactly what this run read. A stopped effect
    /// runs its closure untracked.
    pub fn run(&self) -> T {
        self.inner.run()
    }

    /// Stop the effect: it leaves every dep and is never scheduled again.
    pub fn stop(&self) {
        runtime::stop_effect(self.inner.id);
    }

    /// Whether the effect is still registered with the runtime.
    pub fn is_active(&self) -> bool {
        runtime::is_active(self.inner.id)
    }

    /// The runtime id of this effect.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Whether two handles refer to the same effect.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> fmt::Debug for ReactiveEffect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// effect()
// ---------------------------------------------------------------------------

/// Options recognised by [`effect`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Skip the initial run.
    pub lazy: bool,
    /// Redirect re-run notifications instead of running inline.
    pub scheduler: Option<Rc<dyn Fn()>>,
}

impl EffectOptions {
    /// Default options: run immediately, re-run inline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the initial run is skipped (builder).
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Set the scheduler (builder).
    pub fn with_scheduler(mut self, scheduler: impl Fn() + 'static) -> Self {
        self.scheduler = Some(Rc::new(scheduler));
        self
    }
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("lazy", &self.lazy)
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

/// Create an effect and, unless `options.lazy`, run it once right away.
///
/// Returns the effect handle, which doubles as a manual runner and as the
/// disposal handle.
pub fn effect<T: 'static>(
    func: impl FnMut() -> T + 'static,
    options: EffectOptions,
) -> ReactiveEffect<T> {
    let effect = ReactiveEffect::build(func, false, options.scheduler);
    if !options.lazy {
        let _ = effect.run();
    }
    effect
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::object::reactive;
    use crate::reactive::value::{Object, Value};
    use std::cell::Cell;

    fn counter_state() -> crate::reactive::Reactive {
        reactive(&Object::from_iter([("p", Value::from(1)), ("q", Value::from(1))]))
    }

    // ── Creation ────────────────────────────────────────────────────

    #[test]
    fn effect_runs_immediately() {
        let ran = Rc::new(Cell::new(false));
        let ran_c = ran.clone();
        effect(move || ran_c.set(true), EffectOptions::default());
        assert!(ran.get());
    }

    #[test]
    fn lazy_effect_waits_for_manual_run() {
        let runs = Rc::new(Cell::new(0));
        let runs_c = runs.clone();
        let runner = effect(move || runs_c.set(runs_c.get() + 1), EffectOptions::new().lazy(true));
        assert_eq!(runs.get(), 0);
        runner.run();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn run_returns_closure_result() {
        let state = counter_state();
        let runner = ReactiveEffect::new({
            let state = state.clone();
            move || state.get("p").as_int().unwrap_or_default() * 10
        });
        assert_eq!(runner.run(), 10);
    }

    // ── Track / trigger ─────────────────────────────────────────────

    #[test]
    fn reruns_once_when_read_property_changes() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let _ = state.get("p");
                    runs.set(runs.get() + 1);
                }
            },
            EffectOptions::default(),
        );
        assert_eq!(runs.get(), 1);
        state.set("p", 2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn equal_write_does_not_rerun() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let _ = state.get("p");
                    runs.set(runs.get() + 1);
                }
            },
            EffectOptions::default(),
        );
        state.set("p", 1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn unrelated_write_does_not_rerun() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let _ = state.get("p");
                    runs.set(runs.get() + 1);
                }
            },
            EffectOptions::default(),
        );
        state.set("q", 5);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn retracks_conditional_reads() {
        let state = reactive(&Object::from_iter([
            ("flag", Value::from(true)),
            ("a", Value::from(1)),
            ("b", Value::from(2)),
        ]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        effect(
            {
                let state = state.clone();
                let seen = seen.clone();
                move || {
                    let key = if state.get("flag") == Value::from(true) { "a" } else { "b" };
                    seen.borrow_mut().push(state.get(key));
                }
            },
            EffectOptions::default(),
        );
        state.set("flag", false);
        state.set("a", 10);
        assert_eq!(seen.borrow().len(), 2);
        state.set("b", 20);
        assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from(2), Value::from(20)]);
    }

    // ── Scheduler ───────────────────────────────────────────────────

    #[test]
    fn scheduler_receives_notifications() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        let scheduled = Rc::new(Cell::new(0));
        let options = EffectOptions::new().with_scheduler({
            let scheduled = scheduled.clone();
            move || scheduled.set(scheduled.get() + 1)
        });
        effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let _ = state.get("p");
                    runs.set(runs.get() + 1);
                }
            },
            options,
        );
        state.set("p", 2);
        state.set("p", 3);
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduled.get(), 2);
    }

    // ── Nesting / disposal ──────────────────────────────────────────

    #[test]
    fn nested_effect_restores_outer_reader() {
        let state = counter_state();
        let outer_runs = Rc::new(Cell::new(0));
        let inner_runs = Rc::new(Cell::new(0));
        effect(
            {
                let state = state.clone();
                let outer_runs = outer_runs.clone();
                let inner_runs = inner_runs.clone();
                move || {
                    outer_runs.set(outer_runs.get() + 1);
                    if outer_runs.get() == 1 {
                        let state = state.clone();
                        let inner_runs = inner_runs.clone();
                        effect(
                            move || {
                                let _ = state.get("q");
                                inner_runs.set(inner_runs.get() + 1);
                            },
                            EffectOptions::default(),
                        );
                    }
                    // Read after the inner effect finished: must track the outer one.
                    let _ = state.get("p");
                }
            },
            EffectOptions::default(),
        );
        state.set("p", 2);
        assert_eq!(outer_runs.get(), 2);
        assert_eq!(inner_runs.get(), 1);
        state.set("q", 2);
        assert_eq!(outer_runs.get(), 2);
        assert_eq!(inner_runs.get(), 2);
    }

    #[test]
    fn effect_writing_its_own_dependency_does_not_recurse() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let p = state.get("p").as_int().unwrap_or_default();
                    runs.set(runs.get() + 1);
                    state.set("p", p + 1);
                }
            },
            EffectOptions::default(),
        );
        assert_eq!(runs.get(), 1);
        assert_eq!(state.get("p"), Value::from(2));
    }

    #[test]
    fn stop_prevents_future_runs() {
        let state = counter_state();
        let runs = Rc::new(Cell::new(0));
        let runner = effect(
            {
                let state = state.clone();
                let runs = runs.clone();
                move || {
                    let _ = state.get("p");
                    runs.set(runs.get() + 1);
                }
            },
            EffectOptions::default(),
        );
        runner.stop();
        assert!(!runner.is_active());
        state.set("p", 2);
        assert_eq!(runs.get(), 1);
        // Manual run still works but does not resubscribe.
        runner.run();
        state.set("p", 3);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn debug_effect() {
        let runner = ReactiveEffect::new(|| ());
        let dbg = format!("{:?}", runner);
        assert!(dbg.contains("ReactiveEffect"));
        assert!(dbg.contains("active"));
    }
}
