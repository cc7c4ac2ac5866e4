//! Dependency graph and reader stack.
//!
//! A single thread-local [`Runtime`] owns every effect slot, every dependency
//! set ("dep") and the two-level `target -> key -> dep` graph. Effects and deps
//! live in slotmap arenas and reference each other by id, so the graph is
//! many-to-many without reference cycles.
//!
//! The runtime is never borrowed across a user callback: notification first
//! snapshots the subscribers, releases the borrow, then calls out. That keeps
//! re-entrant `track`/`trigger` calls (an effect writing state while it runs)
//! safe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;
use indexmap::IndexSet;
use slotmap::{new_key_type, SlotMap};

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

new_key_type! {
    /// Identifies an effect slot inside the runtime.
    pub struct EffectId;

    /// Identifies a dependency set inside the runtime.
    pub struct DepId;
}

/// Stable identity token of a tracked target.
///
/// Tokens are handed out from a monotonically increasing counter and never
/// reused, so a token outliving its target can not alias a newer one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    pub(crate) fn next() -> Self {
        NEXT_TARGET.with(|next| {
            let id = next.get();
            next.set(id + 1);
            TargetId(id)
        })
    }

    /// The raw token value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// Key used for structural reads (`keys()`, `len()`), triggered whenever a
/// key is added to or removed from a target.
pub(crate) const ITERATE_KEY: &str = "\u{0}iterate";

pub(crate) type Callback = Rc<dyn Fn()>;

// ---------------------------------------------------------------------------
// Runtime internals
// ---------------------------------------------------------------------------

struct EffectSlot {
    /// Re-runs the effect, discarding its result. Set right after the slot is
    /// allocated because the runner needs the slot id.
    runner: Option<Callback>,
    scheduler: Option<Callback>,
    /// Whether this effect backs a computed value (notified first).
    computed: bool,
    /// Deps this effect joined during its last run.
    deps: Vec<DepId>,
}

struct Runtime {
    effects: SlotMap<EffectId, EffectSlot>,
    deps: SlotMap<DepId, IndexSet<EffectId>>,
    targets: FxHashMap<TargetId, FxHashMap<String, DepId>>,
    /// Reader stack. `None` entries pause tracking.
    readers: Vec<Option<EffectId>>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            effects: SlotMap::with_key(),
            deps: SlotMap::with_key(),
            targets: FxHashMap::default(),
            readers: Vec::new(),
        }
    }

    fn current_reader(&self) -> Option<EffectId> {
        self.readers.last().copied().flatten()
    }

    fn is_running(&self, id: EffectId) -> bool {
        self.readers.iter().any(|reader| *reader == Some(id))
    }

    fn add_subscriber(&mut self, dep: DepId, effect: EffectId) {
        if !self.effects.contains_key(effect) {
            return;
        }
        let Some(subscribers) = self.deps.get_mut(dep) else {
            return;
        };
        if subscribers.insert(effect) {
            if let Some(slot) = self.effects.get_mut(effect) {
                slot.deps.push(dep);
            }
        }
    }

    /// Subscribers of `dep` in notification order: computed-backed effects
    /// first, then plain ones, each tier in subscription order. Effects that
    /// are currently running are left out.
    fn notification_order(&self, dep: DepId) -> Vec<EffectId> {
        let Some(subscribers) = self.deps.get(dep) else {
            return Vec::new();
        };
        let is_computed = |id: &EffectId| self.effects.get(*id).is_some_and(|slot| slot.computed);
        let (mut order, plain): (Vec<EffectId>, Vec<EffectId>) = subscribers
            .iter()
            .copied()
            .filter(|id| !self.is_running(*id))
            .partition(is_computed);
        order.extend(plain);
        order
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
    static NEXT_TARGET: Cell<u64> = const { Cell::new(1) };
}

// ---------------------------------------------------------------------------
// Effect slots
// ---------------------------------------------------------------------------

pub(crate) fn register_effect(computed: bool, scheduler: Option<Callback>) -> EffectId {
    RUNTIME.with(|rt| {
        rt.borrow_mut().effects.insert(EffectSlot {
            runner: None,
            scheduler,
            computed,
            deps: Vec::new(),
        })
    })
}

pub(crate) fn set_runner(id: EffectId, runner: Callback) {
    RUNTIME.with(|rt| {
        if let Some(slot) = rt.borrow_mut().effects.get_mut(id) {
            slot.runner = Some(runner);
        }
    });
}

pub(crate) fn is_active(id: EffectId) -> bool {
    RUNTIME.with(|rt| rt.borrow().effects.contains_key(id))
}

/// Remove `id` from every dep it joined during its last run.
pub(crate) fn cleanup_effect(id: EffectId) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let Some(slot) = rt.effects.get_mut(id) else {
            return;
        };
        let deps = std::mem::take(&mut slot.deps);
        for dep in deps {
            if let Some(subscribers) = rt.deps.get_mut(dep) {
                subscribers.shift_remove(&id);
            }
        }
    });
}

/// Unregister an effect. Idempotent.
///
/// The slot is moved out of the runtime before it is dropped: its runner may
/// own user state whose destructors call back into the runtime.
pub(crate) fn stop_effect(id: EffectId) {
    let slot = RUNTIME.try_with(|rt| {
        let Ok(mut rt) = rt.try_borrow_mut() else {
            return None;
        };
        let slot = rt.effects.remove(id)?;
        for dep in &slot.deps {
            if let Some(subscribers) = rt.deps.get_mut(*dep) {
                subscribers.shift_remove(&id);
            }
        }
        Some(slot)
    });
    if let Ok(Some(slot)) = slot {
        tracing::trace!(effect = ?id, "effect stopped");
        drop(slot);
    }
}

// ---------------------------------------------------------------------------
// Reader stack
// ---------------------------------------------------------------------------

/// Pops the reader pushed by [`enter`] or [`pause_tracking`] when dropped,
/// including during unwinding.
pub(crate) struct ReaderGuard {
    _private: (),
}

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| {
            if let Ok(mut rt) = rt.try_borrow_mut() {
                rt.readers.pop();
            }
        });
    }
}

/// Make `id` the current reader until the guard drops.
pub(crate) fn enter(id: EffectId) -> ReaderGuard {
    RUNTIME.with(|rt| rt.borrow_mut().readers.push(Some(id)));
    ReaderGuard { _private: () }
}

/// Suspend tracking until the guard drops.
pub(crate) fn pause_tracking() -> ReaderGuard {
    RUNTIME.with(|rt| rt.borrow_mut().readers.push(None));
    ReaderGuard { _private: () }
}

/// Run `f` without registering any reads against the current reader.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = pause_tracking();
    f()
}

/// The effect currently registering reads, if any.
pub fn active_effect() -> Option<EffectId> {
    RUNTIME.with(|rt| rt.borrow().current_reader())
}

/// Whether a read right now would be tracked.
pub fn is_tracking() -> bool {
    active_effect().is_some()
}

// ---------------------------------------------------------------------------
// Track / trigger
// ---------------------------------------------------------------------------

/// Record that the current reader depends on `key` of `target`.
///
/// No-op when nothing is running. Graph levels are created lazily.
pub fn track(target: TargetId, key: &str) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let Some(reader) = rt.current_reader() else {
            return;
        };
        let existing = rt.targets.get(&target).and_then(|keys| keys.get(key)).copied();
        let dep = match existing {
            Some(dep) => dep,
            None => {
                let dep = rt.deps.insert(IndexSet::new());
                rt.targets
                    .entry(target)
                    .or_default()
                    .insert(key.to_owned(), dep);
                dep
            }
        };
        rt.add_subscriber(dep, reader);
    });
}

/// Notify every effect depending on `key` of `target`.
///
/// Absent graph entries mean "no subscribers".
pub fn trigger(target: TargetId, key: &str) {
    let dep = RUNTIME.with(|rt| {
        rt.borrow()
            .targets
            .get(&target)
            .and_then(|keys| keys.get(key))
            .copied()
    });
    if let Some(dep) = dep {
        tracing::trace!(?target, key, "trigger");
        trigger_dep(dep);
    }
}

pub(crate) fn new_dep() -> DepId {
    RUNTIME.with(|rt| rt.borrow_mut().deps.insert(IndexSet::new()))
}

pub(crate) fn drop_dep(dep: DepId) {
    let _ = RUNTIME.try_with(|rt| {
        if let Ok(mut rt) = rt.try_borrow_mut() {
            rt.deps.remove(dep);
        }
    });
}

/// Register the current reader into `dep`.
pub(crate) fn track_dep(dep: DepId) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if let Some(reader) = rt.current_reader() {
            rt.add_subscriber(dep, reader);
        }
    });
}

/// Deps `id` has joined so far in its current run.
pub(crate) fn effect_deps(id: EffectId) -> Vec<DepId> {
    RUNTIME.with(|rt| rt.borrow().effects.get(id).map(|slot| slot.deps.clone()).unwrap_or_default())
}

/// Register the current reader into each of `deps` that still exists.
pub(crate) fn track_deps(deps: &[DepId]) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if let Some(reader) = rt.current_reader() {
            for &dep in deps {
                rt.add_subscriber(dep, reader);
            }
        }
    });
}

/// Notify the subscribers of `dep`: scheduler when present, otherwise an
/// immediate synchronous run.
pub(crate) fn trigger_dep(dep: DepId) {
    let order = RUNTIME.with(|rt| rt.borrow().notification_order(dep));
    for id in order {
        // An earlier callback may have stopped this effect.
        let callback = RUNTIME.with(|rt| {
            rt.borrow()
                .effects
                .get(id)
                .and_then(|slot| slot.scheduler.clone().or_else(|| slot.runner.clone()))
        });
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Release the graph entries of a dropped target.
pub(crate) fn forget_target(target: TargetId) {
    let _ = RUNTIME.try_with(|rt| {
        let Ok(mut rt) = rt.try_borrow_mut() else {
            return;
        };
        if let Some(keys) = rt.targets.remove(&target) {
            for dep in keys.into_values() {
                rt.deps.remove(dep);
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Number of effects currently subscribed to `key` of `target`.
pub fn subscriber_count(target: TargetId, key: &str) -> usize {
    RUNTIME.with(|rt| {
        let rt = rt.borrow();
        rt.targets
            .get(&target)
            .and_then(|keys| keys.get(key))
            .and_then(|dep| rt.deps.get(*dep))
            .map_or(0, IndexSet::len)
    })
}

/// Whether the graph holds any entry for `target`.
pub fn is_tracked_target(target: TargetId) -> bool {
    RUNTIME.with(|rt| rt.borrow().targets.contains_key(&target))
}

pub(crate) fn dep_len(dep: DepId) -> usize {
    RUNTIME.with(|rt| rt.borrow().deps.get(dep).map_or(0, IndexSet::len))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
