//! Reactive wrapper over a raw [`Object`].
//!
//! Reads through a [`Reactive`] track `(target, key)` against the current
//! reader; writes trigger the subscribers of that key when the stored value
//! actually changes. Nested structured values are wrapped lazily on read.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use super::runtime::{self, TargetId, ITERATE_KEY};
use super::value::{has_changed, Object, Value};

// ---------------------------------------------------------------------------
// Wrapper cache
// ---------------------------------------------------------------------------

thread_local! {
    /// One wrapper per live target. Holds weak references only, so a wrapper
    /// lives exactly as long as some handle to it does.
    static WRAPPERS: RefCell<FxHashMap<TargetId, Weak<ReactiveInner>>> =
        RefCell::new(FxHashMap::default());
}

/// Wrap `target` so reads track and writes trigger.
///
/// Wrapping the same target again returns the same wrapper instance while it
/// is alive.
pub fn reactive(target: &Object) -> Reactive {
    let id = target.id();
    WRAPPERS.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(existing) = cache.get(&id).and_then(Weak::upgrade) {
            return Reactive { inner: existing };
        }
        cache.retain(|_, weak| weak.strong_count() > 0);
        let inner = Rc::new(ReactiveInner {
            target: target.clone(),
        });
        cache.insert(id, Rc::downgrade(&inner));
        Reactive { inner }
    })
}

/// Whether `value` is a reactive wrapper.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Reactive(_))
}

/// Number of live wrappers in the cache.
pub fn live_wrappers() -> usize {
    WRAPPERS.with(|cache| {
        cache
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    })
}

// ---------------------------------------------------------------------------
// Reactive
// ---------------------------------------------------------------------------

/// A tracked view of a raw [`Object`]. Cloning shares the wrapper.
#[derive(Clone)]
pub struct Reactive {
    inner: Rc<ReactiveInner>,
}

struct ReactiveInner {
    target: Object,
}

impl Reactive {
    /// Read `key`, tracking it. Structured values come back wrapped.
    pub fn get(&self, key: &str) -> Value {
        runtime::track(self.id(), key);
        self.inner.target.get(key).to_reactive()
    }

    /// Write `key`, triggering its subscribers if the value changed.
    ///
    /// Adding a key also triggers structural readers (`keys`, `len`).
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let target = &self.inner.target;
        let had_key = target.contains_key(key);
        let old = target.insert(key, value.clone()).unwrap_or_default();
        if !had_key {
            runtime::trigger(self.id(), key);
            runtime::trigger(self.id(), ITERATE_KEY);
        } else if has_changed(&old, &value) {
            runtime::trigger(self.id(), key);
        }
    }

    /// Whether `key` is present, tracking the key.
    pub fn has(&self, key: &str) -> bool {
        runtime::track(self.id(), key);
        self.inner.target.contains_key(key)
    }

    /// Remove `key`. Returns the removed value, if any.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let removed = self.inner.target.remove(key)?;
        runtime::trigger(self.id(), key);
        runtime::trigger(self.id(), ITERATE_KEY);
        Some(removed)
    }

    /// Field names, tracking the key set.
    pub fn keys(&self) -> Vec<String> {
        runtime::track(self.id(), ITERATE_KEY);
        self.inner.target.keys()
    }

    /// Number of fields, tracking the key set.
    pub fn len(&self) -> usize {
        runtime::track(self.id(), ITERATE_KEY);
        self.inner.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying raw target. Reads and writes on it are untracked.
    pub fn raw(&self) -> Object {
        self.inner.target.clone()
    }

    pub fn id(&self) -> TargetId {
        self.inner.target.id()
    }

    /// Whether two handles are the same wrapper.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.id()).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
