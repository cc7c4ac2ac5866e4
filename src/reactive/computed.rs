//! Derived values.
//!
//! A [`Computed`] wraps a getter in an internal effect flagged as backing a
//! computed value. That effect is notified before plain effects, and its
//! scheduler forwards the notification to the computed's own readers, so an
//! effect that reads both a computed and its source always sees the fresh
//! derived value.
//!
//! Reads recompute: there is no dirty flag, so every `get` re-runs the getter.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::effect::ReactiveEffect;
use super::runtime::{self, DepId};

/// A derived value with its own dependency set.
pub struct Computed<T: 'static> {
    inner: Rc<ComputedInner<T>>,
}

struct ComputedInner<T: 'static> {
    effect: ReactiveEffect<T>,
    dep: DepId,
    cached: RefCell<Option<T>>,
    setter: Option<Box<dyn Fn(T)>>,
}

impl<T: 'static> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        self.effect.stop();
        runtime::drop_dep(self.dep);
    }
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// A read-only derived value.
    pub fn new(getter: impl Fn() -> T + 'static) -> Self {
        Self::build(getter, None)
    }

    /// A derived value whose `set` forwards to `setter`.
    pub fn writable(getter: impl Fn() -> T + 'static, setter: impl Fn(T) + 'static) -> Self {
        Self::build(getter, Some(Box::new(setter)))
    }

    fn build(getter: impl Fn() -> T + 'static, setter: Option<Box<dyn Fn(T)>>) -> Self {
        let dep = runtime::new_dep();
        let effect = ReactiveEffect::build(
            getter,
            true,
            Some(Rc::new(move || runtime::trigger_dep(dep))),
        );
        Self {
            inner: Rc::new(ComputedInner {
                effect,
                dep,
                cached: RefCell::new(None),
                setter,
            }),
        }
    }

    /// Track this computed against the current reader, then recompute.
    pub fn get(&self) -> T {
        runtime::track_dep(self.inner.dep);
        let value = self.inner.effect.run();
        *self.inner.cached.borrow_mut() = Some(value.clone());
        value
    }

    /// The result of the last `get`, without tracking or recomputing.
    pub fn peek(&self) -> Option<T> {
        self.inner.cached.borrow().clone()
    }

    /// Forward a write to the setter. Read-only computeds ignore it.
    pub fn set(&self, value: T) {
        match &self.inner.setter {
            Some(setter) => setter(value),
            None => tracing::warn!("write ignored: computed value is readonly"),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.inner.setter.is_some()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("cached", &*self.inner.cached.borrow())
            .field("writable", &self.inner.setter.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
