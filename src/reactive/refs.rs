//! Single-value reactive containers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::computed::Computed;
use super::object::Reactive;
use super::runtime::{self, DepId};
use super::value::{has_changed, Object, Value};

/// A tracked cell holding one [`Value`].
///
/// Structured values are wrapped with [`reactive`](super::reactive) when
/// stored, so reads of their fields are tracked too.
#[derive(Clone)]
pub struct Ref {
    inner: Rc<RefInner>,
}

struct RefInner {
    value: RefCell<Value>,
    dep: DepId,
}

impl Drop for RefInner {
    fn drop(&mut self) {
        runtime::drop_dep(self.dep);
    }
}

impl Ref {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Rc::new(RefInner {
                value: RefCell::new(value.into().to_reactive()),
                dep: runtime::new_dep(),
            }),
        }
    }

    /// Read the value, tracking this ref.
    pub fn get(&self) -> Value {
        runtime::track_dep(self.inner.dep);
        self.inner.value.borrow().clone()
    }

    /// Read the value without tracking.
    pub fn get_untracked(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Replace the value. Subscribers run only if it changed.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into().to_reactive();
        let changed = has_changed(&self.inner.value.borrow(), &value);
        if changed {
            *self.inner.value.borrow_mut() = value;
            runtime::trigger_dep(self.inner.dep);
        }
    }

    /// Update the value in place from the current one.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) {
        let next = f(&self.get_untracked());
        self.set(next);
    }

    /// Number of effects currently reading this ref.
    pub fn subscriber_count(&self) -> usize {
        runtime::dep_len(self.inner.dep)
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&*self.inner.value.borrow()).finish()
    }
}

// ---------------------------------------------------------------------------
// to_ref / is_ref
// ---------------------------------------------------------------------------

/// Conversion into a [`Ref`]. An existing ref converts to itself.
pub trait IntoRef {
    fn into_ref(self) -> Ref;
}

impl IntoRef for Ref {
    fn into_ref(self) -> Ref {
        self
    }
}

impl IntoRef for &Ref {
    fn into_ref(self) -> Ref {
        self.clone()
    }
}

macro_rules! into_ref_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoRef for $ty {
                fn into_ref(self) -> Ref {
                    Ref::new(self)
                }
            }
        )*
    };
}

into_ref_via_value!(Value, Object, Reactive, bool, i32, i64, f64, &str, String);

/// Wrap `value` in a ref, or return it unchanged if it already is one.
pub fn to_ref(value: impl IntoRef) -> Ref {
    value.into_ref()
}

/// Anything that can be checked with [`is_ref`].
pub trait MaybeRef {
    fn is_ref(&self) -> bool {
        false
    }
}

impl MaybeRef for Ref {
    fn is_ref(&self) -> bool {
        true
    }
}

impl<T: Clone + 'static> MaybeRef for Computed<T> {
    fn is_ref(&self) -> bool {
        true
    }
}

impl MaybeRef for Value {}
impl MaybeRef for Object {}
impl MaybeRef for Reactive {}

/// Whether `value` is a ref-like container (a [`Ref`] or a [`Computed`]).
pub fn is_ref(value: &impl MaybeRef) -> bool {
    value.is_ref()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::{effect, EffectOptions};
    use crate::reactive::object::is_reactive;
    use std::cell::Cell;

    fn watch_ref(r: &Ref) -> Rc<Cell<u32>> {
        let runs = Rc::new(Cell::new(0));
        effect(
            {
                let r = r.clone();
                let runs = runs.clone();
                move || {
                    let _ = r.get();
                    runs.set(runs.get() + 1);
                }
            },
            EffectOptions::default(),
        );
        runs
    }

    #[test]
    fn get_and_set() {
        let r = Ref::new(1);
        assert_eq!(r.get(), Value::from(1));
        r.set(2);
        assert_eq!(r.get(), Value::from(2));
    }

    #[test]
    fn set_reruns_readers() {
        let r = Ref::new(1);
        let runs = watch_ref(&r);
        r.set(2);
        assert_eq!(runs.get(), 2);
        assert_eq!(r.subscriber_count(), 1);
    }

    #[test]
    fn equal_set_is_silent() {
        let r = Ref::new("a");
        let runs = watch_ref(&r);
        r.set("a");
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn nan_set_is_silent() {
        let r = Ref::new(f64::NAN);
        let runs = watch_ref(&r);
        r.set(f64::NAN);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn objects_are_stored_reactive() {
        let r = Ref::new(Object::from_iter([("n", 1)]));
        assert!(is_reactive(&r.get()));
    }

    #[test]
    fn nested_field_reads_are_tracked() {
        let r = Ref::new(Object::from_iter([("n", 1)]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        effect(
            {
                let r = r.clone();
                let seen = seen.clone();
                move || {
                    if let Some(obj) = r.get().as_reactive() {
                        seen.borrow_mut().push(obj.get("n"));
                    }
                }
            },
            EffectOptions::default(),
        );
        let current = r.get();
        current.as_reactive().expect("reactive value").set("n", 5);
        assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from(5)]);
    }

    #[test]
    fn update_derives_from_current() {
        let r = Ref::new(3);
        r.update(|v| Value::from(v.as_int().unwrap_or_default() + 1));
        assert_eq!(r.get_untracked(), Value::from(4));
    }

    #[test]
    fn to_ref_is_idempotent() {
        let r = Ref::new(1);
        let again = to_ref(r.clone());
        assert!(again.ptr_eq(&r));
        assert!(to_ref(&r).ptr_eq(&r));
    }

    #[test]
    fn to_ref_wraps_plain_values() {
        let r = to_ref(7);
        assert_eq!(r.get(), Value::from(7));
    }

    #[test]
    fn is_ref_checks() {
        assert!(is_ref(&Ref::new(1)));
        assert!(is_ref(&Computed::new(|| 1)));
        assert!(!is_ref(&Value::from(1)));
        assert!(!is_ref(&Object::new()));
    }
}
