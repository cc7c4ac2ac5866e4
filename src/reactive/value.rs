//! Structured data placed under reactivity.
//!
//! [`Object`] is the raw tracked target: an insertion-ordered map of string
//! keys to [`Value`]s with a stable identity. It is shared by reference and
//! never deep-copied. Reading or writing an `Object` directly is untracked;
//! wrap it with [`reactive`](super::reactive) to get track/trigger behaviour.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::object::Reactive;
use super::runtime::{self, TargetId};

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically typed value stored in a tracked target or a ref.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// A raw structured value.
    Object(Object),
    /// A structured value seen through its reactive wrapper.
    Reactive(Reactive),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The reactive wrapper, if this value is one.
    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(r) => Some(r),
            _ => None,
        }
    }

    /// The underlying raw target of a structured value.
    pub fn as_object(&self) -> Option<Object> {
        match self {
            Value::Object(o) => Some(o.clone()),
            Value::Reactive(r) => Some(r.raw()),
            _ => None,
        }
    }

    /// Whether this is a structured value (raw or wrapped).
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    /// Strip the reactive wrapper, keeping the raw target.
    pub fn to_raw(&self) -> Value {
        match self {
            Value::Reactive(r) => Value::Object(r.raw()),
            other => other.clone(),
        }
    }

    /// Wrap a raw structured value; other values pass through.
    pub fn to_reactive(&self) -> Value {
        match self {
            Value::Object(o) => Value::Reactive(super::object::reactive(o)),
            other => other.clone(),
        }
    }

    /// `Object.is`-style identity comparison.
    ///
    /// `NaN` equals itself, `+0.0` and `-0.0` differ, structured values
    /// compare by target identity (a wrapper is the same value as its raw
    /// target), strings by content.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (a, b) if a.is_structured() && b.is_structured() => {
                match (a.as_object(), b.as_object()) {
                    (Some(a), Some(b)) => a.ptr_eq(&b),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Whether a write of `new` over `old` counts as a change.
pub fn has_changed(old: &Value, new: &Value) -> bool {
    !old.same_value(new)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Object(o) => write!(f, "Object({:?})", o.id()),
            Value::Reactive(r) => write!(f, "Reactive({:?})", r.raw().id()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(_) | Value::Reactive(_) => f.write_str("[object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Reactive> for Value {
    fn from(r: Reactive) -> Self {
        Value::Reactive(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A raw tracked target. Cloning shares the same target.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    id: TargetId,
    fields: RefCell<IndexMap<String, Value>>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        runtime::forget_target(self.id);
    }
}

impl Object {
    /// Create an empty target.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: TargetId::next(),
                fields: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Identity token of this target.
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Read a field without tracking. Missing fields read as `Null`.
    pub fn get(&self, key: &str) -> Value {
        self.inner.fields.borrow().get(key).cloned().unwrap_or_default()
    }

    /// Write a field without triggering; returns the previous value.
    ///
    /// Wrapped values are stored raw.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let value = value.into().to_raw();
        self.inner.fields.borrow_mut().insert(key.into(), value)
    }

    /// Remove a field without triggering.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.fields.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.fields.borrow().contains_key(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.borrow().is_empty()
    }

    /// Whether two handles refer to the same target.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fields may form cycles, so only the identity is printed.
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("len", &self.len())
            .finish()
    }
}

/// Non-owning handle to a target.
#[derive(Clone)]
pub(crate) struct WeakObject {
    inner: std::rc::Weak<ObjectInner>,
}

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
