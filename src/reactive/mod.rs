//! Reactive state: tracked objects, refs, effects, computed values, watchers.
//!
//! Reads performed while an effect runs subscribe that effect; writes notify
//! the subscribers of exactly the keys written.
//!
//! - [`reactive`]: wrap a raw [`Object`] so field reads track and writes trigger.
//! - [`Ref`] / [`to_ref`]: a single tracked value.
//! - [`effect`]: a re-runnable computation with automatic dependencies.
//! - [`Computed`]: a derived value notified ahead of plain effects.
//! - [`watch`]: scheduled `(new, old)` callbacks.

pub mod computed;
pub mod effect;
pub mod object;
pub mod refs;
pub mod runtime;
pub mod value;
pub mod watch;

pub use computed::Computed;
pub use effect::{effect, EffectOptions, ReactiveEffect};
pub use object::{is_reactive, reactive, Reactive};
pub use refs::{is_ref, to_ref, IntoRef, MaybeRef, Ref};
pub use runtime::{track, trigger, untracked, EffectId, TargetId};
pub use value::{has_changed, Object, Value};
pub use watch::{traverse, watch, WatchHandle, WatchOptions, WatchSource};
