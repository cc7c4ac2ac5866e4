//! Lifecycle hooks and composition-style hook registration.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::instance::{ComponentInstance, RenderContext};

/// A point in a component's life at which hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    Unmounted,
}

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 7] = [
        LifecycleHook::BeforeCreate,
        LifecycleHook::Created,
        LifecycleHook::BeforeMount,
        LifecycleHook::Mounted,
        LifecycleHook::BeforeUpdate,
        LifecycleHook::Updated,
        LifecycleHook::Unmounted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LifecycleHook::BeforeCreate => "beforeCreate",
            LifecycleHook::Created => "created",
            LifecycleHook::BeforeMount => "beforeMount",
            LifecycleHook::Mounted => "mounted",
            LifecycleHook::BeforeUpdate => "beforeUpdate",
            LifecycleHook::Updated => "updated",
            LifecycleHook::Unmounted => "unmounted",
        }
    }
}

/// A hook callback.
pub type Hook = Rc<dyn Fn(&RenderContext)>;

/// Registered hooks, grouped by lifecycle point, in registration order.
#[derive(Clone, Default)]
pub struct Hooks {
    slots: [Vec<Hook>; 7],
}

impl Hooks {
    pub fn push(&mut self, kind: LifecycleHook, hook: Hook) {
        self.slots[kind as usize].push(hook);
    }

    pub fn get(&self, kind: LifecycleHook) -> &[Hook] {
        &self.slots[kind as usize]
    }

    /// Append every hook of `other` after the ones already registered.
    pub fn extend_from(&mut self, other: &Hooks) {
        for (slot, more) in self.slots.iter_mut().zip(other.slots.iter()) {
            slot.extend(more.iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in LifecycleHook::ALL {
            let count = self.get(kind).len();
            if count > 0 {
                map.entry(&kind.name(), &count);
            }
        }
        map.finish()
    }
}

// ---------------------------------------------------------------------------
// Current instance
// ---------------------------------------------------------------------------

thread_local! {
    static CURRENT_INSTANCE: RefCell<Vec<Rc<ComponentInstance>>> = const { RefCell::new(Vec::new()) };
}

/// Marks `instance` as the one whose setup is running until dropped.
pub(crate) struct SetupGuard {
    _private: (),
}

impl Drop for SetupGuard {
    fn drop(&mut self) {
        let _ = CURRENT_INSTANCE.try_with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.pop();
            }
        });
    }
}

pub(crate) fn enter_setup(instance: &Rc<ComponentInstance>) -> SetupGuard {
    CURRENT_INSTANCE.with(|stack| stack.borrow_mut().push(instance.clone()));
    SetupGuard { _private: () }
}

/// The instance whose `setup` is currently running.
pub fn current_instance() -> Option<Rc<ComponentInstance>> {
    CURRENT_INSTANCE.with(|stack| stack.borrow().last().cloned())
}

fn inject_hook(kind: LifecycleHook, hook: Hook) {
    match current_instance() {
        Some(instance) => instance.add_hook(kind, hook),
        None => tracing::warn!(
            hook = kind.name(),
            "lifecycle hook registered outside of setup; ignored"
        ),
    }
}

pub fn on_before_mount(hook: impl Fn(&RenderContext) + 'static) {
    inject_hook(LifecycleHook::BeforeMount, Rc::new(hook));
}

pub fn on_mounted(hook: impl Fn(&RenderContext) + 'static) {
    inject_hook(LifecycleHook::Mounted, Rc::new(hook));
}

pub fn on_before_update(hook: impl Fn(&RenderContext) + 'static) {
    inject_hook(LifecycleHook::BeforeUpdate, Rc::new(hook));
}

pub fn on_updated(hook: impl Fn(&RenderContext) + 'static) {
    inject_hook(LifecycleHook::Updated, Rc::new(hook));
}

pub fn on_unmounted(hook: impl Fn(&RenderContext) + 'static) {
    inject_hook(LifecycleHook::Unmounted, Rc::new(hook));
}
