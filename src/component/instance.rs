//! Component instances.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::definition::{Component, RenderFn};
use super::lifecycle::{self, Hook, Hooks, LifecycleHook};
use crate::renderer::NodeId;
use crate::error::RenderError;
use crate::reactive::runtime::{self, DepId};
use crate::reactive::{self, reactive, Object, ReactiveEffect, Value};
use crate::scheduler::Job;
use crate::vnode::{VNode, WeakVNode};

thread_local! {
    static NEXT_UID: Cell<u64> = const { Cell::new(0) };
}

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// What render functions and hooks see of their instance.
pub struct RenderContext {
    instance: Rc<ComponentInstance>,
}

impl RenderContext {
    /// The instance's reactive state.
    ///
    /// Empty until the `data` factory has run, i.e. inside `setup` and
    /// `before_create`.
    pub fn data(&self) -> reactive::Reactive {
        self.instance.data()
    }

    /// Tracked read of one state field.
    pub fn get(&self, key: &str) -> Value {
        self.instance.data().get(key)
    }

    /// Write one state field.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.instance.data().set(key, value);
    }

    pub fn name(&self) -> &str {
        self.instance.component.name()
    }

    pub fn uid(&self) -> u64 {
        self.instance.uid
    }

    pub fn instance(&self) -> &Rc<ComponentInstance> {
        &self.instance
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("name", &self.name())
            .field("uid", &self.uid())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentInstance
// ---------------------------------------------------------------------------

/// One mounted occurrence of a [`Component`].
///
/// Created when its vnode is first mounted, carried over to each new vnode
/// for the same component, and torn down on unmount.
pub struct ComponentInstance {
    uid: u64,
    component: Rc<Component>,
    data: RefCell<reactive::Reactive>,
    render: RefCell<Option<RenderFn>>,
    hooks: RefCell<Hooks>,
    /// Back-reference to the vnode that owns this instance.
    vnode: RefCell<WeakVNode>,
    subtree: RefCell<Option<VNode>>,
    effect: RefCell<Option<ReactiveEffect>>,
    /// What the last successful render read.
    render_deps: RefCell<Vec<DepId>>,
    update: OnceCell<Job>,
    container: Cell<Option<NodeId>>,
    is_mounted: Cell<bool>,
}

impl ComponentInstance {
    pub(crate) fn new(vnode: &VNode, component: Rc<Component>) -> Rc<Self> {
        let uid = NEXT_UID.with(|next| {
            let uid = next.get();
            next.set(uid + 1);
            uid
        });
        Rc::new(Self {
            uid,
            component,
            data: RefCell::new(reactive(&Object::new())),
            render: RefCell::new(None),
            hooks: RefCell::new(Hooks::default()),
            vnode: RefCell::new(vnode.downgrade()),
            subtree: RefCell::new(None),
            effect: RefCell::new(None),
            render_deps: RefCell::new(Vec::new()),
            update: OnceCell::new(),
            container: Cell::new(None),
            is_mounted: Cell::new(false),
        })
    }

    /// Run `setup`, resolve the render function and apply the options.
    ///
    /// Order: `setup`, `before_create`, `data`, `created`, then the option
    /// hooks are appended after any registered during `setup`.
    pub(crate) fn setup(self: &Rc<Self>) {
        if let Some(setup) = self.component.setup_fn().cloned() {
            let render = {
                let _current = lifecycle::enter_setup(self);
                reactive::untracked(|| setup(&self.context()))
            };
            *self.render.borrow_mut() = Some(render);
        }
        if self.render.borrow().is_none() {
            *self.render.borrow_mut() = self.component.render_fn().cloned();
        }

        self.call_option_hooks(LifecycleHook::BeforeCreate);
        if let Some(data) = self.component.data_fn().cloned() {
            let state = reactive::untracked(|| data());
            *self.data.borrow_mut() = reactive(&state);
        }
        self.call_option_hooks(LifecycleHook::Created);

        let mut hooks = self.hooks.borrow_mut();
        for kind in [
            LifecycleHook::BeforeMount,
            LifecycleHook::Mounted,
            LifecycleHook::BeforeUpdate,
            LifecycleHook::Updated,
            LifecycleHook::Unmounted,
        ] {
            for hook in self.component.option_hooks(kind) {
                hooks.push(kind, hook);
            }
        }
    }

    pub(crate) fn context(self: &Rc<Self>) -> RenderContext {
        RenderContext {
            instance: self.clone(),
        }
    }

    /// Call the render function.
    pub(crate) fn render_root(self: &Rc<Self>) -> Result<VNode, RenderError> {
        let render = self.render.borrow().clone();
        match render {
            Some(render) => render(&self.context()),
            None => Err(RenderError::MissingRender(self.name().to_owned())),
        }
    }

    pub(crate) fn add_hook(&self, kind: LifecycleHook, hook: Hook) {
        self.hooks.borrow_mut().push(kind, hook);
    }

    /// Run the registered hooks of `kind`. Reads inside hooks are untracked.
    pub(crate) fn call_hooks(self: &Rc<Self>, kind: LifecycleHook) {
        let hooks = self.hooks.borrow().get(kind).to_vec();
        self.run_hooks(kind, &hooks);
    }

    fn call_option_hooks(self: &Rc<Self>, kind: LifecycleHook) {
        let hooks = self.component.option_hooks(kind);
        self.run_hooks(kind, &hooks);
    }

    fn run_hooks(self: &Rc<Self>, kind: LifecycleHook, hooks: &[Hook]) {
        if hooks.is_empty() {
            return;
        }
        tracing::trace!(component = self.name(), hook = kind.name(), "lifecycle");
        let ctx = self.context();
        reactive::untracked(|| {
            for hook in hooks {
                hook(&ctx);
            }
        });
    }

    // -- Render effect plumbing ---------------------------------------------

    pub(crate) fn set_effect(&self, effect: ReactiveEffect) {
        *self.effect.borrow_mut() = Some(effect);
    }

    /// Remember the render effect's current deps. Called right after a
    /// successful render, while the effect is still the reader.
    pub(crate) fn record_render_deps(&self) {
        if let Some(effect) = self.effect.borrow().as_ref() {
            *self.render_deps.borrow_mut() = runtime::effect_deps(effect.id());
        }
    }

    /// After a failed render, subscribe the running effect to whatever the
    /// last good render read, so the next change retries. With no good
    /// render yet, every field of the instance state is read instead.
    pub(crate) fn retain_render_deps(&self) {
        let deps = self.render_deps.borrow().clone();
        if deps.is_empty() {
            reactive::traverse(&Value::Reactive(self.data()));
        } else {
            runtime::track_deps(&deps);
        }
    }

    pub(crate) fn set_update(&self, job: Job) {
        let _ = self.update.set(job);
    }

    pub(crate) fn update_job(&self) -> Option<Job> {
        self.update.get().cloned()
    }

    pub(crate) fn set_vnode(&self, vnode: Option<&VNode>) {
        *self.vnode.borrow_mut() = vnode.map(VNode::downgrade).unwrap_or_default();
    }

    pub(crate) fn vnode(&self) -> Option<VNode> {
        self.vnode.borrow().upgrade()
    }

    pub(crate) fn set_subtree(&self, subtree: Option<VNode>) {
        *self.subtree.borrow_mut() = subtree;
    }

    pub(crate) fn set_container(&self, container: NodeId) {
        self.container.set(Some(container));
    }

    pub(crate) fn container(&self) -> Option<NodeId> {
        self.container.get()
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.is_mounted.set(mounted);
    }

    /// Stop the render effect. Returns it for callers that need the handle.
    pub(crate) fn stop(&self) -> Option<ReactiveEffect> {
        let effect = self.effect.borrow_mut().take();
        if let Some(effect) = &effect {
            effect.stop();
        }
        effect
    }

    // -- Public inspection --------------------------------------------------

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn component(&self) -> &Rc<Component> {
        &self.component
    }

    pub fn data(&self) -> reactive::Reactive {
        self.data.borrow().clone()
    }

    /// The subtree produced by the last successful render.
    pub fn subtree(&self) -> Option<VNode> {
        self.subtree.borrow().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    /// Whether the render effect is still live.
    pub fn is_active(&self) -> bool {
        self.effect
            .borrow()
            .as_ref()
            .is_some_and(ReactiveEffect::is_active)
    }

    /// Re-render right away, bypassing the scheduler.
    pub fn force_update(&self) {
        let effect = self.effect.borrow().clone();
        if let Some(effect) = effect.filter(ReactiveEffect::is_active) {
            effect.run();
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.uid)
            .field("name", &self.name())
            .field("is_mounted", &self.is_mounted.get())
            .finish()
    }
}
