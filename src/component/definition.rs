//! Component definitions.
//!
//! A [`Component`] is an immutable description shared by every instance:
//!
//! ```ignore
//! let counter = Component::new("Counter")
//!     .data(|| Object::from_iter([("count", 0)]))
//!     .render(|ctx| Ok(h("p").text(ctx.get("count").to_string()).build()))
//!     .mounted(|_| tracing::info!("counter mounted"))
//!     .build();
//! ```

use std::fmt;
use std::rc::Rc;

use super::instance::RenderContext;
use super::lifecycle::{Hook, Hooks, LifecycleHook};
use crate::error::RenderError;
use crate::reactive::Object;
use crate::vnode::VNode;

/// A component render function.
pub type RenderFn = Rc<dyn Fn(&RenderContext) -> Result<VNode, RenderError>>;

pub(crate) type SetupFn = Rc<dyn Fn(&RenderContext) -> RenderFn>;
pub(crate) type DataFn = Rc<dyn Fn() -> Object>;

/// Box a closure as a [`RenderFn`]. Handy as the return value of `setup`.
pub fn render_fn(
    f: impl Fn(&RenderContext) -> Result<VNode, RenderError> + 'static,
) -> RenderFn {
    Rc::new(f)
}

/// A component definition.
pub struct Component {
    name: Rc<str>,
    functional: bool,
    data: Option<DataFn>,
    render: Option<RenderFn>,
    setup: Option<SetupFn>,
    hooks: Hooks,
}

impl Component {
    /// A stateful component with no options yet.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            functional: false,
            data: None,
            render: None,
            setup: None,
            hooks: Hooks::default(),
        }
    }

    /// A stateless component that is only a render function.
    pub fn functional(
        name: impl Into<Rc<str>>,
        render: impl Fn(&RenderContext) -> Result<VNode, RenderError> + 'static,
    ) -> Self {
        let mut component = Self::new(name).render(render);
        component.functional = true;
        component
    }

    /// Initial state factory. The returned object is made reactive per instance.
    pub fn data(mut self, f: impl Fn() -> Object + 'static) -> Self {
        self.data = Some(Rc::new(f));
        self
    }

    pub fn render(
        mut self,
        f: impl Fn(&RenderContext) -> Result<VNode, RenderError> + 'static,
    ) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Composition-style setup. Runs once per instance; its result becomes the
    /// render function and takes precedence over [`render`](Self::render).
    pub fn setup(mut self, f: impl Fn(&RenderContext) -> RenderFn + 'static) -> Self {
        self.setup = Some(Rc::new(f));
        self
    }

    fn hook(mut self, kind: LifecycleHook, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hooks.push(kind, Rc::new(f));
        self
    }

    pub fn before_create(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::BeforeCreate, f)
    }

    pub fn created(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::Created, f)
    }

    pub fn before_mount(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::BeforeMount, f)
    }

    pub fn mounted(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::Mounted, f)
    }

    pub fn before_update(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::BeforeUpdate, f)
    }

    pub fn updated(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::Updated, f)
    }

    pub fn unmounted(self, f: impl Fn(&RenderContext) + 'static) -> Self {
        self.hook(LifecycleHook::Unmounted, f)
    }

    /// Finish the definition. Vnodes refer to components through `Rc`.
    pub fn build(self) -> Rc<Component> {
        Rc::new(self)
    }

    // -- Accessors ----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_functional(&self) -> bool {
        self.functional
    }

    pub(crate) fn data_fn(&self) -> Option<&DataFn> {
        self.data.as_ref()
    }

    pub(crate) fn render_fn(&self) -> Option<&RenderFn> {
        self.render.as_ref()
    }

    pub(crate) fn setup_fn(&self) -> Option<&SetupFn> {
        self.setup.as_ref()
    }

    /// Option-style hooks declared on the definition.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Option-style hooks of one kind.
    pub(crate) fn option_hooks(&self, kind: LifecycleHook) -> Vec<Hook> {
        self.hooks.get(kind).to_vec()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("functional", &self.functional)
            .field("data", &self.data.is_some())
            .field("render", &self.render.is_some())
            .field("setup", &self.setup.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}
