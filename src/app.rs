//! App struct: configuration and mounting of a root component.
//!
//! [`App`] owns a [`Renderer`] over some [`Host`] and mounts one root
//! component into a container node of that host.

use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentInstance};
use crate::error::ErrorHandler;
use crate::renderer::{Host, NodeId, Renderer};
use crate::vnode::{h, VNode};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Clone, Default)]
pub struct AppConfig {
    /// Optional app name, used in log output. Defaults to the root
    /// component's name.
    pub name: Option<String>,
    /// Receives render errors instead of the log.
    pub error_handler: Option<ErrorHandler>,
}

impl AppConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name (builder).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the render error handler (builder).
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&crate::error::RenderError, &str) + 'static,
    ) -> Self {
        self.error_handler = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("name", &self.name)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The main application struct.
pub struct App<H: Host + 'static> {
    renderer: Renderer<H>,
    root: Rc<Component>,
    config: AppConfig,
    /// Container and root vnode while mounted.
    mounted: Option<(NodeId, VNode)>,
}

impl<H: Host + 'static> App<H> {
    /// Create an app rendering `root` into `host`.
    pub fn new(host: H, root: Rc<Component>) -> Self {
        Self {
            renderer: Renderer::new(host),
            root,
            config: AppConfig::default(),
            mounted: None,
        }
    }

    /// Replace the configuration (builder).
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.renderer.set_error_handler(config.error_handler.clone());
        self.config = config;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The configured name, or the root component's.
    pub fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(self.root.name())
    }

    /// Mount the root component into `container` and return its instance.
    ///
    /// Mounting an app that is already mounted logs a warning and returns
    /// the existing instance.
    pub fn mount(&mut self, container: NodeId) -> Option<Rc<ComponentInstance>> {
        if let Some((_, vnode)) = &self.mounted {
            tracing::warn!(app = self.name(), "app is already mounted");
            return vnode.component();
        }
        tracing::debug!(app = self.name(), "mount");
        let vnode = h(&self.root).build();
        self.renderer.render(Some(vnode.clone()), container);
        let instance = vnode.component();
        self.mounted = Some((container, vnode));
        instance
    }

    /// Unmount the root component. No-op when not mounted.
    pub fn unmount(&mut self) {
        if let Some((container, _)) = self.mounted.take() {
            tracing::debug!(app = self.name(), "unmount");
            self.renderer.render(None, container);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// The container the app is mounted into.
    pub fn container(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|(container, _)| *container)
    }

    /// The root component's instance while mounted.
    pub fn root_instance(&self) -> Option<Rc<ComponentInstance>> {
        self.mounted.as_ref().and_then(|(_, vnode)| vnode.component())
    }

    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        self.renderer.with_host(f)
    }

    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        self.renderer.with_host_mut(f)
    }
}

impl<H: Host + 'static> Drop for App<H> {
    /// Dropping a mounted app unmounts it, which stops every render effect
    /// in the tree.
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<H: Host + 'static> fmt::Debug for App<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name())
            .field("config", &self.config)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
