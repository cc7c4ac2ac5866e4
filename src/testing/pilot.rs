//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` mounts a root component into an in-memory [`Dom`] and provides
//! methods to dispatch events, flush pending updates and inspect the rendered
//! tree.

use std::rc::Rc;

use crate::app::{App, AppConfig};
use crate::component::{Component, ComponentInstance};
use crate::dom::{Dom, HostOp, NodeId};
use crate::reactive::Value;
use crate::scheduler;
use crate::vnode::Event;

use super::snapshot::to_html;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// # Examples
///
/// ```ignore
/// use sprig::testing::Pilot;
///
/// let pilot = Pilot::new(counter);
/// pilot.click("button");
/// pilot.tick();
/// assert_eq!(pilot.text("p").as_deref(), Some("1"));
/// ```
pub struct Pilot {
    app: App<Dom>,
    container: NodeId,
}

impl Pilot {
    /// Mount `root` into a fresh container.
    pub fn new(root: Rc<Component>) -> Self {
        Self::with_config(root, AppConfig::default())
    }

    /// Mount `root` with the given configuration.
    pub fn with_config(root: Rc<Component>, config: AppConfig) -> Self {
        let mut dom = Dom::new();
        let container = dom.create_container("app");
        let mut app = App::new(dom, root).with_config(config);
        app.mount(container);
        Self { app, container }
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Dispatch `event` on the first node matching `selector`, bubbling to
    /// its ancestors. Returns `false` when nothing matches.
    pub fn dispatch(&self, selector: &str, event: &str, payload: impl Into<Value>) -> bool {
        let Some(target) = self.query(selector) else {
            return false;
        };
        // Handlers run outside the host borrow; they may trigger renders.
        let handlers = self.app.with_host(|dom| dom.handlers_for(target, event));
        let event = Event {
            name: event.to_owned(),
            target,
            payload: payload.into(),
        };
        for handler in handlers {
            handler.call(&event);
        }
        true
    }

    /// Dispatch a `click` with no payload.
    pub fn click(&self, selector: &str) -> bool {
        self.dispatch(selector, "click", Value::Null)
    }

    /// Dispatch an `input` carrying `value`.
    pub fn input(&self, selector: &str, value: impl Into<Value>) -> bool {
        self.dispatch(selector, "input", value)
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Run every queued update now.
    pub fn tick(&self) {
        scheduler::flush_jobs();
    }

    /// Await the scheduler's next flush.
    pub async fn next_tick(&self) {
        scheduler::next_tick().await;
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Borrow the underlying app immutably.
    pub fn app(&self) -> &App<Dom> {
        &self.app
    }

    /// Borrow the underlying app mutably.
    pub fn app_mut(&mut self) -> &mut App<Dom> {
        &mut self.app
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn root_instance(&self) -> Option<Rc<ComponentInstance>> {
        self.app.root_instance()
    }

    /// First node matching `selector` (`#id`, `.class` or a tag).
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.app.with_host(|dom| dom.query(self.container, selector))
    }

    /// Text content of the first node matching `selector`.
    pub fn text(&self, selector: &str) -> Option<String> {
        let node = self.query(selector)?;
        Some(self.app.with_host(|dom| dom.text_content(node)))
    }

    /// The mounted tree as HTML.
    pub fn html(&self) -> String {
        self.app.with_host(|dom| to_html(dom, self.container))
    }

    /// Drain the host operation log.
    pub fn take_ops(&self) -> Vec<HostOp> {
        self.app.with_host_mut(Dom::take_ops)
    }

    /// Unmount the app.
    pub fn unmount(&mut self) {
        self.app.unmount();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
