//! The patch engine: mount, update and unmount of virtual trees.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use super::host::{Host, NodeId};
use super::props::{mount_props, patch_props};
use crate::component::{ComponentInstance, LifecycleHook};
use crate::error::{ErrorHandler, RenderError};
use crate::reactive::ReactiveEffect;
use crate::scheduler::{queue_job, Job};
use crate::vnode::{same_vnode_type, Children, VNode, VNodeType};

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Reconciles virtual trees against a [`Host`].
///
/// Cloning yields another handle to the same renderer. The host is owned by
/// the renderer and lent out through [`with_host`](Self::with_host) /
/// [`with_host_mut`](Self::with_host_mut).
pub struct Renderer<H: Host + 'static> {
    inner: Rc<RendererInner<H>>,
}

struct RendererInner<H> {
    host: RefCell<H>,
    /// Last tree rendered into each container.
    roots: RefCell<FxHashMap<NodeId, VNode>>,
    error_handler: RefCell<Option<ErrorHandler>>,
}

pub(crate) struct WeakRenderer<H: Host + 'static> {
    inner: Weak<RendererInner<H>>,
}

impl<H: Host + 'static> WeakRenderer<H> {
    pub(crate) fn upgrade(&self) -> Option<Renderer<H>> {
        self.inner.upgrade().map(|inner| Renderer { inner })
    }
}

impl<H: Host + 'static> Clone for WeakRenderer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host + 'static> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: Host + 'static> fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("roots", &self.inner.roots.borrow().len())
            .field("error_handler", &self.inner.error_handler.borrow().is_some())
            .finish()
    }
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                host: RefCell::new(host),
                roots: RefCell::new(FxHashMap::default()),
                error_handler: RefCell::new(None),
            }),
        }
    }

    /// Route render errors to `handler` instead of the log (builder).
    pub fn with_error_handler(self, handler: ErrorHandler) -> Self {
        self.set_error_handler(Some(handler));
        self
    }

    pub fn set_error_handler(&self, handler: Option<ErrorHandler>) {
        *self.inner.error_handler.borrow_mut() = handler;
    }

    /// Borrow the host immutably.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> R {
        f(&self.inner.host.borrow())
    }

    /// Borrow the host mutably. Must not be called from inside a render.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.inner.host.borrow_mut())
    }

    /// Render `vnode` into `container`, patching against whatever was
    /// rendered there before. `None` unmounts the container's tree.
    pub fn render(&self, vnode: Option<VNode>, container: NodeId) {
        let previous = self.inner.roots.borrow().get(&container).cloned();
        match vnode {
            Some(vnode) => {
                self.patch(previous.as_ref(), &vnode, container, None);
                self.inner.roots.borrow_mut().insert(container, vnode);
            }
            None => {
                if let Some(previous) = previous {
                    self.unmount(&previous, true);
                }
                self.inner.roots.borrow_mut().remove(&container);
            }
        }
    }

    /// The tree last rendered into `container`.
    pub fn root(&self, container: NodeId) -> Option<VNode> {
        self.inner.roots.borrow().get(&container).cloned()
    }

    pub(crate) fn downgrade(&self) -> WeakRenderer<H> {
        WeakRenderer {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn host(&self) -> RefMut<'_, H> {
        self.inner.host.borrow_mut()
    }

    pub(crate) fn report(&self, error: &RenderError, component: &str) {
        let handler = self.inner.error_handler.borrow().clone();
        match handler {
            Some(handler) => handler(error, component),
            None => tracing::error!(component, %error, "render failed"),
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Reconcile `n1` (previous, if any) into `n2` inside `container`.
    pub(crate) fn patch(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        let mut n1 = n1;
        let mut anchor = anchor;
        if let Some(old) = n1 {
            if old.ptr_eq(n2) {
                return;
            }
            if !same_vnode_type(old, n2) {
                anchor = self.anchor_after(old, anchor);
                self.unmount(old, true);
                n1 = None;
            }
        }

        match n2.ty() {
            VNodeType::Text => self.process_text(n1, n2, container, anchor),
            VNodeType::Comment => self.process_comment(n1, n2, container, anchor),
            VNodeType::Fragment => self.process_fragment(n1, n2, container, anchor),
            VNodeType::Element(_) => self.process_element(n1, n2, container, anchor),
            VNodeType::Component(_) => self.process_component(n1, n2, container, anchor),
        }
    }

    fn process_text(&self, n1: Option<&VNode>, n2: &VNode, container: NodeId, anchor: Option<NodeId>) {
        match n1 {
            None => {
                let el = self.host().create_text(n2.text_content());
                n2.set_el(Some(el));
                self.host().insert(el, container, anchor);
            }
            Some(old) => {
                n2.set_el(old.el());
                if let Some(el) = old.el() {
                    if old.text_content() != n2.text_content() {
                        self.host().set_text(el, n2.text_content());
                    }
                }
            }
        }
    }

    fn process_comment(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        match n1 {
            None => {
                let el = self.host().create_comment(n2.text_content());
                n2.set_el(Some(el));
                self.host().insert(el, container, anchor);
            }
            Some(old) => {
                n2.set_el(old.el());
                if let Some(el) = old.el() {
                    if old.text_content() != n2.text_content() {
                        self.host().set_text(el, n2.text_content());
                    }
                }
            }
        }
    }

    fn process_fragment(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        match n1 {
            None => {
                let (start, end) = {
                    let mut host = self.host();
                    let (start, end) = (host.create_text(""), host.create_text(""));
                    host.insert(start, container, anchor);
                    host.insert(end, container, anchor);
                    (start, end)
                };
                n2.set_el(Some(start));
                n2.set_anchor(Some(end));
                self.mount_children(n2.children().as_slice(), container, Some(end));
            }
            Some(old) => {
                n2.set_el(old.el());
                n2.set_anchor(old.anchor());
                self.patch_children(old, n2, container, old.anchor());
            }
        }
    }

    fn process_element(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        match n1 {
            None => self.mount_element(n2, container, anchor),
            Some(old) => self.patch_element(old, n2),
        }
    }

    fn mount_element(&self, vnode: &VNode, container: NodeId, anchor: Option<NodeId>) {
        let tag = vnode.ty().tag().unwrap_or_default();
        let el = self.host().create_element(tag);
        vnode.set_el(Some(el));

        match vnode.children() {
            Children::Text(text) => self.host().set_element_text(el, text),
            Children::Array(children) => self.mount_children(children, el, None),
            Children::None => {}
        }
        mount_props(&mut *self.host(), el, vnode.props());
        self.host().insert(el, container, anchor);
    }

    fn patch_element(&self, n1: &VNode, n2: &VNode) {
        let Some(el) = n1.el() else {
            tracing::warn!(node = ?n1.ty(), "patching an element that was never mounted");
            return;
        };
        n2.set_el(Some(el));
        patch_props(&mut *self.host(), el, n1.props(), n2.props());
        self.patch_children(n1, n2, el, None);
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    fn process_component(
        &self,
        n1: Option<&VNode>,
        n2: &VNode,
        container: NodeId,
        anchor: Option<NodeId>,
    ) {
        match n1 {
            None => self.mount_component(n2, container, anchor),
            Some(old) => {
                // The instance re-renders from its own effect; only ownership moves.
                let instance = old.take_component();
                if let Some(instance) = &instance {
                    instance.set_vnode(Some(n2));
                }
                n2.set_component(instance);
                n2.set_el(old.el());
            }
        }
    }

    fn mount_component(&self, vnode: &VNode, container: NodeId, anchor: Option<NodeId>) {
        let VNodeType::Component(definition) = vnode.ty() else {
            return;
        };
        let instance = ComponentInstance::new(vnode, definition.clone());
        tracing::debug!(component = instance.name(), uid = instance.uid(), "mount component");
        vnode.set_component(Some(instance.clone()));
        instance.set_container(container);
        instance.setup();
        self.setup_render_effect(&instance, anchor);
    }

    /// Wrap the instance's render in an effect whose re-runs go through the
    /// batching scheduler, then run it once to mount.
    fn setup_render_effect(&self, instance: &Rc<ComponentInstance>, anchor: Option<NodeId>) {
        let renderer = self.downgrade();
        let weak = Rc::downgrade(instance);

        let effect = ReactiveEffect::with_scheduler(
            {
                let weak = weak.clone();
                move || {
                    if let (Some(instance), Some(renderer)) = (weak.upgrade(), renderer.upgrade()) {
                        renderer.update_component(&instance, anchor);
                    }
                }
            },
            {
                let weak = weak.clone();
                move || {
                    if let Some(job) = weak.upgrade().and_then(|instance| instance.update_job()) {
                        queue_job(job);
                    }
                }
            },
        );
        instance.set_effect(effect.clone());
        instance.set_update(Job::new(move || {
            if let Some(instance) = weak.upgrade() {
                instance.force_update();
            }
        }));
        effect.run();
    }

    /// Body of a component's render effect.
    fn update_component(&self, instance: &Rc<ComponentInstance>, mount_anchor: Option<NodeId>) {
        if !instance.is_mounted() {
            instance.call_hooks(LifecycleHook::BeforeMount);
            let subtree = match instance.render_root() {
                Ok(subtree) => subtree,
                Err(error) => {
                    instance.retain_render_deps();
                    return self.report(&error, instance.name());
                }
            };
            instance.record_render_deps();
            let Some(container) = instance.container() else {
                return;
            };
            self.patch(None, &subtree, container, mount_anchor);
            if let Some(vnode) = instance.vnode() {
                vnode.set_el(subtree.el());
            }
            instance.set_subtree(Some(subtree));
            instance.set_mounted(true);
            instance.call_hooks(LifecycleHook::Mounted);
        } else {
            let next = match instance.render_root() {
                Ok(next) => next,
                Err(error) => {
                    instance.retain_render_deps();
                    return self.report(&error, instance.name());
                }
            };
            instance.record_render_deps();
            instance.call_hooks(LifecycleHook::BeforeUpdate);
            let prev = instance.subtree();
            let first = prev.as_ref().and_then(|prev| self.first_host_node(prev));
            let container = first
                .and_then(|first| self.inner.host.borrow().parent_node(first))
                .or_else(|| instance.container());
            let Some(container) = container else {
                return;
            };
            let anchor = match &prev {
                Some(prev) => self.anchor_after(prev, None),
                None => None,
            };
            tracing::trace!(component = instance.name(), "update component");
            self.patch(prev.as_ref(), &next, container, anchor);
            if let Some(vnode) = instance.vnode() {
                vnode.set_el(next.el());
            }
            instance.set_subtree(Some(next));
            instance.call_hooks(LifecycleHook::Updated);
        }
    }

    // -----------------------------------------------------------------------
    // Unmount / move
    // -----------------------------------------------------------------------

    /// Tear down `vnode`. Host nodes are removed only when `do_remove`;
    /// descendants of a removed element go with it.
    pub(crate) fn unmount(&self, vnode: &VNode, do_remove: bool) {
        match vnode.ty() {
            VNodeType::Component(_) => {
                let Some(instance) = vnode.take_component() else {
                    return;
                };
                tracing::debug!(component = instance.name(), uid = instance.uid(), "unmount component");
                instance.stop();
                if let Some(subtree) = instance.subtree() {
                    self.unmount(&subtree, do_remove);
                }
                instance.set_subtree(None);
                instance.set_vnode(None);
                instance.set_mounted(false);
                instance.call_hooks(LifecycleHook::Unmounted);
            }
            VNodeType::Fragment => {
                for child in vnode.children().as_slice() {
                    self.unmount(child, do_remove);
                }
                if do_remove {
                    let mut host = self.host();
                    for edge in [vnode.el(), vnode.anchor()].into_iter().flatten() {
                        host.remove(edge);
                    }
                }
            }
            VNodeType::Element(_) => {
                for child in vnode.children().as_slice() {
                    self.unmount(child, false);
                }
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.host().remove(el);
                    }
                }
            }
            VNodeType::Text | VNodeType::Comment => {
                if do_remove {
                    if let Some(el) = vnode.el() {
                        self.host().remove(el);
                    }
                }
            }
        }
    }

    /// Move every host node of `vnode` before `anchor`.
    pub(crate) fn move_node(&self, vnode: &VNode, container: NodeId, anchor: Option<NodeId>) {
        let nodes = self.host_nodes(vnode);
        tracing::debug!(nodes = nodes.len(), "move");
        let mut host = self.host();
        for node in nodes {
            host.insert(node, container, anchor);
        }
    }

    // -----------------------------------------------------------------------
    // Host node helpers
    // -----------------------------------------------------------------------

    /// Top-level host nodes of `vnode`, in order.
    pub(crate) fn host_nodes(&self, vnode: &VNode) -> Vec<NodeId> {
        let mut out = Vec::new();
        collect_host_nodes(vnode, &mut out);
        out
    }

    pub(crate) fn first_host_node(&self, vnode: &VNode) -> Option<NodeId> {
        self.host_nodes(vnode).first().copied()
    }

    /// The host node right after `vnode`'s last host node. Falls back to
    /// `fallback` when `vnode` has no host nodes.
    pub(crate) fn anchor_after(&self, vnode: &VNode, fallback: Option<NodeId>) -> Option<NodeId> {
        match self.host_nodes(vnode).last() {
            Some(&last) => self.inner.host.borrow().next_sibling(last),
            None => fallback,
        }
    }
}

fn collect_host_nodes(vnode: &VNode, out: &mut Vec<NodeId>) {
    match vnode.ty() {
        VNodeType::Fragment => {
            out.extend(vnode.el());
            for child in vnode.children().as_slice() {
                collect_host_nodes(child, out);
            }
            out.extend(vnode.anchor());
        }
        VNodeType::Component(_) => {
            if let Some(subtree) = vnode.component().and_then(|instance| instance.subtree()) {
                collect_host_nodes(&subtree, out);
            }
        }
        _ => out.extend(vnode.el()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, HostOp};
    use crate::testing::snapshot::to_html;
    use crate::vnode::h;
    use pretty_assertions::assert_eq;

    fn setup() -> (Renderer<Dom>, NodeId) {
        let mut dom = Dom::new();
        let root = dom.create_container("root");
        (Renderer::new(dom), root)
    }

    fn html(renderer: &Renderer<Dom>, root: NodeId) -> String {
        renderer.with_host(|dom| to_html(dom, root))
    }

    fn take_ops(renderer: &Renderer<Dom>) -> Vec<HostOp> {
        renderer.with_host_mut(Dom::take_ops)
    }

    // ── Mount ───────────────────────────────────────────────────────

    #[test]
    fn mounts_element_tree() {
        let (renderer, root) = setup();
        let tree = h("div")
            .prop("id", "app")
            .child(h("p").text("hello"))
            .child("world")
            .build();
        renderer.render(Some(tree), root);
        assert_eq!(html(&renderer, root), r#"<div id="app"><p>hello</p>world</div>"#);
    }

    #[test]
    fn mount_sets_el() {
        let (renderer, root) = setup();
        let tree = h("div").build();
        renderer.render(Some(tree.clone()), root);
        let el = tree.el().expect("mounted");
        assert_eq!(renderer.with_host(|dom| dom.parent(el)), Some(root));
    }

    #[test]
    fn fragment_mounts_children_into_container() {
        let (renderer, root) = setup();
        let tree = VNode::fragment([h("a").build(), h("b").build()]);
        renderer.render(Some(tree.clone()), root);
        assert_eq!(html(&renderer, root), "<a></a><b></b>");
        let first = renderer.with_host(|dom| dom.children(root)[0]);
        assert_eq!(tree.el(), Some(first));
    }

    #[test]
    fn comment_renders() {
        let (renderer, root) = setup();
        renderer.render(Some(VNode::comment("note")), root);
        assert_eq!(html(&renderer, root), "<!--note-->");
    }

    // ── Patch ───────────────────────────────────────────────────────

    #[test]
    fn identical_vnode_is_noop() {
        let (renderer, root) = setup();
        let tree = h("div").text("x").build();
        renderer.render(Some(tree.clone()), root);
        take_ops(&renderer);
        renderer.render(Some(tree), root);
        assert!(take_ops(&renderer).is_empty());
    }

    #[test]
    fn text_patch_only_when_changed() {
        let (renderer, root) = setup();
        renderer.render(Some(VNode::text("a")), root);
        take_ops(&renderer);
        renderer.render(Some(VNode::text("a")), root);
        assert!(take_ops(&renderer).is_empty());
        renderer.render(Some(VNode::text("b")), root);
        let ops = take_ops(&renderer);
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], HostOp::SetText { text, .. } if text == "b"));
    }

    #[test]
    fn different_type_replaces_in_place() {
        let (renderer, root) = setup();
        renderer.render(
            Some(VNode::fragment([h("div").key(1).build(), h("i").build()])),
            root,
        );
        renderer.render(
            Some(VNode::fragment([h("span").key(1).build(), h("i").build()])),
            root,
        );
        assert_eq!(html(&renderer, root), "<span></span><i></i>");
    }

    #[test]
    fn props_are_diffed() {
        let (renderer, root) = setup();
        renderer.render(
            Some(h("div").prop("id", "a").prop("title", "t").build()),
            root,
        );
        take_ops(&renderer);
        renderer.render(Some(h("div").prop("id", "b").build()), root);
        let keys: Vec<_> = take_ops(&renderer)
            .into_iter()
            .filter_map(|op| match op {
                HostOp::PatchProp { key, value, .. } => Some((key, value.is_some())),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![("id".to_owned(), true), ("title".to_owned(), false)]);
    }

    #[test]
    fn element_keeps_host_node_across_patches() {
        let (renderer, root) = setup();
        let first = h("div").text("a").build();
        renderer.render(Some(first.clone()), root);
        let second = h("div").text("b").build();
        renderer.render(Some(second.clone()), root);
        assert_eq!(first.el(), second.el());
        assert_eq!(html(&renderer, root), "<div>b</div>");
    }

    // ── Unmount ─────────────────────────────────────────────────────

    #[test]
    fn render_none_unmounts() {
        let (renderer, root) = setup();
        renderer.render(Some(h("div").child(h("span")).build()), root);
        take_ops(&renderer);
        renderer.render(None, root);
        assert_eq!(html(&renderer, root), "");
        // Only the topmost host node is removed.
        assert_eq!(take_ops(&renderer).len(), 1);
        assert!(renderer.root(root).is_none());
    }

    #[test]
    fn fragment_unmount_removes_each_child() {
        let (renderer, root) = setup();
        renderer.render(Some(VNode::fragment([VNode::text("a"), VNode::text("b")])), root);
        take_ops(&renderer);
        renderer.render(None, root);
        let ops = take_ops(&renderer);
        // Both children plus the two anchors.
        assert_eq!(ops.iter().filter(|op| op.is_remove()).count(), 4);
        assert!(renderer.with_host(|dom| dom.children(root).is_empty()));
    }

    #[test]
    fn fragment_patch_appends_after_itself() {
        let (renderer, root) = setup();
        renderer.render(
            Some(h("div").child(VNode::fragment([VNode::text("a")])).child(h("hr")).build()),
            root,
        );
        renderer.render(
            Some(
                h("div")
                    .child(VNode::fragment([VNode::text("a"), VNode::text("b")]))
                    .child(h("hr"))
                    .build(),
            ),
            root,
        );
        assert_eq!(html(&renderer, root), "<div>ab<hr></hr></div>");
    }

    #[test]
    fn empty_fragment_fills_in_place() {
        let (renderer, root) = setup();
        renderer.render(
            Some(h("div").child(VNode::fragment([])).child(h("hr")).build()),
            root,
        );
        renderer.render(
            Some(h("div").child(VNode::fragment([VNode::text("a")])).child(h("hr")).build()),
            root,
        );
        assert_eq!(html(&renderer, root), "<div>a<hr></hr></div>");
    }

    #[test]
    fn emptied_fragment_keeps_its_slot() {
        let (renderer, root) = setup();
        let fragment = |texts: &[&str]| VNode::fragment(texts.iter().map(|&text| VNode::text(text)));
        let tree = |texts: &[&str]| {
            h("div")
                .child(h("b"))
                .child(fragment(texts))
                .child(h("hr"))
                .build()
        };
        renderer.render(Some(tree(&["a"])), root);
        renderer.render(Some(tree(&[])), root);
        renderer.render(Some(tree(&["x", "y"])), root);
        assert_eq!(html(&renderer, root), "<div><b></b>xy<hr></hr></div>");
    }
}
