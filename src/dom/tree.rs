//! In-memory host tree with an operation log.

use std::collections::VecDeque;
use std::fmt;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId, NodeKind};
use crate::renderer::Host;
use crate::vnode::{EventHandler, PropValue};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

// ---------------------------------------------------------------------------
// HostOp
// ---------------------------------------------------------------------------

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Create { node: NodeId, kind: NodeKind },
    /// A detached node was attached.
    Insert { node: NodeId, parent: NodeId, anchor: Option<NodeId> },
    /// An attached node was moved.
    Move { node: NodeId, parent: NodeId, anchor: Option<NodeId> },
    Remove { node: NodeId },
    SetText { node: NodeId, text: String },
    SetElementText { node: NodeId, text: String },
    PatchProp { node: NodeId, key: String, value: Option<PropValue> },
}

impl HostOp {
    /// The node the operation applies to.
    pub fn node(&self) -> NodeId {
        match self {
            HostOp::Create { node, .. }
            | HostOp::Insert { node, .. }
            | HostOp::Move { node, .. }
            | HostOp::Remove { node }
            | HostOp::SetText { node, .. }
            | HostOp::SetElementText { node, .. }
            | HostOp::PatchProp { node, .. } => *node,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, HostOp::Move { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, HostOp::Insert { .. })
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, HostOp::Remove { .. })
    }
}

// ---------------------------------------------------------------------------
// Dom
// ---------------------------------------------------------------------------

/// A slotmap-backed node tree implementing [`Host`].
///
/// Parent/child relationships are stored in secondary maps so that node
/// removal is O(subtree size) and lookup is O(1). Every mutation made through
/// the [`Host`] interface is appended to an operation log.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    ops: Vec<HostOp>,
}

impl Dom {
    /// Create an empty DOM.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            ops: Vec::new(),
        }
    }

    /// Create a detached element to mount into. Not logged.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::element(tag))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }
    }

    /// Free `id` and all its descendants.
    fn free_subtree(&mut self, id: NodeId) {
        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            self.nodes.remove(current);
        }
    }

    fn known(&self, id: NodeId, op: &str) -> bool {
        let known = self.nodes.contains_key(id);
        if !known {
            tracing::warn!(node = ?id, op, "unknown host node");
        }
        known
    }

    // -- Inspection ---------------------------------------------------------

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no
    /// children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Concatenated text of `id` and all its descendants, in tree order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.walk_depth_first(id) {
            if let Some(data) = self.nodes.get(node) {
                if data.kind != NodeKind::Comment {
                    out.push_str(&data.text);
                }
            }
        }
        out
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    // -- Queries ------------------------------------------------------------

    /// First node under `root` (inclusive) matching a simple selector:
    /// `#id`, `.class` or a tag name.
    pub fn query(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.query_all(root, selector).into_iter().next()
    }

    /// Every node under `root` (inclusive, tree order) matching `selector`.
    pub fn query_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .filter(|id| {
                self.nodes.get(*id).is_some_and(|data| {
                    if let Some(id) = selector.strip_prefix('#') {
                        data.id() == Some(id)
                    } else if let Some(class) = selector.strip_prefix('.') {
                        data.has_class(class)
                    } else {
                        data.tag() == Some(selector)
                    }
                })
            })
            .collect()
    }

    // -- Events -------------------------------------------------------------

    /// Handlers for `event` on `target` and its ancestors, innermost first.
    ///
    /// Handlers are cloned out so they can be called without borrowing the
    /// tree.
    pub fn handlers_for(&self, target: NodeId, event: &str) -> Vec<EventHandler> {
        let key = handler_key(event);
        std::iter::once(target)
            .chain(self.ancestors(target))
            .filter_map(|id| self.nodes.get(id))
            .filter_map(|data| data.prop(&key).and_then(PropValue::as_handler).cloned())
            .collect()
    }

    // -- Operation log ------------------------------------------------------

    /// Recorded operations since the last [`take_ops`](Self::take_ops).
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.nodes.len())
            .field("ops", &self.ops.len())
            .finish()
    }
}

fn handler_key(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => String::from("on"),
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

impl Host for Dom {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.alloc(NodeData::element(tag));
        self.ops.push(HostOp::Create {
            node: id,
            kind: NodeKind::Element(tag.to_owned()),
        });
        id
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeData::text(text));
        self.ops.push(HostOp::Create {
            node: id,
            kind: NodeKind::Text,
        });
        id
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeData::comment(text));
        self.ops.push(HostOp::Create {
            node: id,
            kind: NodeKind::Comment,
        });
        id
    }

    fn set_element_text(&mut self, el: NodeId, text: &str) {
        if !self.known(el, "set_element_text") {
            return;
        }
        let kids = self.children.get_mut(el).map(std::mem::take).unwrap_or_default();
        for kid in kids {
            self.parent.remove(kid);
            self.free_subtree(kid);
        }
        if let Some(data) = self.nodes.get_mut(el) {
            data.text = text.to_owned();
        }
        self.ops.push(HostOp::SetElementText {
            node: el,
            text: text.to_owned(),
        });
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.known(node, "set_text") {
            return;
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.text = text.to_owned();
        }
        self.ops.push(HostOp::SetText {
            node,
            text: text.to_owned(),
        });
    }

    fn insert(&mut self, child: NodeId, parent: NodeId, anchor: Option<NodeId>) {
        if !self.known(child, "insert") || !self.known(parent, "insert") {
            return;
        }
        let moved = self.parent.contains_key(child);
        self.detach(child);
        let Some(siblings) = self.children.get_mut(parent) else {
            return;
        };
        let index = anchor
            .and_then(|anchor| siblings.iter().position(|&s| s == anchor))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.parent.insert(child, parent);
        if let Some(data) = self.nodes.get_mut(parent) {
            // Attaching children replaces any text content.
            data.text.clear();
        }
        self.ops.push(if moved {
            HostOp::Move { node: child, parent, anchor }
        } else {
            HostOp::Insert { node: child, parent, anchor }
        });
    }

    fn remove(&mut self, child: NodeId) {
        if !self.known(child, "remove") {
            return;
        }
        self.detach(child);
        self.free_subtree(child);
        self.ops.push(HostOp::Remove { node: child });
    }

    fn patch_prop(
        &mut self,
        el: NodeId,
        key: &str,
        _prev: Option<&PropValue>,
        next: Option<&PropValue>,
    ) {
        if !self.known(el, "patch_prop") {
            return;
        }
        if let Some(data) = self.nodes.get_mut(el) {
            match next {
                Some(value) => {
                    data.props.insert(key.to_owned(), value.clone());
                }
                None => {
                    data.props.shift_remove(key);
                }
            }
        }
        self.ops.push(HostOp::PatchProp {
            node: el,
            key: key.to_owned(),
            value: next.cloned(),
        });
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&s| s == node)?;
        siblings.get(index + 1).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
