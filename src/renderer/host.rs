//! The contract between the reconciler and a concrete node tree.

use slotmap::new_key_type;

use crate::vnode::PropValue;

new_key_type! {
    /// Handle to a host node. Copy, lightweight (u64).
    ///
    /// Hosts mint these from their own `SlotMap<NodeId, _>`; the reconciler
    /// only stores and passes them back.
    pub struct NodeId;
}

/// Node operations the reconciler needs from a host environment.
///
/// The reconciler never checks that ids passed back in are valid; a host may
/// treat unknown ids however it likes.
pub trait Host {
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text(&mut self, text: &str) -> NodeId;

    fn create_comment(&mut self, text: &str) -> NodeId;

    /// Replace every child of `el` with `text`.
    fn set_element_text(&mut self, el: NodeId, text: &str);

    /// Set the content of a text or comment node.
    fn set_text(&mut self, node: NodeId, text: &str);

    /// Insert `child` into `parent` before `anchor`, or at the end.
    ///
    /// A node that is already attached somewhere is moved.
    fn insert(&mut self, child: NodeId, parent: NodeId, anchor: Option<NodeId>);

    /// Detach `child` from its parent.
    fn remove(&mut self, child: NodeId);

    /// Apply one prop change. `next == None` clears the prop.
    fn patch_prop(
        &mut self,
        el: NodeId,
        key: &str,
        prev: Option<&PropValue>,
        next: Option<&PropValue>,
    );

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
}

// ===========================================================================
// Tests
// ===========================================================================
