//! Virtual node types.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::shape::ShapeFlags;
use crate::component::{Component, ComponentInstance};
use crate::renderer::NodeId;
use crate::reactive::Value;

// ---------------------------------------------------------------------------
// VNodeType
// ---------------------------------------------------------------------------

/// What a virtual node describes.
#[derive(Clone)]
pub enum VNodeType {
    /// A host element with the given tag.
    Element(Rc<str>),
    /// A text node; the content is the node's text children.
    Text,
    /// A comment node; the content is the node's text children.
    Comment,
    /// A transparent group of children with no host node of its own.
    Fragment,
    Component(Rc<Component>),
}

impl VNodeType {
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNodeType::Element(tag) => Some(tag),
            _ => None,
        }
    }
}

impl PartialEq for VNodeType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Text, VNodeType::Text)
            | (VNodeType::Comment, VNodeType::Comment)
            | (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "<{tag}>"),
            VNodeType::Text => f.write_str("#text"),
            VNodeType::Comment => f.write_str("#comment"),
            VNodeType::Fragment => f.write_str("#fragment"),
            VNodeType::Component(c) => write!(f, "<{}/>", c.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<Rc<Component>> for VNodeType {
    fn from(component: Rc<Component>) -> Self {
        VNodeType::Component(component)
    }
}

impl From<&Rc<Component>> for VNodeType {
    fn from(component: &Rc<Component>) -> Self {
        VNodeType::Component(component.clone())
    }
}

impl From<Component> for VNodeType {
    fn from(component: Component) -> Self {
        VNodeType::Component(Rc::new(component))
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Identity of a child across renders of the same list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl From<i32> for Key {
    fn from(k: i32) -> Self {
        Key::Int(i64::from(k))
    }
}

impl From<i64> for Key {
    fn from(k: i64) -> Self {
        Key::Int(k)
    }
}

impl From<usize> for Key {
    fn from(k: usize) -> Self {
        Key::Int(i64::try_from(k).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(k: &str) -> Self {
        Key::Str(Rc::from(k))
    }
}

impl From<String> for Key {
    fn from(k: String) -> Self {
        Key::Str(Rc::from(k))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// An event delivered to an `on*` handler by the host.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name without the `on` prefix, lower-cased (`"click"`).
    pub name: String,
    /// The node the event was dispatched on.
    pub target: NodeId,
    pub payload: Value,
}

/// A callable prop. Compared by identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        EventHandler(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", self.addr())
    }
}

/// A prop value.
#[derive(Clone, Debug)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(h) => Some(h),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Int(i) => write!(f, "{i}"),
            PropValue::Float(x) => write!(f, "{x}"),
            PropValue::Str(s) => f.write_str(s),
            PropValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        PropValue::Int(i64::from(i))
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        PropValue::Int(i)
    }
}

impl From<f64> for PropValue {
    fn from(x: f64) -> Self {
        PropValue::Float(x)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(Rc::from(s))
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(Rc::from(s))
    }
}

impl From<EventHandler> for PropValue {
    fn from(h: EventHandler) -> Self {
        PropValue::Handler(h)
    }
}

/// Attribute/property/event-handler bag of an element.
pub type Props = IndexMap<String, PropValue>;

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

/// The children of a node.
#[derive(Clone, Debug, Default)]
pub enum Children {
    #[default]
    None,
    Text(Rc<str>),
    Array(Vec<VNode>),
}

impl Children {
    pub fn is_none(&self) -> bool {
        matches!(self, Children::None)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> &[VNode] {
        match self {
            Children::Array(nodes) => nodes,
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// VNode
// ---------------------------------------------------------------------------

/// An immutable node description. Cloning shares the node.
///
/// The reconciler fills in [`el`](Self::el) when the node is mounted and,
/// for component nodes, the owning [`ComponentInstance`].
#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeInner>,
}

struct VNodeInner {
    ty: VNodeType,
    props: Option<Props>,
    children: Children,
    key: Option<Key>,
    shape_flag: ShapeFlags,
    el: Cell<Option<NodeId>>,
    /// Closing host node of a fragment.
    anchor: Cell<Option<NodeId>>,
    component: RefCell<Option<Rc<ComponentInstance>>>,
}

impl VNode {
    pub(crate) fn from_parts(
        ty: VNodeType,
        props: Option<Props>,
        children: Children,
        key: Option<Key>,
    ) -> Self {
        // Fragments have no element of their own to hold text.
        let children = match (&ty, children) {
            (VNodeType::Fragment, Children::Text(text)) => Children::Array(vec![VNode::text(text)]),
            (_, children) => children,
        };
        let mut shape_flag = match &ty {
            VNodeType::Element(_) => ShapeFlags::ELEMENT,
            VNodeType::Component(c) if c.is_functional() => ShapeFlags::FUNCTIONAL_COMPONENT,
            VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            _ => ShapeFlags::NONE,
        };
        match &children {
            Children::Text(_) => shape_flag |= ShapeFlags::TEXT_CHILDREN,
            Children::Array(_) => shape_flag |= ShapeFlags::ARRAY_CHILDREN,
            Children::None => {}
        }
        Self {
            inner: Rc::new(VNodeInner {
                ty,
                props,
                children,
                key,
                shape_flag,
                el: Cell::new(None),
                anchor: Cell::new(None),
                component: RefCell::new(None),
            }),
        }
    }

    /// A text node.
    pub fn text(content: impl Into<Rc<str>>) -> Self {
        Self::from_parts(VNodeType::Text, None, Children::Text(content.into()), None)
    }

    /// A comment node.
    pub fn comment(content: impl Into<Rc<str>>) -> Self {
        Self::from_parts(VNodeType::Comment, None, Children::Text(content.into()), None)
    }

    /// A fragment over `children`.
    pub fn fragment(children: impl IntoIterator<Item = VNode>) -> Self {
        Self::from_parts(
            VNodeType::Fragment,
            None,
            Children::Array(children.into_iter().collect()),
            None,
        )
    }

    pub fn ty(&self) -> &VNodeType {
        &self.inner.ty
    }

    pub fn props(&self) -> Option<&Props> {
        self.inner.props.as_ref()
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.inner.props.as_ref().and_then(|props| props.get(name))
    }

    pub fn children(&self) -> &Children {
        &self.inner.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn shape_flag(&self) -> ShapeFlags {
        self.inner.shape_flag
    }

    /// Text content of a text or comment node.
    pub fn text_content(&self) -> &str {
        self.inner.children.as_text().unwrap_or_default()
    }

    /// The host node this vnode is mounted as. For a fragment, its opening
    /// anchor; for a component, its subtree's.
    pub fn el(&self) -> Option<NodeId> {
        self.inner.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<NodeId>) {
        self.inner.el.set(el);
    }

    /// The closing anchor of a mounted fragment. Fragment children always
    /// sit between [`el`](Self::el) and this node, even when there are none.
    pub fn anchor(&self) -> Option<NodeId> {
        self.inner.anchor.get()
    }

    pub(crate) fn set_anchor(&self, anchor: Option<NodeId>) {
        self.inner.anchor.set(anchor);
    }

    /// The component instance mounted for this vnode.
    pub fn component(&self) -> Option<Rc<ComponentInstance>> {
        self.inner.component.borrow().clone()
    }

    pub(crate) fn set_component(&self, instance: Option<Rc<ComponentInstance>>) {
        *self.inner.component.borrow_mut() = instance;
    }

    pub(crate) fn take_component(&self) -> Option<Rc<ComponentInstance>> {
        self.inner.component.borrow_mut().take()
    }

    /// Whether two handles are the same node.
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakVNode {
        WeakVNode {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [`VNode`]. Lets a component instance point back at
/// its vnode without keeping the vnode alive.
#[derive(Clone, Default)]
pub(crate) struct WeakVNode {
    inner: Weak<VNodeInner>,
}

impl WeakVNode {
    pub(crate) fn upgrade(&self) -> Option<VNode> {
        self.inner.upgrade().map(|inner| VNode { inner })
    }
}

/// Whether `a` and `b` describe the same node: equal type and equal key.
pub fn same_vnode_type(a: &VNode, b: &VNode) -> bool {
    a.ty() == b.ty() && a.key() == b.key()
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        VNode::text(s)
    }
}

impl From<String> for VNode {
    fn from(s: String) -> Self {
        VNode::text(s)
    }
}

impl PartialEq for VNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Hash for VNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        s.field("ty", &self.inner.ty);
        if let Some(key) = &self.inner.key {
            s.field("key", key);
        }
        match &self.inner.children {
            Children::None => {}
            Children::Text(t) => {
                s.field("text", t);
            }
            Children::Array(nodes) => {
                s.field("children", nodes);
            }
        }
        s.finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
