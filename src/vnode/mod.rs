//! Virtual node tree: node descriptions, shape flags, the [`h`] builder.

pub mod builder;
pub mod node;
pub mod shape;

pub use builder::{h, VNodeBuilder};
pub use node::{
    same_vnode_type, Children, Event, EventHandler, Key, PropValue, Props, VNode, VNodeType,
};
pub use shape::ShapeFlags;

pub(crate) use node::WeakVNode;
