//! In-memory host: slotmap-backed node tree with an operation log.

pub mod node;
pub mod tree;

pub use node::{NodeData, NodeId, NodeKind};
pub use tree::{Dom, HostOp};
