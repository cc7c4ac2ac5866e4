//! The reconciler.
//!
//! [`Renderer`] turns virtual trees into host nodes through the [`Host`]
//! trait and keeps them in sync on re-render. Child arrays are diffed by key
//! with a longest-increasing-subsequence pass so that only nodes which left
//! the stable order are moved.

mod children;
pub mod host;
pub mod lis;
mod patch;
pub mod props;

pub use host::{Host, NodeId};
pub use lis::get_sequence;
pub use patch::Renderer;
pub use props::{is_on, mount_props, patch_props};
