//! Components: definitions, instances, lifecycle hooks.
//!
//! The render effect that drives an instance's update cycle is set up by the
//! [`Renderer`](crate::renderer::Renderer) when the component is mounted.

pub mod definition;
pub mod instance;
pub mod lifecycle;

pub use definition::{render_fn, Component, RenderFn};
pub use instance::{ComponentInstance, RenderContext};
pub use lifecycle::{
    current_instance, on_before_mount, on_before_update, on_mounted, on_unmounted, on_updated,
    Hook, Hooks, LifecycleHook,
};
