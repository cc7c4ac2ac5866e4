//! # sprig
//!
//! A fine-grained reactive UI runtime: dependency tracking, batched updates
//! and keyed virtual-tree reconciliation.
//!
//! ## Core Systems
//!
//! - **[`reactive`]** - Reactive objects, refs, computeds, effects and watchers
//! - **[`scheduler`]** - Deduplicated job queue flushed once per tick
//! - **[`vnode`]** - Virtual nodes and the `h` builder
//! - **[`renderer`]** - Host contract, patch engine, keyed diff with LIS
//! - **[`component`]** - Component definitions, instances, lifecycle hooks
//! - **[`dom`]** - Slotmap-backed in-memory host with an operation log
//! - **[`app`]** - Application struct tying everything together
//! - **[`testing`]** - Headless pilot and snapshot helpers

// Reactivity
pub mod reactive;
pub mod scheduler;

// Virtual tree and reconciliation
pub mod renderer;
pub mod vnode;

// Components
pub mod component;
pub mod error;

// Hosts
pub mod dom;

// Application
pub mod app;
pub mod testing;
