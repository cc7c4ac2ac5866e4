//! Headless testing helpers: Pilot, snapshot serialization.
//!
//! Use the [`Pilot`] to mount a component into an in-memory
//! [`Dom`](crate::dom::Dom) and drive it programmatically. Use [`to_html`] to
//! capture host trees as strings for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{outer_html, to_html};
