//! Headless testing helpers: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a [`Context`](crate::Context) programmatically:
//! mount components into the body, dispatch events, drain deferred work. Use
//! [`tree_to_string`] and related helpers to capture subtrees as text for
//! snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{body_snapshot, masked_tree_to_string, tree_to_string};
