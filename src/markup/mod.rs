//! Markup builder: turns names and arguments into DOM nodes and component
//! instances.
//!
//! [`Context::handle`](crate::Context::handle) is the single entry point. A
//! name resolves to, in order: a registered component, a placeholder for a
//! capitalized name that is not registered yet, or a plain element.

pub mod arg;
pub mod attrs;
pub mod engine;

pub use arg::Arg;
pub use attrs::{Attrs, Placement};
pub use engine::{Markup, FRAGMENT_TAG, PLACEHOLDER_SUFFIX, SVG_PREFIX};
