//! Components: addressable render units with a lifecycle.
//!
//! - [`Render`]: what a component type implements.
//! - [`Component`]: a live instance: id, emitter, subscribed cells.
//! - [`LifecycleEvent`]: the events an instance emits on its own.

#[allow(clippy::module_inception)]
pub mod component;
pub mod lifecycle;
pub mod render;
pub mod wrap;

pub use component::{Component, ComponentId};
pub use lifecycle::LifecycleEvent;
pub use render::{Declared, FnRender, ListenTarget, Render};
