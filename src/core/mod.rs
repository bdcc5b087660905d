//! Runtime core: the context, the repository, events and services.

pub mod container;
pub mod context;
pub mod emitter;
pub mod repository;

pub use container::{Container, Lifetime, BROKER_SERVICE, RESET_SERVICE};
pub use context::Context;
pub use emitter::{Emission, Emitter, Handler, HandlerId};
pub use repository::{DisposeHook, EventHandler, NodeMethod, Repository};
