//! # openscript
//!
//! A reactive component runtime over a live, arena-backed document.
//!
//! Components render from declarative calls into real nodes, subscribe to the
//! observable cells they receive as arguments, and patch their markup in
//! place when those cells change.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: Observable cells with keyed patching and listener registries
//! - **[`core`]**: Runtime context, repository, emitter, service container
//! - **[`component`]**: Render trait, instances, lifecycle, the `wrap` pipeline
//! - **[`markup`]**: Markup builder: elements, attribute bags, placeholders
//! - **[`reconcile`]**: In-place diff-and-patch of two live subtrees
//! - **[`dispose`]**: Removal-driven disposal and the orphan sweep
//! - **[`dom`]**: Slotmap-backed document with selector queries
//! - **[`event`]**: Document events and bubbling dispatch
//! - **[`broker`]**: Application-wide publish/subscribe seam
//! - **[`testing`]**: Headless pilot and snapshot helpers
//!
//! ## Example
//!
//! ```
//! use openscript::{args, Arg, Attrs, Context};
//!
//! let cx = Context::new();
//! cx.register_fn("Counter", |cx, args| {
//!     let count = args.iter().find_map(Arg::as_state).cloned();
//!     let value = count.map(|c| c.get()).unwrap_or_default();
//!     cx.handle("span", &args![value])
//! });
//!
//! let count = cx.state(0);
//! let body = cx.body();
//! cx.handle("Counter", &args![&count, Attrs::new().parent(body)]).unwrap();
//! count.set(1);
//! assert!(cx.dom().inner_html(body).contains("<span>1</span>"));
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Document
pub mod dom;
pub mod selector;

// Runtime
pub mod core;
pub mod reactive;

// Components and markup
pub mod component;
pub mod markup;

// Updates and teardown
pub mod dispose;
pub mod reconcile;

// Events
pub mod broker;
pub mod event;

// Test support
pub mod testing;

pub use broker::{Broker, EmitterBroker, SubscriptionId};
pub use component::{Component, ComponentId, Declared, FnRender, LifecycleEvent, ListenTarget, Render};
pub use config::Config;
pub use crate::core::{Container, Context, Emission, Lifetime, BROKER_SERVICE, RESET_SERVICE};
pub use dom::{Dom, NodeId};
pub use error::{Error, Result};
pub use event::DomEvent;
pub use markup::{Arg, Attrs, Markup, Placement};
pub use reactive::{Observable, State, StateChange, StateId, Subscriber};
pub use value::{json, Value};

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use openscript_macros::html;
