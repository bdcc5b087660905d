//! Reactive cells.
//!
//! - [`State`]: observable cell over a dynamic value.
//! - [`Subscriber`]: a component or callback listening to a cell.
//! - [`Observable`]: keyed get/set/subscribe interface.

pub mod listener;
pub mod state;

pub use listener::{Callback, ListenerKey, Subscriber};
pub use state::{Observable, State, StateChange, StateId};
