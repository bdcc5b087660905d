//! Document events: the event object and bubbling dispatch.

pub mod dispatch;
pub mod dom_event;

pub use dispatch::bubble_path;
pub use dom_event::DomEvent;
