//! The event object handed to node listeners.

use std::cell::Cell;

use crate::dom::NodeId;
use crate::value::Value;

// ---------------------------------------------------------------------------
// DomEvent
// ---------------------------------------------------------------------------

/// A document event travelling from its target up through the ancestors.
///
/// Listeners receive it by shared reference; propagation state lives in
/// cells so any listener can stop the bubble.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Event type, e.g. `"click"`.
    pub event_type: String,
    /// The node the event was dispatched on.
    pub target: NodeId,
    /// Free-form payload.
    pub detail: Value,
    current_target: Cell<Option<NodeId>>,
    stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            detail: Value::Null,
            current_target: Cell::new(None),
            stopped: Cell::new(false),
        }
    }

    /// Attach a payload (builder).
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = detail.into();
        self
    }

    /// The node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(Some(node));
    }

    /// Stop the event after the listeners of the current node.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}
