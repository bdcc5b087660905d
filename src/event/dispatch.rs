//! Event dispatch through the node listener side table.
//!
//! Each node carries at most one native listener per event type. When an
//! event reaches such a node, the native listener looks up the logical
//! handlers registered for that type in the repository and runs them in
//! registration order.

use crate::core::context::Context;
use crate::dom::{Dom, NodeId};
use crate::event::DomEvent;

/// The nodes an event visits: `start`, then its ancestors up to the root.
///
/// Empty if `start` is not a live node.
pub fn bubble_path(dom: &Dom, start: NodeId) -> Vec<NodeId> {
    if !dom.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(dom.ancestors(start));
    path
}

impl Context {
    /// Dispatch `event` on its target and bubble it up.
    ///
    /// Handler failures are logged and do not stop the remaining handlers.
    /// Returns the number of handlers that ran.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let path = bubble_path(&self.dom(), event.target);
        let mut ran = 0;
        for node in path {
            let attached = self.dom().has_event_listener(node, &event.event_type);
            if !attached {
                continue;
            }
            event.set_current_target(node);
            let handlers = self.repository().listeners(node, &event.event_type);
            for handler in handlers {
                ran += 1;
                if let Err(e) = handler(self, event) {
                    tracing::error!(event = %event.event_type, node = ?node, error = %e, "event handler failed");
                }
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        ran
    }
}

// ===========================================================================
// Tests
// ===========================================================================
