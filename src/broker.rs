//! Broker seam: application-wide events components can subscribe to.
//!
//! The runtime only needs subscribe and unsubscribe; components bind their
//! [`Declared::broker`](crate::component::Declared::broker) handlers when
//! constructed and drop them on unmount. [`EmitterBroker`] is a plain
//! in-process implementation.

use crate::core::context::Context;
use crate::core::emitter::{Emission, Emitter, Handler, HandlerId};
use crate::markup::Arg;

/// Identifies one broker subscription.
pub type SubscriptionId = HandlerId;

/// A publish/subscribe hub shared by all components of a context.
pub trait Broker {
    fn subscribe(&self, event: &str, handler: Handler) -> SubscriptionId;

    /// Returns whether the subscription existed.
    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool;

    /// Deliver an event to its subscribers. Returns whether anyone listened.
    fn send(&self, cx: &Context, event: &str, params: Vec<Arg>) -> bool;
}

/// A [`Broker`] backed by an [`Emitter`].
#[derive(Debug, Default)]
pub struct EmitterBroker {
    emitter: Emitter,
}

impl EmitterBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.emitter.listener_count(event)
    }
}

impl Broker for EmitterBroker {
    fn subscribe(&self, event: &str, handler: Handler) -> SubscriptionId {
        self.emitter.on_handler(event, handler)
    }

    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        self.emitter.off(event, id)
    }

    fn send(&self, cx: &Context, event: &str, params: Vec<Arg>) -> bool {
        tracing::trace!(event, "broker send");
        self.emitter.emit(cx, &Emission::new(event, params))
    }
}
