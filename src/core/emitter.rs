//! Named-event emitter used by components and the default broker.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::component::component::ComponentInner;
use crate::component::Component;
use crate::core::context::Context;
use crate::error::Result;
use crate::markup::Arg;

/// Event handler. Receives the context and the emission being delivered.
pub type Handler = Rc<dyn Fn(&Context, &Emission) -> Result<()>>;

/// One emitted event.
#[derive(Debug, Clone)]
pub struct Emission {
    pub event: String,
    /// Component the event was emitted on, if any.
    pub component: Option<Component>,
    pub params: Vec<Arg>,
}

impl Emission {
    pub fn new(event: impl Into<String>, params: Vec<Arg>) -> Self {
        Self {
            event: event.into(),
            component: None,
            params,
        }
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.component = Some(component);
        self
    }

    /// First parameter, if it is a node.
    pub fn node(&self) -> Option<crate::dom::NodeId> {
        match self.params.first() {
            Some(Arg::Node(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Returned by [`Emitter::on`], used to remove the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Replay copy of an [`Emission`]. Holds its component weakly, since a
/// component's own emitter records emissions that point back at it.
struct Recorded {
    event: String,
    component: Option<Weak<ComponentInner>>,
    params: Vec<Arg>,
}

impl Recorded {
    fn new(emission: &Emission) -> Self {
        Self {
            event: emission.event.clone(),
            component: emission.component.as_ref().map(Component::downgrade),
            params: emission.params.clone(),
        }
    }

    fn emission(&self) -> Emission {
        Emission {
            event: self.event.clone(),
            component: self.component.as_ref().and_then(Component::upgrade),
            params: self.params.clone(),
        }
    }
}

#[derive(Clone)]
struct Registered {
    id: HandlerId,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct EmitterInner {
    listeners: IndexMap<String, Vec<Registered>>,
    /// Last emission of each event, replayed to [`Emitter::on_all`] late joiners.
    emitted: IndexMap<String, Recorded>,
}

/// Event emitter. Handlers run in registration order; a failing handler is
/// logged and the remaining handlers still run.
#[derive(Default)]
pub struct Emitter {
    inner: RefCell<EmitterInner>,
    next_id: Cell<u64>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `event`.
    pub fn on(
        &self,
        event: impl Into<String>,
        f: impl Fn(&Context, &Emission) -> Result<()> + 'static,
    ) -> HandlerId {
        self.register(event.into(), Rc::new(f), false)
    }

    /// Register a handler that is removed after its first call.
    pub fn once(
        &self,
        event: impl Into<String>,
        f: impl Fn(&Context, &Emission) -> Result<()> + 'static,
    ) -> HandlerId {
        self.register(event.into(), Rc::new(f), true)
    }

    /// Register an already shared handler.
    pub fn on_handler(&self, event: impl Into<String>, handler: Handler) -> HandlerId {
        self.register(event.into(), handler, false)
    }

    /// Register a handler and replay the last emission of `event`, if the
    /// event already happened.
    pub fn on_all(
        &self,
        cx: &Context,
        event: impl Into<String>,
        f: impl Fn(&Context, &Emission) -> Result<()> + 'static,
    ) -> HandlerId {
        self.on_all_handler(cx, event, Rc::new(f))
    }

    /// [`Emitter::on_all`] for an already shared handler.
    pub fn on_all_handler(
        &self,
        cx: &Context,
        event: impl Into<String>,
        handler: Handler,
    ) -> HandlerId {
        let event = event.into();
        let past = self.inner.borrow().emitted.get(&event).map(Recorded::emission);
        let id = self.register(event, handler.clone(), false);
        if let Some(emission) = past {
            if let Err(e) = handler(cx, &emission) {
                tracing::error!(event = %emission.event, error = %e, "replayed event handler failed");
            }
        }
        id
    }

    fn register(&self, event: String, handler: Handler, once: bool) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.inner
            .borrow_mut()
            .listeners
            .entry(event)
            .or_default()
            .push(Registered { id, once, handler });
        id
    }

    /// Remove one handler. Returns whether it was registered.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(list) = inner.listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        before != list.len()
    }

    /// Deliver an emission. Returns whether any handler was registered.
    pub fn emit(&self, cx: &Context, emission: &Emission) -> bool {
        let snapshot: Vec<Registered> = {
            let mut inner = self.inner.borrow_mut();
            inner
                .emitted
                .insert(emission.event.clone(), Recorded::new(emission));
            match inner.listeners.get_mut(&emission.event) {
                Some(list) => {
                    let snapshot = list.clone();
                    list.retain(|r| !r.once);
                    snapshot
                }
                None => Vec::new(),
            }
        };
        for registered in &snapshot {
            if let Err(e) = (registered.handler)(cx, emission) {
                tracing::error!(event = %emission.event, error = %e, "event handler failed");
            }
        }
        !snapshot.is_empty()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Events that currently have at least one handler.
    pub fn event_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, l)| !l.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Drop every handler and the replay history.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.clear();
        inner.emitted.clear();
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Emitter")
            .field(
                "listeners",
                &inner
                    .listeners
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn recorder(
        log: &Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    ) -> impl Fn(&Context, &Emission) -> Result<()> + 'static {
        let log = log.clone();
        move |_: &Context, e: &Emission| {
            log.borrow_mut().push(format!("{tag}:{}", e.event));
            Ok(())
        }
    }

    #[test]
    fn emit_in_registration_order() {
        let cx = Context::new();
        let emitter = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on("ping", recorder(&log, "a"));
        emitter.on("ping", recorder(&log, "b"));
        assert!(emitter.emit(&cx, &Emission::new("ping", vec![])));
        assert_eq!(*log.borrow(), vec!["a:ping", "b:ping"]);
        assert!(!emitter.emit(&cx, &Emission::new("pong", vec![])));
    }

    #[test]
    fn once_and_off() {
        let cx = Context::new();
        let emitter = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.once("x", recorder(&log, "once"));
        let id = emitter.on("x", recorder(&log, "on"));
        emitter.emit(&cx, &Emission::new("x", vec![]));
        assert!(emitter.off("x", id));
        assert!(!emitter.off("x", id));
        emitter.emit(&cx, &Emission::new("x", vec![]));
        assert_eq!(*log.borrow(), vec!["once:x", "on:x"]);
        assert_eq!(emitter.listener_count("x"), 0);
    }

    #[test]
    fn failing_handler_is_isolated() {
        let cx = Context::new();
        let emitter = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.on("x", |_, _| Err(Error::listener("nope")));
        emitter.on("x", recorder(&log, "after"));
        emitter.emit(&cx, &Emission::new("x", vec![]));
        assert_eq!(*log.borrow(), vec!["after:x"]);
    }

    #[test]
    fn on_all_replays_last_emission() {
        let cx = Context::new();
        let emitter = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        emitter.emit(&cx, &Emission::new("ready", vec![Arg::from(1)]));
        emitter.on_all(&cx, "ready", recorder(&log, "late"));
        assert_eq!(*log.borrow(), vec!["late:ready"]);
        emitter.clear();
        emitter.on_all(&cx, "ready", recorder(&log, "later"));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn handler_may_register_during_emit() {
        let cx = Context::new();
        let emitter = Rc::new(Emitter::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let e2 = emitter.clone();
        let l2 = log.clone();
        emitter.on("x", move |_, _| {
            e2.on("x", recorder(&l2, "added"));
            Ok(())
        });
        emitter.emit(&cx, &Emission::new("x", vec![]));
        assert!(log.borrow().is_empty());
        assert_eq!(emitter.listener_count("x"), 2);
    }
}
