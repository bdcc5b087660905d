//! Cell listeners: keys, subscriber kinds, stored entries.

use std::fmt;
use std::rc::Rc;

use crate::component::{Component, ComponentId};
use crate::error::Result;
use crate::reactive::state::State;
use crate::value::Value;

/// Plain callback subscribed to a cell.
///
/// Receives the cell and any extra arguments passed to
/// [`State::fire`](crate::State::fire).
pub type Callback = Rc<dyn Fn(&State, &[Value]) -> Result<()>>;

/// Key under which a listener is stored on a cell.
///
/// A component is keyed by its id, so subscribing the same component twice
/// replaces the earlier entry instead of adding a second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    Component(ComponentId),
    Callback(u64),
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKey::Component(id) => write!(f, "component-{id}"),
            ListenerKey::Callback(n) => write!(f, "callback-{n}"),
        }
    }
}

/// Something that can subscribe to a cell.
#[derive(Clone)]
pub enum Subscriber {
    /// Re-renders through the component's `wrap` on every change.
    Component(Component),
    /// Called with the cell and the fire arguments.
    Callback(Callback),
}

impl Subscriber {
    /// Wrap a closure as a callback subscriber.
    pub fn callback(f: impl Fn(&State, &[Value]) -> Result<()> + 'static) -> Self {
        Subscriber::Callback(Rc::new(f))
    }
}

impl From<&Component> for Subscriber {
    fn from(component: &Component) -> Self {
        Subscriber::Component(component.clone())
    }
}

impl From<Component> for Subscriber {
    fn from(component: Component) -> Self {
        Subscriber::Component(component)
    }
}

impl From<Callback> for Subscriber {
    fn from(callback: Callback) -> Self {
        Subscriber::Callback(callback)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscriber::Component(c) => f.debug_tuple("Component").field(&c.id()).finish(),
            Subscriber::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored entries
// ---------------------------------------------------------------------------

/// What a cell keeps for each listener. Components are held by id only so a
/// cell never keeps a component alive.
#[derive(Clone)]
pub(crate) enum Target {
    Component(ComponentId),
    Callback(Callback),
}

#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) target: Target,
    pub(crate) once: bool,
}
