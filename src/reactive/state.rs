//! `State`: an observable cell holding a dynamic value.
//!
//! A cell owns one [`Value`] and an ordered set of listeners. Replacing the
//! value, patching a key or pushing onto an array fires every listener in
//! registration order. Component listeners re-render through `wrap` with a
//! trailing [`StateChange`] signature; callbacks receive the cell itself.
//!
//! Cells are created through [`Context::state`](crate::Context::state) and
//! registered in the repository, so their ids are unique per context.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::context::{Context, ContextInner};
use crate::error::{Error, Result};
use crate::markup::Arg;
use crate::reactive::listener::{Callback, Entry, ListenerKey, Subscriber, Target};
use crate::value::{is_primitive, strict_eq, to_text, Value};

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Identifies a cell within its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) u64);

impl StateId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trailing argument appended to `wrap` when a re-render is triggered by a
/// cell change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub state: StateId,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub(crate) struct StateInner {
    id: StateId,
    value: RefCell<Value>,
    changed: Cell<bool>,
    listeners: RefCell<IndexMap<ListenerKey, Entry>>,
    next_callback: Cell<u64>,
    cx: Weak<ContextInner>,
}

/// Observable cell. Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct State {
    inner: Rc<StateInner>,
}

impl State {
    pub(crate) fn new(id: StateId, value: Value, cx: Weak<ContextInner>) -> Self {
        Self {
            inner: Rc::new(StateInner {
                id,
                value: RefCell::new(value),
                changed: Cell::new(false),
                listeners: RefCell::new(IndexMap::new()),
                next_callback: Cell::new(0),
                cx,
            }),
        }
    }

    pub fn id(&self) -> StateId {
        self.inner.id
    }

    /// Clone of the current value.
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Read the current value by reference.
    ///
    /// The closure must not write to this cell.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and fire.
    ///
    /// Writing a primitive that is strictly equal to the current value does
    /// nothing. Objects and arrays always fire, even when structurally equal.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        if is_primitive(&value) && strict_eq(&self.inner.value.borrow(), &value) {
            return;
        }
        *self.inner.value.borrow_mut() = value;
        self.fire(&[]);
    }

    /// Read a key of an object or an index of an array.
    ///
    /// `"length"` returns the number of entries of either container.
    pub fn get_key(&self, key: &str) -> Option<Value> {
        let value = self.inner.value.borrow();
        if key == "length" && !is_primitive(&value) {
            return Some(Value::from(container_len(&value)));
        }
        match &*value {
            Value::Object(map) => map.get(key).cloned(),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            _ => None,
        }
    }

    /// Array element at `index`.
    pub fn index(&self, index: usize) -> Option<Value> {
        match &*self.inner.value.borrow() {
            Value::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Patch one key and fire when it changed.
    ///
    /// On arrays the key must be an index; writing past the end pads with
    /// `null`. Primitive cells cannot be patched.
    pub fn set_key(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            match &mut *current {
                Value::Object(map) => {
                    let same = map.get(key).is_some_and(|old| strict_eq(old, &value));
                    if !same {
                        map.insert(key.to_owned(), value);
                    }
                    !same
                }
                Value::Array(items) => {
                    let index = key.parse::<usize>().map_err(|_| self.not_a_container(key))?;
                    if index < items.len() {
                        let same = strict_eq(&items[index], &value);
                        if !same {
                            items[index] = value;
                        }
                        !same
                    } else {
                        items.resize(index, Value::Null);
                        items.push(value);
                        true
                    }
                }
                _ => return Err(self.not_a_container(key)),
            }
        };
        if changed {
            self.fire(&[]);
        }
        Ok(())
    }

    /// Delete a key (object) or index (array). Fires when something was
    /// removed.
    pub fn remove_key(&self, key: &str) -> bool {
        let removed = {
            let mut current = self.inner.value.borrow_mut();
            match &mut *current {
                Value::Object(map) => map.shift_remove(key).is_some(),
                Value::Array(items) => match key.parse::<usize>() {
                    Ok(index) if index < items.len() => {
                        items.remove(index);
                        true
                    }
                    _ => false,
                },
                _ => false,
            }
        };
        if removed {
            self.fire(&[]);
        }
        removed
    }

    /// Entry count of an object or array; zero for primitives.
    pub fn len(&self) -> usize {
        container_len(&self.inner.value.borrow())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to an array value and fire.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.extend(std::iter::once(value.into()))
    }

    /// Append several items with a single notification.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) -> Result<()> {
        {
            let mut current = self.inner.value.borrow_mut();
            let Value::Array(items) = &mut *current else {
                return Err(Error::NotAnArray { state: self.inner.id.0 });
            };
            items.extend(values);
        }
        self.fire(&[]);
        Ok(())
    }

    /// Mutate the value in place and fire unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut Value)) {
        f(&mut self.inner.value.borrow_mut());
        self.fire(&[]);
    }

    /// Object values or array items; empty for primitives.
    pub fn values(&self) -> Vec<Value> {
        match &*self.inner.value.borrow() {
            Value::Object(map) => map.values().cloned().collect(),
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether the cell has fired at least once.
    pub fn changed(&self) -> bool {
        self.inner.changed.get()
    }

    // -- listeners ----------------------------------------------------------

    /// Subscribe a component or callback. Returns the key to unsubscribe with.
    pub fn listener(&self, subscriber: impl Into<Subscriber>) -> ListenerKey {
        self.add(subscriber.into(), false)
    }

    /// Subscribe for a single notification.
    pub fn once(&self, subscriber: impl Into<Subscriber>) -> ListenerKey {
        self.add(subscriber.into(), true)
    }

    /// Shorthand for subscribing a closure.
    pub fn on_change(&self, f: impl Fn(&State, &[Value]) -> Result<()> + 'static) -> ListenerKey {
        self.listener(Subscriber::callback(f))
    }

    /// Remove a listener. Returns whether it was present.
    ///
    /// Removing a component listener also drops the cell from that
    /// component's subscriptions.
    pub fn off(&self, key: &ListenerKey) -> bool {
        let removed = self.inner.listeners.borrow_mut().shift_remove(key).is_some();
        if let (true, ListenerKey::Component(id)) = (removed, key) {
            let component = Context::from_weak(&self.inner.cx).and_then(|cx| cx.component_by_id(*id));
            if let Some(component) = component {
                component.forget_state(self.id());
            }
        }
        removed
    }

    pub fn has_listener(&self, key: &ListenerKey) -> bool {
        self.inner.listeners.borrow().contains_key(key)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Keys in registration order.
    pub fn listener_keys(&self) -> Vec<ListenerKey> {
        self.inner.listeners.borrow().keys().copied().collect()
    }

    fn add(&self, subscriber: Subscriber, once: bool) -> ListenerKey {
        let (key, target) = match subscriber {
            Subscriber::Component(component) => {
                let key = ListenerKey::Component(component.id());
                if component.is_unmounted() {
                    tracing::warn!(state = %self.id(), component = %component.name(), "not subscribing an unmounted component");
                    return key;
                }
                component.record_state(self);
                (key, Target::Component(component.id()))
            }
            Subscriber::Callback(callback) => {
                let n = self.inner.next_callback.get();
                self.inner.next_callback.set(n + 1);
                (ListenerKey::Callback(n), Target::Callback(callback))
            }
        };
        self.inner
            .listeners
            .borrow_mut()
            .insert(key, Entry { target, once });
        key
    }

    /// Notify every listener in registration order.
    ///
    /// Listeners run against a snapshot; one removed by an earlier listener
    /// during the same pass is skipped. Single-shot listeners are removed
    /// before they run. A failing listener is logged and the rest still run.
    pub fn fire(&self, args: &[Value]) {
        self.inner.changed.set(true);
        let snapshot: Vec<(ListenerKey, Entry)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(k, e)| (*k, e.clone()))
            .collect();
        if snapshot.is_empty() {
            return;
        }
        let cx = Context::from_weak(&self.inner.cx);

        for (key, entry) in snapshot {
            if !self.has_listener(&key) {
                continue;
            }
            if entry.once {
                self.off(&key);
            }
            let result = match entry.target {
                Target::Callback(callback) => callback(self, args),
                Target::Component(id) => {
                    match cx.as_ref().and_then(|cx| cx.component_by_id(id)) {
                        Some(component) => {
                            let mut call: Vec<Arg> = args.iter().cloned().map(Arg::Value).collect();
                            call.push(Arg::Signature(StateChange { state: self.id() }));
                            component.wrap(&call).map(|_| ())
                        }
                        None => {
                            tracing::debug!(state = %self.id(), listener = %key, "dropping listener of a released component");
                            self.off(&key);
                            Ok(())
                        }
                    }
                }
            };
            if let Err(e) = result {
                tracing::error!(state = %self.id(), listener = %key, error = %e, "state listener failed");
            }
        }
    }

    fn not_a_container(&self, key: &str) -> Error {
        Error::NotAContainer {
            state: self.inner.id.0,
            key: key.to_owned(),
        }
    }
}

fn container_len(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.len(),
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.inner.id.0)
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Renders the value as node text.
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(&self.inner.value.borrow()))
    }
}

// ---------------------------------------------------------------------------
// Observable
// ---------------------------------------------------------------------------

/// Keyed observable interface.
///
/// Method names overlap with the inherent ones on [`State`], so call these
/// with path syntax: `Observable::get(&state, "key")`.
pub trait Observable {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn subscribe(&self, callback: Callback) -> ListenerKey;
    fn unsubscribe(&self, key: &ListenerKey) -> bool;
    fn notify(&self);
}

impl Observable for State {
    fn get(&self, key: &str) -> Option<Value> {
        self.get_key(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_key(key, value)
    }

    fn subscribe(&self, callback: Callback) -> ListenerKey {
        self.listener(Subscriber::Callback(callback))
    }

    fn unsubscribe(&self, key: &ListenerKey) -> bool {
        self.off(key)
    }

    fn notify(&self) {
        self.fire(&[]);
    }
}
