//! Central registry: components, cells, stored render arguments and the
//! per-node listener and method side tables.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use slotmap::SecondaryMap;

use crate::component::{Component, ComponentId};
use crate::core::context::Context;
use crate::core::emitter::Handler;
use crate::dom::NodeId;
use crate::event::DomEvent;
use crate::error::Result;
use crate::markup::Arg;
use crate::reactive::{State, StateId};
use crate::value::Value;

/// Handler attached to a node for a DOM event type.
pub type EventHandler = Rc<dyn Fn(&Context, &DomEvent) -> Result<()>>;

/// Method attached to a node, callable by name.
pub type NodeMethod = Rc<dyn Fn(&Context, NodeId, &[Value]) -> Result<Value>>;

/// Called for every node as it is disposed.
pub type DisposeHook = Rc<dyn Fn(&Context, NodeId)>;

/// Owned registry state of a [`Context`].
#[derive(Default)]
pub struct Repository {
    components: IndexMap<ComponentId, Component>,
    names: HashMap<String, ComponentId>,
    /// Render arguments per component, keyed by the root's `key` attribute.
    args: HashMap<ComponentId, IndexMap<String, Vec<Arg>>>,
    /// Arguments captured for placeholders, keyed by their `ojs-key`.
    placeholders: HashMap<String, Vec<Arg>>,
    states: IndexMap<StateId, State>,
    listeners: SecondaryMap<NodeId, IndexMap<String, Vec<EventHandler>>>,
    methods: SecondaryMap<NodeId, IndexMap<String, NodeMethod>>,
    dispose_hooks: Vec<DisposeHook>,
    /// Handlers registered for a component name before it exists.
    pending_events: HashMap<String, Vec<(String, Handler)>>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    // -- components ---------------------------------------------------------

    pub(crate) fn insert_component(&mut self, component: Component) {
        self.args.entry(component.id()).or_default();
        self.components.insert(component.id(), component);
    }

    /// Remove a component, its name mapping and its stored arguments.
    pub(crate) fn remove_component(&mut self, id: ComponentId) -> Option<Component> {
        let component = self.components.shift_remove(&id)?;
        if self.names.get(component.name()) == Some(&id) {
            self.names.remove(component.name());
        }
        self.args.remove(&id);
        Some(component)
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub fn component_named(&self, name: &str) -> Option<&Component> {
        self.names.get(name).and_then(|id| self.components.get(id))
    }

    pub(crate) fn set_name(&mut self, name: &str, id: ComponentId) {
        self.names.insert(name.to_owned(), id);
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // -- render arguments ---------------------------------------------------

    pub(crate) fn store_args(&mut self, id: ComponentId, key: String, args: Vec<Arg>) {
        self.args.entry(id).or_default().insert(key, args);
    }

    pub fn args(&self, id: ComponentId, key: &str) -> Option<&Vec<Arg>> {
        self.args.get(&id).and_then(|m| m.get(key))
    }

    pub(crate) fn remove_args(&mut self, id: ComponentId, key: &str) -> Option<Vec<Arg>> {
        self.args.get_mut(&id).and_then(|m| m.shift_remove(key))
    }

    /// Number of argument sets stored for a component.
    pub fn args_count(&self, id: ComponentId) -> usize {
        self.args.get(&id).map_or(0, IndexMap::len)
    }

    /// Drop stored arguments whose key is not in `live`.
    pub(crate) fn retain_args(&mut self, id: ComponentId, live: &[String]) -> usize {
        let Some(map) = self.args.get_mut(&id) else {
            return 0;
        };
        let before = map.len();
        map.retain(|key, _| live.iter().any(|k| k == key));
        before - map.len()
    }

    pub(crate) fn store_placeholder(&mut self, key: String, args: Vec<Arg>) {
        self.placeholders.insert(key, args);
    }

    pub(crate) fn take_placeholder(&mut self, key: &str) -> Option<Vec<Arg>> {
        self.placeholders.remove(key)
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    // -- cells --------------------------------------------------------------

    pub(crate) fn insert_state(&mut self, state: State) {
        self.states.insert(state.id(), state);
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    // -- node listeners -----------------------------------------------------

    pub(crate) fn add_listener(&mut self, node: NodeId, event: &str, handler: EventHandler) {
        if !self.listeners.contains_key(node) {
            self.listeners.insert(node, IndexMap::new());
        }
        if let Some(map) = self.listeners.get_mut(node) {
            map.entry(event.to_owned()).or_default().push(handler);
        }
    }

    pub fn listeners(&self, node: NodeId, event: &str) -> Vec<EventHandler> {
        self.listeners
            .get(node)
            .and_then(|m| m.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Event types with handlers on `node`.
    pub fn listener_events(&self, node: NodeId) -> Vec<String> {
        self.listeners
            .get(node)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn all_listeners(&self, node: NodeId) -> IndexMap<String, Vec<EventHandler>> {
        self.listeners.get(node).cloned().unwrap_or_default()
    }

    pub(crate) fn set_listeners(&mut self, node: NodeId, map: IndexMap<String, Vec<EventHandler>>) {
        if map.is_empty() {
            self.listeners.remove(node);
        } else {
            self.listeners.insert(node, map);
        }
    }

    pub(crate) fn remove_listeners(&mut self, node: NodeId) -> bool {
        self.listeners.remove(node).is_some()
    }

    // -- node methods -------------------------------------------------------

    pub(crate) fn set_method(&mut self, node: NodeId, name: &str, method: NodeMethod) {
        if !self.methods.contains_key(node) {
            self.methods.insert(node, IndexMap::new());
        }
        if let Some(map) = self.methods.get_mut(node) {
            map.insert(name.to_owned(), method);
        }
    }

    pub fn method(&self, node: NodeId, name: &str) -> Option<NodeMethod> {
        self.methods.get(node).and_then(|m| m.get(name)).cloned()
    }

    pub fn method_names(&self, node: NodeId) -> Vec<String> {
        self.methods
            .get(node)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn all_methods(&self, node: NodeId) -> IndexMap<String, NodeMethod> {
        self.methods.get(node).cloned().unwrap_or_default()
    }

    pub(crate) fn set_methods(&mut self, node: NodeId, map: IndexMap<String, NodeMethod>) {
        if map.is_empty() {
            self.methods.remove(node);
        } else {
            self.methods.insert(node, map);
        }
    }

    pub(crate) fn remove_methods(&mut self, node: NodeId) -> bool {
        self.methods.remove(node).is_some()
    }

    /// Nodes that still carry listeners or methods.
    pub fn side_table_len(&self) -> usize {
        self.listeners.len() + self.methods.len()
    }

    // -- disposal hooks -----------------------------------------------------

    pub(crate) fn add_dispose_hook(&mut self, hook: DisposeHook) {
        self.dispose_hooks.push(hook);
    }

    pub(crate) fn dispose_hooks(&self) -> Vec<DisposeHook> {
        self.dispose_hooks.clone()
    }

    // -- pre-registered component events ------------------------------------

    pub(crate) fn add_pending_event(&mut self, component: &str, event: String, handler: Handler) {
        self.pending_events
            .entry(component.to_owned())
            .or_default()
            .push((event, handler));
    }

    pub(crate) fn take_pending_events(&mut self, component: &str) -> Vec<(String, Handler)> {
        self.pending_events.remove(component).unwrap_or_default()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("components", &self.components.len())
            .field("states", &self.states.len())
            .field("placeholders", &self.placeholders.len())
            .field("listeners", &self.listeners.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}
