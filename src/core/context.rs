//! `Context`: the runtime handle owning the document, the repository, the
//! component registry and the task queue.
//!
//! Everything is single-threaded and reference counted. `Context` is a cheap
//! clone of an `Rc`; cells and components keep a weak handle back to it.
//!
//! Borrows of the document ([`Context::dom`], [`Context::dom_mut`]) must not
//! be held across calls back into the runtime, since building markup,
//! firing cells and dispatching events all borrow it internally.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::broker::Broker;
use crate::component::{Component, ComponentId, FnRender, Render};
use crate::config::Config;
use crate::core::container::{Container, BROKER_SERVICE, RESET_SERVICE};
use crate::core::emitter::{Emission, Handler};
use crate::core::repository::Repository;
use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::markup::{Arg, Markup};
use crate::reactive::{State, StateId};
use crate::value::Value;

pub(crate) type Factory = Rc<dyn Fn() -> Rc<dyn Render>>;
pub(crate) type Task = Box<dyn FnOnce(&Context)>;

pub(crate) struct ContextInner {
    pub(crate) config: Config,
    pub(crate) dom: RefCell<Dom>,
    pub(crate) repository: RefCell<Repository>,
    pub(crate) factories: RefCell<HashMap<String, Factory>>,
    pub(crate) tasks: RefCell<VecDeque<Task>>,
    /// Nodes dropped from the tree by the runtime, disposed on the next tick.
    pub(crate) discarded: RefCell<Vec<NodeId>>,
    pub(crate) sweep_pending: Cell<bool>,
    container: Container,
    next_state: Cell<u64>,
    next_component: Cell<u64>,
    next_key: Cell<u64>,
    next_placeholder: Cell<u64>,
    next_anonymous: Cell<u64>,
}

/// Runtime handle.
#[derive(Clone)]
pub struct Context {
    pub(crate) inner: Rc<ContextInner>,
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut dom = Dom::new();
        dom.set_observing(config.observe_removals);
        let cx = Context {
            inner: Rc::new(ContextInner {
                config,
                dom: RefCell::new(dom),
                repository: RefCell::new(Repository::new()),
                factories: RefCell::new(HashMap::new()),
                tasks: RefCell::new(VecDeque::new()),
                discarded: RefCell::new(Vec::new()),
                sweep_pending: Cell::new(false),
                container: Container::new(),
                next_state: Cell::new(0),
                next_component: Cell::new(0),
                next_key: Cell::new(0),
                next_placeholder: Cell::new(0),
                next_anonymous: Cell::new(0),
            }),
        };
        let reset = cx.state(false);
        cx.inner.container.value(RESET_SERVICE, reset);
        cx
    }

    pub(crate) fn from_weak(weak: &Weak<ContextInner>) -> Option<Context> {
        weak.upgrade().map(|inner| Context { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    // -- document -----------------------------------------------------------

    pub fn dom(&self) -> Ref<'_, Dom> {
        self.inner.dom.borrow()
    }

    pub fn dom_mut(&self) -> RefMut<'_, Dom> {
        self.inner.dom.borrow_mut()
    }

    pub fn body(&self) -> NodeId {
        self.dom().body()
    }

    pub fn document(&self) -> NodeId {
        self.dom().document()
    }

    // -- repository ---------------------------------------------------------

    pub fn repository(&self) -> Ref<'_, Repository> {
        self.inner.repository.borrow()
    }

    pub(crate) fn repository_mut(&self) -> RefMut<'_, Repository> {
        self.inner.repository.borrow_mut()
    }

    // -- cells --------------------------------------------------------------

    /// Create and register a cell.
    pub fn state(&self, value: impl Into<Value>) -> State {
        let id = StateId(bump(&self.inner.next_state));
        let state = State::new(id, value.into(), self.downgrade());
        self.repository_mut().insert_state(state.clone());
        state
    }

    pub fn find_state(&self, id: StateId) -> Option<State> {
        self.repository().state(id).cloned()
    }

    /// Shared boolean cell signalling that routed content should replace
    /// whatever its parent currently holds.
    ///
    /// Resolved through the container under [`RESET_SERVICE`]; registering
    /// another cell there replaces it.
    pub fn reset_state(&self) -> State {
        match self.container().resolve::<State>(RESET_SERVICE) {
            Ok(state) => State::clone(&state),
            Err(e) => {
                tracing::warn!(error = %e, "reset cell unavailable, registering a fresh one");
                let state = self.state(false);
                self.container().value(RESET_SERVICE, state.clone());
                state
            }
        }
    }

    // -- component registry -------------------------------------------------

    /// Register a component type. `factory` builds a fresh render object for
    /// every instance.
    pub fn register<R: Render>(&self, name: impl Into<String>, factory: impl Fn() -> R + 'static) {
        let factory: Factory = Rc::new(move || Rc::new(factory()) as Rc<dyn Render>);
        self.inner.factories.borrow_mut().insert(name.into(), factory);
    }

    /// Register a function component.
    pub fn register_fn(
        &self,
        name: impl Into<String>,
        render: impl Fn(&Context, &[Arg]) -> Result<Markup> + 'static,
    ) {
        let shared: Rc<dyn Render> = Rc::new(FnRender::new(render));
        let factory: Factory = Rc::new(move || shared.clone());
        self.inner.factories.borrow_mut().insert(name.into(), factory);
    }

    pub(crate) fn unregister(&self, name: &str) {
        self.inner.factories.borrow_mut().remove(name);
    }

    /// Whether `name` resolves to a component.
    pub fn has_component(&self, name: &str) -> bool {
        self.inner.factories.borrow().contains_key(name)
            || self.repository().component_named(name).is_some()
    }

    /// Live instance registered under `name`.
    pub fn component(&self, name: &str) -> Option<Component> {
        self.repository().component_named(name).cloned()
    }

    pub fn component_by_id(&self, id: ComponentId) -> Option<Component> {
        self.repository().component(id).cloned()
    }

    /// Every live component in creation order.
    pub fn components(&self) -> Vec<Component> {
        self.repository().components().cloned().collect()
    }

    /// Existing instance for `name`, or a new one from its factory.
    pub fn obtain(&self, name: &str) -> Option<Component> {
        if let Some(existing) = self.component(name) {
            return Some(existing);
        }
        let factory = self.inner.factories.borrow().get(name).cloned()?;
        let component = Component::new(self, name, factory());
        self.repository_mut().set_name(name, component.id());
        Some(component)
    }

    /// Construct (if needed) and mount a registered component.
    pub fn run(&self, name: &str) -> Result<Component> {
        let component = self
            .obtain(name)
            .ok_or_else(|| Error::InvalidName(name.to_owned()))?;
        component.mount()?;
        Ok(component)
    }

    /// Mount several components in order.
    pub fn run_all(&self, names: &[&str]) -> Result<Vec<Component>> {
        names.iter().map(|name| self.run(name)).collect()
    }

    /// Register `handler` for `event` on the component called `name`. When
    /// the component does not exist yet, the handler is attached as soon as
    /// it is constructed.
    pub fn on(
        &self,
        name: &str,
        event: impl Into<String>,
        handler: impl Fn(&Context, &Emission) -> Result<()> + 'static,
    ) {
        self.on_handler(name, event, Rc::new(handler));
    }

    /// [`Context::on`] for an already shared handler.
    pub fn on_handler(&self, name: &str, event: impl Into<String>, handler: Handler) {
        match self.component(name) {
            Some(component) => {
                component.emitter().on_handler(event, handler);
            }
            None => self
                .repository_mut()
                .add_pending_event(name, event.into(), handler),
        }
    }

    /// Hide every root of the named component.
    pub fn hide(&self, name: &str) -> bool {
        match self.component(name) {
            Some(component) => {
                component.hide();
                true
            }
            None => false,
        }
    }

    /// Show every root of the named component.
    pub fn show(&self, name: &str) -> bool {
        match self.component(name) {
            Some(component) => {
                component.show();
                true
            }
            None => false,
        }
    }

    /// Unmount the named component and drop it from the registry.
    pub fn delete_component(&self, name: &str) -> bool {
        match self.component(name) {
            Some(component) => component.unmount(),
            None => false,
        }
    }

    // -- services -----------------------------------------------------------

    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// Register `broker` in the container under [`BROKER_SERVICE`].
    pub fn set_broker(&self, broker: Rc<dyn Broker>) {
        self.container().value(BROKER_SERVICE, broker);
    }

    /// The broker registered in the container, if any.
    ///
    /// Any lifetime works as long as the service is an `Rc<dyn Broker>`.
    pub fn broker(&self) -> Option<Rc<dyn Broker>> {
        if !self.container().has(BROKER_SERVICE) {
            return None;
        }
        match self.container().resolve::<Rc<dyn Broker>>(BROKER_SERVICE) {
            Ok(broker) => Some(Rc::clone(&*broker)),
            Err(e) => {
                tracing::error!(error = %e, "broker service could not be resolved");
                None
            }
        }
    }

    // -- node methods and hooks ---------------------------------------------

    /// Call a method attached to `node` through [`Attrs::method`](crate::Attrs::method).
    pub fn call_method(&self, node: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .repository()
            .method(node, name)
            .ok_or_else(|| Error::UnknownMethod {
                method: name.to_owned(),
            })?;
        method(self, node, args)
    }

    pub fn methods(&self, node: NodeId) -> Vec<String> {
        self.repository().method_names(node)
    }

    /// Run `hook` for every node the runtime disposes.
    pub fn on_node_disposed(&self, hook: impl Fn(&Context, NodeId) + 'static) {
        self.repository_mut().add_dispose_hook(Rc::new(hook));
    }

    // -- tasks --------------------------------------------------------------

    /// Defer work to the next [`tick`](Context::tick).
    pub fn queue_task(&self, task: impl FnOnce(&Context) + 'static) {
        self.inner.tasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    // -- id counters --------------------------------------------------------

    pub(crate) fn next_component_id(&self) -> ComponentId {
        ComponentId(bump(&self.inner.next_component))
    }

    pub(crate) fn next_args_key(&self) -> u64 {
        bump(&self.inner.next_key)
    }

    pub(crate) fn next_placeholder(&self) -> u64 {
        bump(&self.inner.next_placeholder)
    }

    pub(crate) fn next_anonymous(&self) -> u64 {
        bump(&self.inner.next_anonymous)
    }
}

fn bump(counter: &Cell<u64>) -> u64 {
    let n = counter.get();
    counter.set(n + 1);
    n
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("nodes", &self.inner.dom.borrow().len())
            .field("repository", &*self.inner.repository.borrow())
            .field("tasks", &self.inner.tasks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::json;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn states_get_unique_ids_and_are_registered() {
        let cx = Context::new();
        let a = cx.state(1);
        let b = cx.state(json!({"x": 1}));
        assert_ne!(a.id(), b.id());
        assert_eq!(cx.find_state(b.id()), Some(b));
    }

    #[test]
    fn reset_state_is_shared() {
        let cx = Context::new();
        let a = cx.reset_state();
        let b = cx.reset_state();
        assert_eq!(a, b);
        assert_eq!(a.get(), json!(false));
    }

    #[test]
    fn reset_cell_resolves_through_the_container() {
        let cx = Context::new();
        let mine = cx.state(true);
        cx.container().value(RESET_SERVICE, mine.clone());
        assert_eq!(cx.reset_state(), mine);

        cx.container().clear();
        let fresh = cx.reset_state();
        assert_ne!(fresh, mine);
        assert_eq!(cx.reset_state(), fresh);
    }

    #[test]
    fn unknown_method_is_an_error() {
        let cx = Context::new();
        let body = cx.body();
        assert_eq!(
            cx.call_method(body, "focus", &[]),
            Err(Error::UnknownMethod {
                method: "focus".into()
            })
        );
    }

    #[test]
    fn run_unknown_component_fails() {
        let cx = Context::new();
        assert!(matches!(cx.run("Missing"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn obtain_reuses_the_named_instance() {
        let cx = Context::new();
        cx.register_fn("Badge", |cx, _| cx.handle("span", &[]));
        assert!(cx.has_component("Badge"));
        let a = cx.obtain("Badge").unwrap();
        let b = cx.obtain("Badge").unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(cx.components().len(), 1);
    }

    #[test]
    fn pending_events_attach_on_construction() {
        let cx = Context::new();
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        cx.on("Later", "premount", move |_, e| {
            l.borrow_mut().push(e.event.clone());
            Ok(())
        });
        cx.register_fn("Later", |cx, _| cx.handle("p", &[]));
        cx.run("Later").unwrap();
        assert_eq!(*log.borrow(), vec!["premount"]);
    }

    #[test]
    fn queued_tasks_wait_for_tick() {
        let cx = Context::new();
        let hit = Rc::new(Cell::new(false));
        let h = hit.clone();
        cx.queue_task(move |_| h.set(true));
        assert_eq!(cx.pending_tasks(), 1);
        assert!(!hit.get());
        cx.tick();
        assert!(hit.get());
        assert_eq!(cx.pending_tasks(), 0);
    }
}
