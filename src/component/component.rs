//! `Component`: a named render object with its emitter, flags and the cells
//! it listens to.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::broker::SubscriptionId;
use crate::component::lifecycle::LifecycleEvent;
use crate::component::render::{ListenTarget, Render};
use crate::core::context::{Context, ContextInner};
use crate::core::emitter::{Emission, Emitter, HandlerId};
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::markup::Arg;
use crate::reactive::{State, StateId};
use crate::value::kebab;

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Identifies a component instance. Written to the `uid` attribute of every
/// root the instance renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u64);

impl ComponentId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Parse the value of a `uid` attribute.
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok().map(ComponentId)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Flags {
    pub(crate) registered: Cell<bool>,
    pub(crate) mounted: Cell<bool>,
    pub(crate) unmounted: Cell<bool>,
    pub(crate) unmounting: Cell<bool>,
    pub(crate) rendered: Cell<bool>,
    pub(crate) rerendered: Cell<bool>,
    pub(crate) hidden: Cell<bool>,
    pub(crate) bound: Cell<bool>,
    pub(crate) listeners_bound: Cell<bool>,
    pub(crate) anonymous: Cell<bool>,
}

pub(crate) struct ComponentInner {
    pub(crate) id: ComponentId,
    pub(crate) name: String,
    pub(crate) tag: String,
    pub(crate) render: Rc<dyn Render>,
    pub(crate) emitter: Emitter,
    pub(crate) states: RefCell<IndexMap<StateId, State>>,
    pub(crate) flags: Flags,
    pub(crate) broker_subscriptions: RefCell<Vec<(String, SubscriptionId)>>,
    pub(crate) cx: Weak<ContextInner>,
}

/// Handle to a component instance. Clones share the instance.
#[derive(Clone)]
pub struct Component {
    pub(crate) inner: Rc<ComponentInner>,
}

impl Component {
    /// Create an instance and register it with the context.
    ///
    /// Handlers pre-registered through [`Context::on`] for `name` and the
    /// handlers declared by `render` are attached here.
    pub fn new(cx: &Context, name: impl Into<String>, render: Rc<dyn Render>) -> Self {
        let name = name.into();
        let component = Component {
            inner: Rc::new(ComponentInner {
                id: cx.next_component_id(),
                tag: format!("ojs-{}", kebab(&name)),
                name,
                render,
                emitter: Emitter::new(),
                states: RefCell::new(IndexMap::new()),
                flags: Flags::default(),
                broker_subscriptions: RefCell::new(Vec::new()),
                cx: cx.downgrade(),
            }),
        };
        cx.repository_mut().insert_component(component.clone());
        component.claim_pending_events(cx);
        component.bind_declared_listeners();
        tracing::trace!(component = %component.name(), id = %component.id(), "constructed");
        component
    }

    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Tag of the root element, `ojs-<kebab-name>`.
    pub fn tag_name(&self) -> &str {
        &self.inner.tag
    }

    pub(crate) fn downgrade(&self) -> Weak<ComponentInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<ComponentInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Component { inner })
    }

    pub fn context(&self) -> Result<Context> {
        Context::from_weak(&self.inner.cx).ok_or(Error::ContextDropped)
    }

    // -- flags --------------------------------------------------------------

    pub fn is_registered(&self) -> bool {
        self.inner.flags.registered.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.flags.mounted.get()
    }

    pub fn is_unmounted(&self) -> bool {
        self.inner.flags.unmounted.get()
    }

    pub fn is_rendered(&self) -> bool {
        self.inner.flags.rendered.get()
    }

    pub fn is_rerendered(&self) -> bool {
        self.inner.flags.rerendered.get()
    }

    pub fn is_visible(&self) -> bool {
        !self.inner.flags.hidden.get()
    }

    /// Whether placeholders were bound by `mount`.
    pub fn is_bound(&self) -> bool {
        self.inner.flags.bound.get()
    }

    pub fn is_anonymous(&self) -> bool {
        self.inner.flags.anonymous.get()
    }

    pub(crate) fn set_anonymous(&self) {
        self.inner.flags.anonymous.set(true);
    }

    // -- events -------------------------------------------------------------

    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn on(
        &self,
        event: impl Into<String>,
        f: impl Fn(&Context, &Emission) -> crate::Result<()> + 'static,
    ) -> HandlerId {
        self.inner.emitter.on(event, f)
    }

    pub fn once(
        &self,
        event: impl Into<String>,
        f: impl Fn(&Context, &Emission) -> crate::Result<()> + 'static,
    ) -> HandlerId {
        self.inner.emitter.once(event, f)
    }

    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        self.inner.emitter.off(event, id)
    }

    /// Emit `event` on this component.
    ///
    /// Lifecycle events update the matching flag before any handler runs.
    /// Once unmounted, the flags no longer change.
    pub fn emit(&self, event: &str, params: Vec<Arg>) {
        let flags = &self.inner.flags;
        let event_kind = if flags.unmounted.get() {
            None
        } else {
            LifecycleEvent::from_name(event)
        };
        match event_kind {
            Some(LifecycleEvent::Rendered) => flags.rendered.set(true),
            Some(LifecycleEvent::Rerendered) => flags.rerendered.set(true),
            Some(LifecycleEvent::Mounted) => flags.mounted.set(true),
            Some(LifecycleEvent::Bound) => flags.bound.set(true),
            Some(LifecycleEvent::Hidden) => flags.hidden.set(true),
            Some(LifecycleEvent::Visible) => flags.hidden.set(false),
            _ => {}
        }
        let Ok(cx) = self.context() else {
            return;
        };
        tracing::trace!(component = %self.name(), event, "emit");
        let emission = Emission::new(event, params).with_component(self.clone());
        self.inner.emitter.emit(&cx, &emission);
    }

    pub(crate) fn emit_lifecycle(&self, event: LifecycleEvent, params: Vec<Arg>) {
        self.emit(event.as_str(), params);
    }

    fn claim_pending_events(&self, cx: &Context) {
        let pending = cx.repository_mut().take_pending_events(self.name());
        for (event, handler) in pending {
            self.inner.emitter.on_handler(event, handler);
        }
    }

    /// Attach the handlers declared by the render object. Runs once; later
    /// calls only warn.
    pub fn bind_declared_listeners(&self) {
        if self.inner.flags.listeners_bound.replace(true) {
            tracing::warn!(component = %self.name(), "listeners already bound");
            return;
        }
        let declared = self.inner.render.listeners();
        if declared.is_empty() {
            return;
        }
        let Ok(cx) = self.context() else {
            tracing::warn!(component = %self.name(), "context dropped, declared listeners not bound");
            return;
        };
        let broker = cx.broker();
        for d in declared {
            match &d.target {
                ListenTarget::Component => {
                    for event in &d.events {
                        if d.replay {
                            self.inner.emitter.on_all_handler(&cx, event.clone(), d.handler.clone());
                        } else {
                            self.inner.emitter.on_handler(event.clone(), d.handler.clone());
                        }
                    }
                }
                ListenTarget::Named(name) => {
                    let other = cx.component(name);
                    for event in &d.events {
                        match (&other, d.replay) {
                            (Some(other), true) => {
                                other.emitter().on_all_handler(&cx, event.clone(), d.handler.clone());
                            }
                            _ => cx.on_handler(name, event.clone(), d.handler.clone()),
                        }
                    }
                }
                ListenTarget::Broker => {
                    let Some(broker) = &broker else {
                        tracing::warn!(component = %self.name(), events = ?d.events, "no broker configured, dropping declared broker listener");
                        continue;
                    };
                    let mut subs = self.inner.broker_subscriptions.borrow_mut();
                    for event in &d.events {
                        let id = broker.subscribe(event, d.handler.clone());
                        subs.push((event.clone(), id));
                    }
                }
            }
        }
    }

    // -- cells --------------------------------------------------------------

    /// Cells this instance is subscribed to.
    pub fn states(&self) -> Vec<StateId> {
        self.inner.states.borrow().keys().copied().collect()
    }

    /// Subscribe to `state` (idempotent).
    pub(crate) fn track(&self, state: &State) {
        state.listener(self);
    }

    /// Component side of a cell subscription; the cell side is written by
    /// [`State::listener`].
    pub(crate) fn record_state(&self, state: &State) {
        self.inner
            .states
            .borrow_mut()
            .insert(state.id(), state.clone());
    }

    pub(crate) fn forget_state(&self, state: StateId) {
        self.inner.states.borrow_mut().shift_remove(&state);
    }

    /// Unsubscribe from every tracked cell.
    pub(crate) fn release_states(&self) {
        let states: Vec<State> = self.inner.states.borrow_mut().drain(..).map(|(_, s)| s).collect();
        let key = crate::reactive::ListenerKey::Component(self.id());
        for state in states {
            state.off(&key);
        }
    }

    // -- markup -------------------------------------------------------------

    pub(crate) fn is_own_root(&self, dom: &crate::dom::Dom, node: NodeId) -> bool {
        dom.tag(node) == Some(self.tag_name())
            && dom
                .attribute(node, "uid")
                .and_then(ComponentId::parse)
                == Some(self.id())
    }

    /// Connected roots, in tree order.
    pub fn markup(&self) -> Vec<NodeId> {
        let Ok(cx) = self.context() else {
            return Vec::new();
        };
        let dom = cx.dom();
        let roots = dom
            .descendants(dom.document())
            .into_iter()
            .filter(|&n| self.is_own_root(&dom, n))
            .collect();
        roots
    }

    /// Every live root, attached or not.
    pub fn all_markup(&self) -> Vec<NodeId> {
        let Ok(cx) = self.context() else {
            return Vec::new();
        };
        let dom = cx.dom();
        let roots = dom.query_all(|n, _| self.is_own_root(&dom, n));
        roots
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.inner.id.0)
            .field("name", &self.inner.name)
            .field("mounted", &self.is_mounted())
            .field("unmounted", &self.is_unmounted())
            .finish()
    }
}
