//! Attribute bags: plain attributes plus builder directives.

use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::core::context::Context;
use crate::core::repository::{EventHandler, NodeMethod};
use crate::dom::NodeId;
use crate::error::Result;
use crate::event::DomEvent;
use crate::markup::Arg;
use crate::reactive::State;
use crate::value::{is_truthy, Value};

/// Where and how a freshly built element is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub parent: Option<NodeId>,
    /// Clear the parent's children first.
    pub reset: bool,
    /// Reconcile the new element into the parent instead of inserting it.
    pub replace: bool,
    /// Insert as the parent's first child.
    pub first: bool,
    /// Diff a clone of the parent holding only the new element against the
    /// parent.
    pub reconcile: bool,
}

impl Placement {
    pub fn is_set(&self) -> bool {
        self.parent.is_some()
    }
}

/// Attributes and directives for one element.
///
/// Attribute names are written as given except that `_` becomes `-`.
/// Repeated `class` entries accumulate.
#[derive(Clone, Default)]
pub struct Attrs {
    pub(crate) attributes: Vec<(String, Value)>,
    pub(crate) placement: Placement,
    pub(crate) event: Option<String>,
    pub(crate) event_params: Vec<Arg>,
    pub(crate) component: Option<Component>,
    pub(crate) listeners: Vec<(String, EventHandler)>,
    pub(crate) methods: Vec<(String, NodeMethod)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    // -- attributes ---------------------------------------------------------

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Attribute whose value is the current value of a cell.
    pub fn attr_state(self, name: impl Into<String>, state: &State) -> Self {
        self.attr(name, state.get())
    }

    pub fn class(self, value: impl Into<Value>) -> Self {
        self.attr("class", value)
    }

    pub fn id(self, value: impl Into<Value>) -> Self {
        self.attr("id", value)
    }

    // -- placement directives ----------------------------------------------

    /// Attach the element to `parent` once built.
    pub fn parent(mut self, parent: NodeId) -> Self {
        self.placement.parent = Some(parent);
        self
    }

    pub fn reset_parent(mut self, reset: bool) -> Self {
        self.placement.reset = reset;
        self
    }

    /// Reset the parent when the cell's value is truthy.
    pub fn reset_parent_if(self, state: &State) -> Self {
        let reset = state.with(is_truthy);
        self.reset_parent(reset)
    }

    pub fn replace_parent(mut self, replace: bool) -> Self {
        self.placement.replace = replace;
        self
    }

    pub fn first_of_parent(mut self, first: bool) -> Self {
        self.placement.first = first;
        self
    }

    pub fn reconcile_parent(mut self, reconcile: bool) -> Self {
        self.placement.reconcile = reconcile;
        self
    }

    // -- emission directives ------------------------------------------------

    /// Emit `event` on `component` (and nested component roots) after the
    /// element is attached.
    pub fn emit(mut self, component: &Component, event: impl Into<String>) -> Self {
        self.component = Some(component.clone());
        self.event = Some(event.into());
        self
    }

    pub fn event_params(mut self, params: Vec<Arg>) -> Self {
        self.event_params = params;
        self
    }

    // -- behaviour ----------------------------------------------------------

    /// Attach an event handler.
    pub fn on(
        mut self,
        event: impl Into<String>,
        handler: impl Fn(&Context, &DomEvent) -> Result<()> + 'static,
    ) -> Self {
        self.listeners.push((event.into(), Rc::new(handler)));
        self
    }

    /// Attach a named method to the element.
    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&Context, NodeId, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    // -- inspection ---------------------------------------------------------

    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Whether the bag carries only placement directives.
    pub fn is_placement_only(&self) -> bool {
        self.attributes.is_empty()
            && self.listeners.is_empty()
            && self.methods.is_empty()
            && self.event.is_none()
    }

    /// Take the placement directives out of the bag.
    pub(crate) fn take_placement(&mut self) -> Placement {
        std::mem::take(&mut self.placement)
    }

    /// Copy without placement or emission directives. Used when arguments
    /// are stored for a later re-render.
    pub fn without_directives(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            listeners: self.listeners.clone(),
            methods: self.methods.clone(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Attrs");
        s.field("attributes", &self.attributes);
        if self.placement.is_set() {
            s.field("placement", &self.placement);
        }
        if let Some(event) = &self.event {
            s.field("event", event);
        }
        if !self.listeners.is_empty() {
            let events: Vec<&str> = self.listeners.iter().map(|(e, _)| e.as_str()).collect();
            s.field("listeners", &events);
        }
        if !self.methods.is_empty() {
            let names: Vec<&str> = self.methods.iter().map(|(m, _)| m.as_str()).collect();
            s.field("methods", &names);
        }
        s.finish()
    }
}
