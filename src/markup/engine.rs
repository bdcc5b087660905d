//! The builder proper: `handle`, element construction, placement and
//! placeholders.

use crate::component::{Component, ComponentId};
use crate::core::context::Context;
use crate::dom::{Namespace, NodeId};
use crate::error::{Error, Result};
use crate::markup::{Arg, Attrs, Placement};
use crate::reactive::State;
use crate::value::{kebab, to_attribute, to_text, Value};

/// Tag of the transparent grouping element. A component whose render
/// returns one contributes its children instead.
pub const FRAGMENT_TAG: &str = "ojs-special-fragment";

/// Names starting with this prefix build SVG elements.
pub const SVG_PREFIX: char = '$';

/// Suffix of placeholder tags, after the kebab-cased component name.
pub const PLACEHOLDER_SUFFIX: &str = "-tmp--";

/// Result of a builder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Node(NodeId),
    /// Several top-level nodes, from a fragment-returning component.
    Nodes(Vec<NodeId>),
}

impl Markup {
    /// The single node, if this is one.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Markup::Node(id) => Some(*id),
            Markup::Nodes(_) => None,
        }
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Markup::Node(id) => vec![*id],
            Markup::Nodes(ids) => ids.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Markup::Nodes(ids) if ids.is_empty())
    }
}

impl From<NodeId> for Markup {
    fn from(id: NodeId) -> Self {
        Markup::Node(id)
    }
}

impl From<Markup> for Arg {
    fn from(markup: Markup) -> Self {
        match markup {
            Markup::Node(id) => Arg::Node(id),
            Markup::Nodes(ids) => Arg::List(ids.into_iter().map(Arg::Node).collect()),
        }
    }
}

/// Component emission collected from attribute bags.
struct PendingEmit {
    component: Component,
    event: String,
    params: Vec<Arg>,
}

fn resolve_tag(name: &str) -> (String, Namespace) {
    if name.chars().all(|c| c == '_' || c == '$') {
        return (FRAGMENT_TAG.to_owned(), Namespace::Html);
    }
    match name.strip_prefix(SVG_PREFIX) {
        Some(rest) => (rest.to_owned(), Namespace::Svg),
        None => (name.to_owned(), Namespace::Html),
    }
}

impl Context {
    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Build markup for `name`.
    ///
    /// Registered components are obtained (or constructed) and wrapped.
    /// Capitalized names that are not registered yield a placeholder that
    /// the component's `mount` later replaces. Anything else is an element;
    /// names made only of `_`/`$` build the fragment marker and a leading `$`
    /// selects the SVG namespace.
    pub fn handle(&self, name: &str, args: &[Arg]) -> Result<Markup> {
        if name.is_empty() {
            return Err(Error::InvalidName(name.to_owned()));
        }
        if let Some(component) = self.obtain(name) {
            tracing::trace!(component = %name, "materializing component");
            return component.wrap(args);
        }
        if name.starts_with(|c: char| c.is_uppercase()) {
            tracing::debug!(component = %name, "component not registered yet, deferring");
            return self.placeholder(name, args).map(Markup::Node);
        }
        let (tag, namespace) = resolve_tag(name);
        self.build(&tag, namespace, args).map(Markup::Node)
    }

    /// Build a plain element, never resolving components.
    pub fn element(&self, name: &str, args: &[Arg]) -> Result<NodeId> {
        if name.is_empty() {
            return Err(Error::InvalidName(name.to_owned()));
        }
        let (tag, namespace) = resolve_tag(name);
        self.build(&tag, namespace, args)
    }

    /// Element `outer` whose only child is `text`, after `args` are applied.
    pub fn from_html_text(&self, text: &str, outer: &str, args: &[Arg]) -> Result<NodeId> {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.extend_from_slice(args);
        all.push(Arg::from(text));
        self.element(outer, &all)
    }

    /// Render a cell through `render` inside an auto-registered component.
    ///
    /// The component re-renders whenever the cell fires. Extra `args` are
    /// applied to the `ojs-wrapper` element.
    pub fn anonymous(
        &self,
        state: &State,
        render: impl Fn(&Context, &State) -> Result<Arg> + 'static,
        args: &[Arg],
    ) -> Result<Markup> {
        let name = format!("Anonym{}", self.next_anonymous());
        let component_name = name.clone();
        self.register_fn(name.clone(), move |cx, args| {
            let Some(state) = args.iter().find_map(Arg::as_state).cloned() else {
                return Err(Error::render(&component_name, "no state argument"));
            };
            let inner = render(cx, &state)?;
            let mut call = vec![inner];
            call.extend(
                args.iter()
                    .filter(|a| !matches!(a, Arg::State(s) if *s == state))
                    .cloned(),
            );
            cx.element("ojs-wrapper", &call).map(Markup::Node)
        });
        let component = self.run(&name)?;
        component.set_anonymous();
        let mut call = vec![Arg::State(state.clone())];
        call.extend_from_slice(args);
        component.wrap(&call)
    }

    // -----------------------------------------------------------------------
    // Element construction
    // -----------------------------------------------------------------------

    fn build(&self, tag: &str, namespace: Namespace, args: &[Arg]) -> Result<NodeId> {
        let root = self.dom_mut().create_element_ns(tag, namespace)?;
        let mut placement = Placement::default();
        let mut emit = None;
        if let Err(e) = self.fill(root, args, &mut placement, &mut emit) {
            self.release_children(root, args);
            self.discard(root);
            return Err(e);
        }
        self.place(root, placement)?;
        if let Some(PendingEmit {
            component,
            event,
            params,
        }) = emit
        {
            self.emit_tree(root, &component, &event, params);
        }
        Ok(root)
    }

    fn fill(
        &self,
        root: NodeId,
        args: &[Arg],
        placement: &mut Placement,
        emit: &mut Option<PendingEmit>,
    ) -> Result<()> {
        for arg in Arg::flatten(args) {
            match arg {
                Arg::Node(child) => self.dom_mut().append_child(root, child)?,
                Arg::State(state) => self.append_text(root, state.to_string())?,
                Arg::Value(Value::Null) | Arg::Signature(_) | Arg::List(_) => {}
                Arg::Value(value) => self.append_text(root, to_text(&value))?,
                Arg::Attrs(attrs) => self.apply_attrs(root, attrs, placement, emit)?,
            }
        }
        Ok(())
    }

    /// Detach the nodes the caller passed in from a root about to be
    /// discarded, so they outlive it.
    fn release_children(&self, root: NodeId, args: &[Arg]) {
        let mut dom = self.dom_mut();
        for arg in Arg::flatten(args) {
            if let Arg::Node(child) = arg {
                if dom.parent(child) == Some(root) {
                    dom.detach(child);
                }
            }
        }
    }

    fn append_text(&self, parent: NodeId, text: String) -> Result<()> {
        let mut dom = self.dom_mut();
        let node = dom.create_text(text);
        dom.append_child(parent, node)
    }

    /// Apply one attribute bag to `node`.
    ///
    /// Directives are collected into `placement` and `emit`; attribute,
    /// listener and method entries are written immediately.
    fn apply_attrs(
        &self,
        node: NodeId,
        attrs: Attrs,
        placement: &mut Placement,
        emit: &mut Option<PendingEmit>,
    ) -> Result<()> {
        let Attrs {
            attributes,
            placement: bag,
            event,
            event_params,
            component,
            listeners,
            methods,
        } = attrs;

        if bag.parent.is_some() {
            placement.parent = bag.parent;
        }
        placement.reset |= bag.reset;
        placement.replace |= bag.replace;
        placement.first |= bag.first;
        placement.reconcile |= bag.reconcile;

        if let (Some(component), Some(event)) = (component, event) {
            *emit = Some(PendingEmit {
                component,
                event,
                params: event_params,
            });
        }

        {
            let mut dom = self.dom_mut();
            for (name, value) in &attributes {
                let name = name.replace('_', "-");
                let mut text = to_attribute(value);
                if name.eq_ignore_ascii_case("class") {
                    if let Some(existing) = dom.attribute(node, "class").filter(|c| !c.is_empty()) {
                        text = format!("{existing} {text}");
                    }
                }
                if let Err(e) = dom.set_attribute(node, &name, text) {
                    tracing::error!(attribute = %name, attributes = ?attributes, error = %e, "failed to apply attribute");
                    return Err(e);
                }
            }
        }

        if !listeners.is_empty() || !methods.is_empty() {
            let mut repository = self.repository_mut();
            let mut dom = self.dom_mut();
            for (event, handler) in listeners {
                repository.add_listener(node, &event, handler);
                dom.add_event_listener(node, &event);
            }
            for (name, method) in methods {
                repository.set_method(node, &name, method);
            }
        }
        Ok(())
    }

    /// Attach `root` according to the placement directives.
    fn place(&self, root: NodeId, placement: Placement) -> Result<()> {
        let Some(parent) = placement.parent else {
            return Ok(());
        };
        if !self.dom().contains(parent) {
            return Err(Error::UnknownNode);
        }
        if placement.reset {
            self.dom_mut().clear_children(parent);
        }
        if placement.replace {
            self.reconcile(root, parent);
            self.discard_if_detached(root);
        } else if placement.reconcile {
            let shell = {
                let mut dom = self.dom_mut();
                let shell = dom.clone_node(parent, false)?;
                dom.append_child(shell, root)?;
                shell
            };
            self.reconcile(shell, parent);
            self.discard(shell);
        } else if placement.first {
            self.dom_mut().prepend_child(parent, root)?;
        } else {
            self.dom_mut().append_child(parent, root)?;
        }
        Ok(())
    }

    fn discard_if_detached(&self, node: NodeId) {
        let detached = {
            let dom = self.dom();
            dom.contains(node) && dom.parent(node).is_none()
        };
        if detached {
            self.discard(node);
        }
    }

    // -----------------------------------------------------------------------
    // Placeholders
    // -----------------------------------------------------------------------

    /// Placeholder for a component that is not registered yet.
    fn placeholder(&self, name: &str, args: &[Arg]) -> Result<NodeId> {
        let kebab = kebab(name);
        let key = format!("ojs-{kebab}-{}", self.next_placeholder());
        let node = {
            let mut dom = self.dom_mut();
            let node = dom.create_element(&format!("ojs-{kebab}{PLACEHOLDER_SUFFIX}"))?;
            dom.set_attribute(node, "ojs-key", key.clone())?;
            dom.set_attribute(node, "class", self.config().component_class.clone())?;
            node
        };

        let mut placement = Placement::default();
        let mut emit = None;
        let mut stored = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Attrs(attrs) => {
                    let visible = Attrs {
                        listeners: Vec::new(),
                        methods: Vec::new(),
                        component: None,
                        event: None,
                        ..attrs.clone()
                    };
                    if let Err(e) = self.apply_attrs(node, visible, &mut placement, &mut emit) {
                        self.discard(node);
                        return Err(e);
                    }
                    stored.push(Arg::Attrs(attrs.without_directives()));
                }
                other => stored.push(other.clone()),
            }
        }
        self.repository_mut().store_placeholder(key, stored);
        self.place(node, placement)?;
        Ok(node)
    }

    // -----------------------------------------------------------------------
    // Component event propagation
    // -----------------------------------------------------------------------

    /// Components whose roots sit strictly inside `root`, in tree order.
    pub(crate) fn nested_components(&self, root: NodeId) -> Vec<Component> {
        let ids: Vec<ComponentId> = {
            let dom = self.dom();
            let class = &self.config().component_class;
            let mut ids: Vec<ComponentId> = Vec::new();
            for node in dom.descendants(root) {
                if !dom.has_class(node, class) {
                    continue;
                }
                if let Some(id) = dom.attribute(node, "uid").and_then(ComponentId::parse) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
            ids
        };
        ids.into_iter()
            .filter_map(|id| self.component_by_id(id))
            .collect()
    }

    /// Emit on `component`, then on every component nested under `root`.
    pub(crate) fn emit_tree(&self, root: NodeId, component: &Component, event: &str, params: Vec<Arg>) {
        component.emit(event, params.clone());
        for nested in self.nested_components(root) {
            if nested.id() != component.id() {
                nested.emit(event, params.clone());
            }
        }
    }
}
