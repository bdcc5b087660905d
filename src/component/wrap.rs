//! `wrap`: the render pipeline of a component.
//!
//! An initial call renders into a fresh root element `ojs-<kebab-name>`
//! marked with the instance id (`uid`), the key of the stored arguments
//! (`key`), the component class and one `s-<id>` attribute per cell argument.
//! A call whose last argument is a [`StateChange`](crate::StateChange)
//! re-renders every root subscribed to that cell in place.

use crate::component::lifecycle::{set_display_none, LifecycleEvent};
use crate::component::Component;
use crate::core::context::Context;
use crate::dom::NodeId;
use crate::error::Result;
use crate::markup::{Arg, Attrs, Markup, Placement, FRAGMENT_TAG};
use crate::reactive::{State, StateId};

impl Component {
    /// Render (or re-render) the component with `args`.
    pub fn wrap(&self, args: &[Arg]) -> Result<Markup> {
        let cx = self.context()?;
        if let Some(Arg::Signature(change)) = args.last() {
            self.rerender(&cx, change.state)?;
            return Ok(Markup::Nodes(Vec::new()));
        }
        self.render_fresh(&cx, args)
    }

    // -----------------------------------------------------------------------
    // Initial render
    // -----------------------------------------------------------------------

    fn render_fresh(&self, cx: &Context, args: &[Arg]) -> Result<Markup> {
        let mut placement = Placement::default();
        let mut states: Vec<State> = Vec::new();
        let mut stored = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::State(state) => {
                    states.push(state.clone());
                    stored.push(arg.clone());
                }
                Arg::Attrs(attrs) if attrs.placement().is_set() => {
                    let mut attrs = attrs.clone();
                    placement = attrs.take_placement();
                    stored.push(Arg::Attrs(attrs));
                }
                other => stored.push(other.clone()),
            }
        }
        // an unmounted instance still renders but stays out of the repository
        let live = !self.is_unmounted();
        if live {
            for state in &states {
                self.track(state);
            }
        }

        let mut event = LifecycleEvent::Rendered;
        if let Some(parent) = placement.parent {
            if placement.reset || placement.replace {
                self.forget_roots_in(cx, parent);
                if cx.repository().args_count(self.id()) > 0 {
                    event = LifecycleEvent::Rerendered;
                }
            }
        }

        let key = cx.next_args_key().to_string();
        if live {
            cx.repository_mut()
                .store_args(self.id(), key.clone(), stored.clone());
        }

        let markup = match self.inner.render.render(cx, &stored) {
            Ok(markup) => markup,
            Err(e) => {
                cx.repository_mut().remove_args(self.id(), &key);
                return Err(e);
            }
        };

        if let Some(children) = fragment_children(cx, &markup) {
            cx.repository_mut().remove_args(self.id(), &key);
            let children = unwrap_fragments(cx, children);
            attach_all(cx, &children, placement)?;
            return Ok(match children.as_slice() {
                [single] => Markup::Node(*single),
                _ => Markup::Nodes(children),
            });
        }

        let params: Vec<Arg> = markup.nodes().into_iter().map(Arg::Node).collect();
        let mut root_attrs = Attrs::new()
            .attr("uid", self.id().as_u64())
            .attr("key", key)
            .class(cx.config().component_class.clone());
        for state in &states {
            root_attrs = root_attrs.attr(format!("s-{}", state.id()), state.id().as_u64());
        }
        if !self.is_visible() {
            root_attrs = root_attrs.attr("style", "display: none;");
        }
        root_attrs.placement = placement;
        if live {
            root_attrs = root_attrs.emit(self, event.as_str()).event_params(params);
        }

        let built = cx.element(self.tag_name(), &[Arg::Attrs(root_attrs), Arg::from(markup)])?;

        // a replace that patched the parent in place leaves the built root
        // detached; the parent is the live root then
        let root = match placement.parent {
            Some(parent) if placement.replace && cx.dom().parent(built).is_none() => parent,
            _ => built,
        };

        if live && !self.is_mounted() && cx.dom().is_connected(root) {
            self.emit_lifecycle(LifecycleEvent::Mounted, vec![Arg::Node(root)]);
            self.mount_nested(cx, root);
        }
        Ok(Markup::Node(root))
    }

    /// Drop stored arguments of this instance's roots at or under `parent`.
    fn forget_roots_in(&self, cx: &Context, parent: NodeId) {
        let keys: Vec<String> = {
            let dom = cx.dom();
            let mut nodes = dom.descendants(parent);
            nodes.push(parent);
            let keys = nodes
                .into_iter()
                .filter(|&n| self.is_own_root(&dom, n))
                .filter_map(|n| dom.attribute(n, "key").map(str::to_owned))
                .collect();
            keys
        };
        let mut repository = cx.repository_mut();
        for key in keys {
            repository.remove_args(self.id(), &key);
        }
    }

    /// Emit `mounted` on connected nested components that have not seen it.
    pub(crate) fn mount_nested(&self, cx: &Context, root: NodeId) {
        for nested in cx.nested_components(root) {
            if nested.id() != self.id() && !nested.is_mounted() && !nested.is_unmounted() {
                nested.emit_lifecycle(LifecycleEvent::Mounted, vec![Arg::Node(root)]);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Re-render
    // -----------------------------------------------------------------------

    fn rerender(&self, cx: &Context, state: StateId) -> Result<()> {
        if self.is_unmounted() {
            tracing::debug!(component = %self.name(), state = %state, "ignoring change for unmounted component");
            return Ok(());
        }
        let marker = format!("s-{state}");
        let roots: Vec<NodeId> = {
            let dom = cx.dom();
            let roots = dom.query_all(|n, _| self.is_own_root(&dom, n) && dom.has_attribute(n, &marker));
            roots
        };
        tracing::trace!(component = %self.name(), state = %state, roots = roots.len(), "rerender");

        for root in roots {
            if !cx.dom().contains(root) {
                continue;
            }
            if !self.is_visible() {
                set_display_none(&mut cx.dom_mut(), root, true);
            }
            let key = cx.dom().attribute(root, "key").map(str::to_owned);
            let args = key
                .as_deref()
                .and_then(|k| cx.repository().args(self.id(), k).cloned());
            let Some(args) = args else {
                tracing::debug!(component = %self.name(), key = ?key, "no stored arguments for root");
                continue;
            };

            let markup = self.inner.render.render(cx, &args)?;
            let nodes = unwrap_fragments(cx, markup.nodes());

            let empty = cx.dom().children(root).is_empty();
            if empty {
                let mut dom = cx.dom_mut();
                for node in nodes {
                    dom.append_child(root, node)?;
                }
            } else {
                let shell = {
                    let mut dom = cx.dom_mut();
                    let shell = dom.clone_node(root, false)?;
                    for node in nodes {
                        dom.append_child(shell, node)?;
                    }
                    shell
                };
                cx.reconcile(shell, root);
                cx.dispose_subtrees(&[shell]);
            }

            cx.emit_tree(root, self, LifecycleEvent::Rerendered.as_str(), vec![Arg::Node(root)]);
            if cx.dom().is_connected(root) {
                self.mount_nested(cx, root);
            }
        }

        if cx.config().sweep_after_rerender {
            cx.schedule_sweep();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fragment helpers
// ---------------------------------------------------------------------------

/// Children of a non-empty fragment marker.
fn fragment_children(cx: &Context, markup: &Markup) -> Option<Vec<NodeId>> {
    let node = markup.node()?;
    let dom = cx.dom();
    if dom.tag(node) != Some(FRAGMENT_TAG) || dom.children(node).is_empty() {
        return None;
    }
    Some(vec![node])
}

/// Replace fragment markers by their children, detaching them.
fn unwrap_fragments(cx: &Context, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let is_marker = cx.dom().tag(node) == Some(FRAGMENT_TAG);
        if !is_marker {
            out.push(node);
            continue;
        }
        let children = cx.dom().children(node).to_vec();
        {
            let mut dom = cx.dom_mut();
            for &child in &children {
                dom.detach(child);
            }
            dom.detach(node);
        }
        cx.discard(node);
        out.extend(children);
    }
    out
}

fn attach_all(cx: &Context, nodes: &[NodeId], placement: Placement) -> Result<()> {
    let Some(parent) = placement.parent else {
        return Ok(());
    };
    let mut dom = cx.dom_mut();
    if placement.reset || placement.replace {
        dom.clear_children(parent);
    }
    if placement.first {
        let reference = dom.first_child(parent);
        for &node in nodes {
            dom.insert_before(parent, node, reference)?;
        }
    } else {
        for &node in nodes {
            dom.append_child(parent, node)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::value::json;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter(cx: &Context) {
        cx.register_fn("Counter", |cx, args| {
            let state = args.iter().find_map(Arg::as_state).cloned();
            let value = state.map(|s| s.get()).unwrap_or_default();
            cx.handle("div", &args![value])
        });
    }

    #[test]
    fn initial_render_marks_the_root() {
        let cx = Context::new();
        counter(&cx);
        let count = cx.state(0);
        let body = cx.body();
        let root = cx
            .handle("Counter", &args![&count, Attrs::new().parent(body)])
            .unwrap()
            .node()
            .unwrap();
        let c = cx.component("Counter").unwrap();
        let dom = cx.dom();
        assert_eq!(dom.tag(root), Some("ojs-counter"));
        assert_eq!(dom.attribute(root, "uid"), Some(c.id().to_string().as_str()));
        assert!(dom.has_attribute(root, &format!("s-{}", count.id())));
        assert!(dom.has_class(root, "__ojs-c-class__"));
        assert_eq!(dom.inner_html(root), "<div>0</div>");
        assert!(c.is_rendered());
        assert!(c.is_mounted());
        assert_eq!(c.states(), vec![count.id()]);
    }

    #[test]
    fn cell_change_patches_in_place() {
        let cx = Context::new();
        counter(&cx);
        let count = cx.state(0);
        let body = cx.body();
        let root = cx
            .handle("Counter", &args![&count, Attrs::new().parent(body)])
            .unwrap()
            .node()
            .unwrap();
        let div = cx.dom().children(root)[0];

        count.set(1);

        let dom = cx.dom();
        assert_eq!(dom.children(root), &[div]);
        assert_eq!(dom.outer_html(div), "<div>1</div>");
        assert_eq!(dom.children(body), &[root]);
    }

    #[test]
    fn rerender_into_empty_root_appends() {
        let cx = Context::new();
        let text = cx.state("a");
        cx.register_fn("Maybe", |cx, args| {
            let state = args.iter().find_map(Arg::as_state).cloned();
            let show = state.map(|s| s.get() != json!("")).unwrap_or(false);
            if show {
                cx.handle("b", &args!["shown"])
            } else {
                cx.handle("_", &[])
            }
        });
        let root = cx.handle("Maybe", &args![&text]).unwrap().node().unwrap();
        cx.dom_mut().clear_children(root);
        text.set("b");
        assert_eq!(cx.dom().inner_html(root), "<b>shown</b>");
    }

    #[test]
    fn fragment_render_returns_children() {
        let cx = Context::new();
        cx.register_fn("Pair", |cx, _| {
            let a = cx.element("dt", &[])?;
            let b = cx.element("dd", &[])?;
            cx.handle("_", &args![a, b])
        });
        let body = cx.body();
        let markup = cx.handle("Pair", &args![Attrs::new().parent(body)]).unwrap();
        assert_eq!(markup.nodes().len(), 2);
        assert_eq!(cx.dom().inner_html(body), "<dt></dt><dd></dd>");
        assert!(!cx.component("Pair").unwrap().is_rendered());
    }

    #[test]
    fn rerendered_event_and_visibility_survive() {
        let cx = Context::new();
        counter(&cx);
        let count = cx.state(0);
        let root = cx
            .handle("Counter", &args![&count, Attrs::new().parent(cx.body())])
            .unwrap()
            .node()
            .unwrap();
        let c = cx.component("Counter").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        c.on("rerendered", move |_, e| {
            l.borrow_mut().push(e.node());
            Ok(())
        });
        c.hide();
        count.set(5);
        assert_eq!(*log.borrow(), vec![Some(root)]);
        assert!(c.is_rerendered());
        assert_eq!(cx.dom().attribute(root, "style"), Some("display: none;"));
        assert_eq!(cx.dom().text_content(root), "5");
    }

    #[test]
    fn render_error_propagates_and_forgets_args() {
        let cx = Context::new();
        cx.register_fn("Broken", |_, _| Err(crate::Error::render("Broken", "nope")));
        let err = cx.handle("Broken", &[]).unwrap_err();
        assert_eq!(err, crate::Error::render("Broken", "nope"));
        let c = cx.component("Broken").unwrap();
        assert_eq!(cx.repository().args_count(c.id()), 0);
    }

    #[test]
    fn unmounted_wrap_renders_without_registering() {
        let cx = Context::new();
        counter(&cx);
        let count = cx.state(1);
        let body = cx.body();
        cx.handle("Counter", &args![&count, Attrs::new().parent(body)])
            .unwrap();
        let c = cx.component("Counter").unwrap();
        assert!(c.unmount());
        cx.tick();

        let root = c
            .wrap(&args![&count, Attrs::new().parent(body)])
            .unwrap()
            .node()
            .unwrap();
        cx.tick();

        assert_eq!(cx.dom().inner_html(root), "<div>1</div>");
        assert_eq!(cx.repository().args_count(c.id()), 0);
        assert!(!c.is_mounted());
        assert!(c.is_unmounted());
        assert!(c.states().is_empty());
        assert_eq!(count.listener_count(), 0);
        assert_eq!(cx.repository().component_count(), 0);
    }
}
