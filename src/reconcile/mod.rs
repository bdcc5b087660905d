//! In-place reconciliation of two live subtrees.
//!
//! `reconcile(incoming, current)` patches `current` until it is structurally
//! equal to `incoming`, keeping every element whose tag still matches. Nodes
//! of `incoming` that are used wholesale are moved into `current`; whatever
//! is left of `incoming` belongs to the caller.

use crate::core::context::Context;
use crate::dom::{NodeData, NodeId};

/// How two nodes relate before patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// The incoming node is text; it always replaces.
    IncomingText,
    /// Two elements with the same tag and namespace.
    SameElement,
    /// Anything else: different tags or node kinds.
    Different,
}

impl Context {
    /// Patch `current` to match `incoming`.
    ///
    /// Returns `true` when the tree changed structurally: a node was replaced
    /// or children were patched, added or removed. Returns `false` when the
    /// nodes were already equal, or became equal after attribute updates.
    pub fn reconcile(&self, incoming: NodeId, current: NodeId) -> bool {
        let shape = {
            let dom = self.dom();
            match (dom.get(incoming), dom.get(current)) {
                (None, _) | (_, None) => return false,
                (Some(NodeData::Text(_)), _) => Shape::IncomingText,
                (Some(NodeData::Element(a)), Some(NodeData::Element(b)))
                    if a.tag == b.tag && a.namespace == b.namespace =>
                {
                    Shape::SameElement
                }
                _ => Shape::Different,
            }
        };

        if shape == Shape::IncomingText {
            self.replace(current, incoming);
            return true;
        }

        self.transfer_listeners(incoming, current);
        self.transfer_methods(incoming, current);

        if self.dom().is_equal_node(incoming, current) {
            return false;
        }
        if shape == Shape::Different {
            self.replace(current, incoming);
            return true;
        }

        self.replace_attributes(current, incoming);
        if self.dom().is_equal_node(incoming, current) {
            return false;
        }

        self.reconcile_children(incoming, current);
        true
    }

    /// Walk both child lists with separate cursors.
    ///
    /// A wholesale replace moves the incoming child into `current`, which
    /// shortens the incoming list; the incoming cursor only advances when
    /// the list kept its length.
    fn reconcile_children(&self, incoming: NodeId, current: NodeId) {
        let current_len = self.dom().children(current).len();
        let mut incoming_len = self.dom().children(incoming).len();
        let (mut i, mut j) = (0, 0);

        while i < current_len && j < incoming_len {
            let pair = {
                let dom = self.dom();
                let pair = dom
                    .children(incoming)
                    .get(j)
                    .copied()
                    .zip(dom.children(current).get(i).copied());
                pair
            };
            let Some((next, existing)) = pair else {
                break;
            };
            self.reconcile(next, existing);

            let before = incoming_len;
            incoming_len = self.dom().children(incoming).len();
            if before == incoming_len {
                j += 1;
            }
            i += 1;
        }

        // excess on the current side
        loop {
            let extra = self.dom().children(current).get(i).copied();
            let Some(node) = extra else {
                break;
            };
            self.dom_mut().detach(node);
            self.discard(node);
        }

        // remainder of the incoming side
        loop {
            let extra = self.dom().children(incoming).get(j).copied();
            let Some(node) = extra else {
                break;
            };
            let moved = self.dom_mut().append_child(current, node);
            if let Err(e) = moved {
                tracing::error!(error = %e, "failed to move node during reconciliation");
                break;
            }
        }
    }

    /// Swap `current` for `incoming` in `current`'s parent.
    ///
    /// The old subtree loses its listeners and methods right away and is
    /// disposed on the next tick.
    pub(crate) fn replace(&self, current: NodeId, incoming: NodeId) {
        let parent = self.dom().parent(current);
        let Some(parent) = parent else {
            tracing::error!(node = ?current, "cannot replace a node that has no parent");
            return;
        };
        self.strip_side_tables(current);
        let swapped = self.dom_mut().replace_child(parent, incoming, current);
        match swapped {
            Ok(()) => self.discard(current),
            Err(e) => tracing::error!(node = ?current, error = %e, "replace failed"),
        }
    }

    fn strip_side_tables(&self, root: NodeId) {
        let nodes = self.dom().walk_depth_first(root);
        let mut repository = self.repository_mut();
        let mut dom = self.dom_mut();
        for node in nodes {
            repository.remove_listeners(node);
            repository.remove_methods(node);
            dom.clear_event_listeners(node);
        }
    }

    /// Copy `incoming`'s logical listeners onto `current`, dropping the old
    /// ones. One native listener per event type is re-attached.
    fn transfer_listeners(&self, incoming: NodeId, current: NodeId) {
        let map = self.repository().all_listeners(incoming);
        let events: Vec<String> = map.keys().cloned().collect();
        self.repository_mut().set_listeners(current, map);
        let mut dom = self.dom_mut();
        dom.clear_event_listeners(current);
        for event in &events {
            dom.add_event_listener(current, event);
        }
    }

    fn transfer_methods(&self, incoming: NodeId, current: NodeId) {
        let map = self.repository().all_methods(incoming);
        self.repository_mut().set_methods(current, map);
    }

    /// Make `current`'s attribute set equal to `incoming`'s.
    fn replace_attributes(&self, current: NodeId, incoming: NodeId) {
        let (remove, set) = {
            let dom = self.dom();
            let wanted = dom.attributes(incoming);
            let present = dom.attributes(current);
            let remove: Vec<String> = present
                .iter()
                .filter(|(name, _)| !wanted.iter().any(|(n, _)| n == name))
                .map(|(name, _)| name.clone())
                .collect();
            let set: Vec<(String, String)> = wanted
                .iter()
                .filter(|(name, value)| dom.attribute(current, name) != Some(value.as_str()))
                .cloned()
                .collect();
            (remove, set)
        };

        let mut dom = self.dom_mut();
        for name in remove {
            dom.remove_attribute(current, &name);
        }
        for (name, value) in set {
            if let Err(e) = dom.set_attribute(current, &name, value) {
                tracing::error!(attribute = %name, error = %e, "failed to copy attribute");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::markup::Attrs;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn build(cx: &Context, html: &[(&str, &str, &str)]) -> NodeId {
        let parent = cx.element("section", &[]).unwrap();
        for (tag, class, text) in html {
            cx.element(tag, &args![Attrs::new().parent(parent).class(*class), *text])
                .unwrap();
        }
        parent
    }

    // ── Basics ──────────────────────────────────────────────────────

    #[test]
    fn same_tag_is_patched_in_place() {
        let cx = Context::new();
        let host = cx.element("main", &[]).unwrap();
        let current = cx
            .element("div", &args![Attrs::new().parent(host).class("a"), "x"])
            .unwrap();
        let incoming = cx.element("div", &args![Attrs::new().class("b"), "y"]).unwrap();

        assert!(cx.reconcile(incoming, current));

        let dom = cx.dom();
        assert_eq!(dom.children(host), &[current]);
        assert_eq!(dom.attribute(current, "class"), Some("b"));
        assert_eq!(dom.text_content(current), "y");
    }

    #[test]
    fn equal_nodes_report_no_change() {
        let cx = Context::new();
        let a = cx.element("p", &args![Attrs::new().id("k"), "same"]).unwrap();
        let b = cx.element("p", &args![Attrs::new().id("k"), "same"]).unwrap();
        assert!(!cx.reconcile(b, a));
    }

    #[test]
    fn attribute_only_change_is_not_structural() {
        let cx = Context::new();
        let a = cx.element("p", &args![Attrs::new().attr("title", "old"), "t"]).unwrap();
        let b = cx.element("p", &args![Attrs::new().attr("lang", "en"), "t"]).unwrap();
        assert!(!cx.reconcile(b, a));
        let dom = cx.dom();
        assert_eq!(dom.attributes(a), &[("lang".to_owned(), "en".to_owned())]);
    }

    #[test]
    fn different_tag_replaces() {
        let cx = Context::new();
        let host = cx.element("main", &[]).unwrap();
        let current = cx.element("div", &args![Attrs::new().parent(host)]).unwrap();
        let incoming = cx.element("span", &[]).unwrap();
        assert!(cx.reconcile(incoming, current));
        assert_eq!(cx.dom().children(host), &[incoming]);
    }

    #[test]
    fn replace_without_parent_is_logged_not_fatal() {
        let cx = Context::new();
        let current = cx.element("div", &[]).unwrap();
        let incoming = cx.element("span", &[]).unwrap();
        assert!(cx.reconcile(incoming, current));
        assert!(cx.dom().parent(incoming).is_none());
    }

    // ── Children ────────────────────────────────────────────────────

    #[test]
    fn children_grow_and_shrink() {
        let cx = Context::new();
        let current = build(&cx, &[("li", "a", "1")]);
        let incoming = build(&cx, &[("li", "a", "1"), ("li", "b", "2"), ("li", "c", "3")]);
        let kept = cx.dom().children(current)[0];
        let oracle = build(&cx, &[("li", "a", "1"), ("li", "b", "2"), ("li", "c", "3")]);
        cx.reconcile(incoming, current);
        assert!(cx.dom().is_equal_node(current, oracle));
        assert_eq!(cx.dom().children(current)[0], kept);

        let shorter = build(&cx, &[("li", "z", "9")]);
        cx.reconcile(shorter, current);
        assert_eq!(cx.dom().inner_html(current), r#"<li class="z">9</li>"#);
        assert_eq!(cx.dom().children(current), &[kept]);
    }

    #[test]
    fn replaced_child_does_not_skip_its_sibling() {
        let cx = Context::new();
        let current = build(&cx, &[("p", "x", "1"), ("p", "y", "2")]);
        let incoming = build(&cx, &[("h1", "x", "1"), ("p", "y", "3")]);
        cx.reconcile(incoming, current);
        assert_eq!(
            cx.dom().inner_html(current),
            r#"<h1 class="x">1</h1><p class="y">3</p>"#
        );
    }

    // ── Side tables ─────────────────────────────────────────────────

    #[test]
    fn listeners_and_methods_move_to_the_kept_node() {
        let cx = Context::new();
        let current = cx
            .element(
                "button",
                &args![Attrs::new()
                    .on("click", |_, _| Ok(()))
                    .on("focus", |_, _| Ok(()))
                    .method("old", |_, _, _| Ok(Value::Null))],
            )
            .unwrap();
        let incoming = cx
            .element(
                "button",
                &args![Attrs::new()
                    .on("click", |_, _| Ok(()))
                    .method("new", |_, _, _| Ok(Value::Null))],
            )
            .unwrap();

        cx.reconcile(incoming, current);

        assert_eq!(cx.repository().listener_events(current), vec!["click"]);
        assert_eq!(cx.dom().event_listener_count(current, "click"), 1);
        assert!(!cx.dom().has_event_listener(current, "focus"));
        assert_eq!(cx.methods(current), vec!["new"]);
    }

    #[test]
    fn replaced_subtree_loses_its_side_tables() {
        let cx = Context::new();
        let host = cx.element("main", &[]).unwrap();
        let current = cx
            .element("div", &args![Attrs::new().parent(host).on("click", |_, _| Ok(()))])
            .unwrap();
        let incoming = cx.element("span", &[]).unwrap();
        cx.reconcile(incoming, current);
        assert!(cx.repository().listener_events(current).is_empty());
    }
}
