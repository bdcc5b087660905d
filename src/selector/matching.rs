//! Selector matching against the DOM arena, right to left.

use super::model::*;
use crate::dom::{Dom, ElementData, Namespace, NodeId};

/// Check whether an element satisfies every component of a compound selector.
pub fn matches_compound(compound: &CompoundSelector, el: &ElementData) -> bool {
    compound.components.iter().all(|component| match component {
        SelectorComponent::Universal => true,
        SelectorComponent::Type(name) => match el.namespace {
            Namespace::Html => el.tag.eq_ignore_ascii_case(name),
            Namespace::Svg => el.tag == *name,
        },
        SelectorComponent::Class(class) => el.has_class(class),
        SelectorComponent::Id(id) => el.attribute("id") == Some(id.as_str()),
        SelectorComponent::Attribute { name, value } => match value {
            Some(expected) => el.attribute(name) == Some(expected.as_str()),
            None => el.has_attribute(name),
        },
    })
}

/// Check whether `node` matches a full selector.
///
/// The rightmost compound must match the node itself; the remaining parts are
/// matched against its ancestors. Descendant combinators backtrack over every
/// candidate ancestor.
pub fn matches_selector(selector: &Selector, node: NodeId, dom: &Dom) -> bool {
    let Some(SelectorPart::Compound(last)) = selector.parts.last() else {
        return false;
    };
    let Some(el) = dom.element(node) else {
        return false;
    };
    matches_compound(last, el) && matches_prefix(&selector.parts[..selector.parts.len() - 1], node, dom)
}

/// Match the parts left of an already-matched node.
fn matches_prefix(parts: &[SelectorPart], node: NodeId, dom: &Dom) -> bool {
    let [rest @ .., SelectorPart::Compound(compound), SelectorPart::Combinator(combinator)] = parts
    else {
        return parts.is_empty();
    };

    match combinator {
        Combinator::Child => dom.parent(node).is_some_and(|parent| {
            dom.element(parent)
                .is_some_and(|el| matches_compound(compound, el))
                && matches_prefix(rest, parent, dom)
        }),
        Combinator::Descendant => dom.ancestors(node).into_iter().any(|ancestor| {
            dom.element(ancestor)
                .is_some_and(|el| matches_compound(compound, el))
                && matches_prefix(rest, ancestor, dom)
        }),
    }
}

/// Check whether `node` matches any selector in the list.
pub fn matches_list(list: &SelectorList, node: NodeId, dom: &Dom) -> bool {
    list.selectors.iter().any(|s| matches_selector(s, node, dom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector_list;

    /// ```text
    /// body
    ///  └─ section.outer
    ///      └─ div#mid
    ///          └─ p.note[data-k="1"]
    /// ```
    fn build() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let section = dom.create_element("section").unwrap();
        dom.set_attribute(section, "class", "outer").unwrap();
        let div = dom.create_element("div").unwrap();
        dom.set_attribute(div, "id", "mid").unwrap();
        let p = dom.create_element("p").unwrap();
        dom.set_attribute(p, "class", "note").unwrap();
        dom.set_attribute(p, "data-k", "1").unwrap();
        let body = dom.body();
        dom.append_child(body, section).unwrap();
        dom.append_child(section, div).unwrap();
        dom.append_child(div, p).unwrap();
        (dom, section, div, p)
    }

    fn is_match(dom: &Dom, node: NodeId, selector: &str) -> bool {
        matches_list(&parse_selector_list(selector).unwrap(), node, dom)
    }

    #[test]
    fn simple_components() {
        let (dom, _, div, p) = build();
        assert!(is_match(&dom, p, "p"));
        assert!(is_match(&dom, p, "P"));
        assert!(is_match(&dom, p, ".note"));
        assert!(is_match(&dom, div, "#mid"));
        assert!(is_match(&dom, p, "[data-k]"));
        assert!(is_match(&dom, p, "[data-k='1']"));
        assert!(!is_match(&dom, p, "[data-k='2']"));
        assert!(is_match(&dom, p, "*"));
    }

    #[test]
    fn child_combinator() {
        let (dom, section, _, p) = build();
        assert!(is_match(&dom, p, "div > p"));
        assert!(!is_match(&dom, p, "section > p"));
        assert!(is_match(&dom, section, "body > section"));
    }

    #[test]
    fn descendant_backtracks() {
        let (dom, _, _, p) = build();
        assert!(is_match(&dom, p, "section p"));
        assert!(is_match(&dom, p, ".outer > div p"));
        assert!(is_match(&dom, p, "body div > .note"));
        assert!(!is_match(&dom, p, "div section p"));
    }

    #[test]
    fn list_matches_any() {
        let (dom, _, div, _) = build();
        assert!(is_match(&dom, div, "span, #mid"));
        assert!(!is_match(&dom, div, "span, em"));
    }

    #[test]
    fn text_nodes_never_match() {
        let mut dom = Dom::new();
        let t = dom.create_text("x");
        assert!(!is_match(&dom, t, "*"));
    }

    #[test]
    fn empty_selector_returns_false() {
        let (dom, _, _, p) = build();
        assert!(!matches_selector(&Selector::default(), p, &dom));
    }
}
