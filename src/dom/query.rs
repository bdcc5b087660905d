//! DOM queries: selector lookups scoped to a subtree or across the arena.

use super::node::{NodeData, NodeId};
use super::tree::Dom;
use crate::error::Result;
use crate::selector::{matches_list, parse_selector_list};

impl Dom {
    /// First descendant of `scope` (in tree order) matching `selector`.
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|&n| matches_list(&list, n, self)))
    }

    /// All descendants of `scope` matching `selector`, in tree order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|&n| matches_list(&list, n, self))
            .collect())
    }

    /// Every live node in the arena matching `selector`, connected or not.
    ///
    /// Iterates in slot order rather than tree order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = parse_selector_list(selector)?;
        Ok(self
            .iter()
            .map(|(id, _)| id)
            .filter(|&n| matches_list(&list, n, self))
            .collect())
    }

    /// Whether `node` matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        let list = parse_selector_list(selector)?;
        Ok(matches_list(&list, node, self))
    }

    /// Find all nodes matching an arbitrary predicate.
    pub fn query_all(&self, predicate: impl Fn(NodeId, &NodeData) -> bool) -> Vec<NodeId> {
        self.iter()
            .filter(|(id, data)| predicate(*id, data))
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::{Dom, NodeId};
    use crate::error::Error;

    /// Build a test tree for queries:
    /// ```text
    /// body
    ///  └─ ul#list
    ///      ├─ li.item[data-n="1"]
    ///      └─ li.item.last[data-n="2"]
    /// detached: li.item (never attached)
    /// ```
    fn build_query_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let ul = dom.create_element("ul").unwrap();
        dom.set_attribute(ul, "id", "list").unwrap();
        let a = dom.create_element("li").unwrap();
        dom.set_attribute(a, "class", "item").unwrap();
        dom.set_attribute(a, "data-n", "1").unwrap();
        let b = dom.create_element("li").unwrap();
        dom.set_attribute(b, "class", "item last").unwrap();
        dom.set_attribute(b, "data-n", "2").unwrap();
        let body = dom.body();
        dom.append_child(body, ul).unwrap();
        dom.append_child(ul, a).unwrap();
        dom.append_child(ul, b).unwrap();
        let loose = dom.create_element("li").unwrap();
        dom.set_attribute(loose, "class", "item").unwrap();
        (dom, ul, a, b, loose)
    }

    #[test]
    fn query_selector_finds_first_in_tree_order() {
        let (dom, ul, a, ..) = build_query_tree();
        assert_eq!(dom.query_selector(dom.body(), "li").unwrap(), Some(a));
        assert_eq!(dom.query_selector(dom.document(), "#list").unwrap(), Some(ul));
        assert_eq!(dom.query_selector(dom.body(), "span").unwrap(), None);
    }

    #[test]
    fn query_selector_excludes_scope() {
        let (dom, ul, ..) = build_query_tree();
        assert_eq!(dom.query_selector(ul, "ul").unwrap(), None);
    }

    #[test]
    fn query_selector_all_scoped() {
        let (dom, ul, a, b, _) = build_query_tree();
        assert_eq!(dom.query_selector_all(ul, ".item").unwrap(), vec![a, b]);
        assert_eq!(dom.query_selector_all(ul, r#"[data-n="2"]"#).unwrap(), vec![b]);
        assert_eq!(dom.query_selector_all(ul, "li.item.last").unwrap(), vec![b]);
    }

    #[test]
    fn select_all_includes_detached_nodes() {
        let (dom, _, a, b, loose) = build_query_tree();
        let mut found = dom.select_all("li.item").unwrap();
        found.sort();
        let mut expected = vec![a, b, loose];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn matches() {
        let (dom, _, _, b, _) = build_query_tree();
        assert!(dom.matches(b, "ul > .last").unwrap());
        assert!(!dom.matches(b, "ol > .last").unwrap());
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let (dom, ..) = build_query_tree();
        assert!(matches!(
            dom.select_all("li >"),
            Err(Error::InvalidSelector { .. })
        ));
    }

    #[test]
    fn query_all_custom_predicate() {
        let (dom, ..) = build_query_tree();
        let texts = dom.query_all(|_, data| data.is_text());
        assert!(texts.is_empty());
        let lis = dom.query_all(|_, data| data.tag() == Some("li"));
        assert_eq!(lis.len(), 3);
    }
}
