//! Tree operations: create, insert, remove, clone, compare, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{validate_name, ElementData, Namespace, NodeData, NodeId};
use crate::error::{Error, Result};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// A child list change observed on a connected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The parent the nodes were removed from.
    pub target: NodeId,
    pub removed: Vec<NodeId>,
}

/// The live document, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// A node is *connected* when the document is among its ancestors; detached
/// subtrees stay alive in the arena until they are destroyed.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    native_listeners: SecondaryMap<NodeId, Vec<String>>,
    document: NodeId,
    body: NodeId,
    observing: bool,
    records: Vec<MutationRecord>,
}

impl Dom {
    /// Create a document with an empty `body`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut children = SecondaryMap::new();
        let mut parent = SecondaryMap::new();
        let document = nodes.insert(NodeData::Document);
        let body = nodes.insert(NodeData::Element(ElementData::new("body", Namespace::Html)));
        children.insert(document, vec![body]);
        children.insert(body, Vec::new());
        parent.insert(body, document);
        Self {
            nodes,
            children,
            parent,
            native_listeners: SecondaryMap::new(),
            document,
            body,
            observing: true,
            records: Vec::new(),
        }
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    // ── Creation ─────────────────────────────────────────────────────

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Create a detached HTML element. The tag is lower-cased.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        self.create_element_ns(tag, Namespace::Html)
    }

    /// Create a detached element in the given namespace.
    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> Result<NodeId> {
        validate_name(tag).map_err(|reason| Error::InvalidTagName {
            tag: tag.to_owned(),
            reason: reason.to_owned(),
        })?;
        let tag = match namespace {
            Namespace::Html => tag.to_ascii_lowercase(),
            Namespace::Svg => tag.to_owned(),
        };
        Ok(self.alloc(NodeData::Element(ElementData::new(tag, namespace))))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Create an empty document fragment.
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    // ── Access ───────────────────────────────────────────────────────

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Element payload of a node, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(NodeData::as_element)
    }

    /// Tag name of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Number of nodes in the arena, document and body included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the document and body always exist.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the arena contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all live `(NodeId, &NodeData)` pairs in the arena.
    ///
    /// Iteration follows slot order, which is deterministic but not tree order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// First child of a node.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// The sibling after `id` in its parent's child list.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the topmost ancestor.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// Whether the node is attached to the document.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(self.document, id)
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Value of an attribute on an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    /// Whether an element carries the attribute.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attribute(name))
    }

    /// All attributes of an element in insertion order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|el| el.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Set an attribute on an element.
    ///
    /// The name is validated and lower-cased for HTML elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        validate_name(name).map_err(|reason| Error::InvalidAttribute {
            name: name.to_owned(),
            reason: reason.to_owned(),
        })?;
        let el = self
            .nodes
            .get_mut(id)
            .ok_or(Error::UnknownNode)?
            .as_element_mut()
            .ok_or_else(|| Error::InvalidAttribute {
                name: name.to_owned(),
                reason: "attributes can only be set on elements".to_owned(),
            })?;
        match el.namespace {
            Namespace::Html => el.set_attribute(name.to_ascii_lowercase(), value),
            Namespace::Svg => el.set_attribute(name, value),
        }
        Ok(())
    }

    /// Remove an attribute from an element.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get_mut(id)
            .and_then(NodeData::as_element_mut)
            .and_then(|el| el.remove_attribute(name))
    }

    /// Whether an element's `class` attribute contains `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    // ── Tree mutation ────────────────────────────────────────────────

    /// Append `child` as the last child of `parent`.
    ///
    /// Appending a fragment moves its children instead, leaving it empty.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let first = self.first_child(parent);
        self.insert_before(parent, child, first)
    }

    /// Insert `child` before `reference` in `parent` (append when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.check_insert(parent, child)?;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(Error::Hierarchy(
                    "reference node is not a child of the parent".into(),
                ));
            }
        }

        if matches!(self.nodes.get(child), Some(NodeData::Fragment)) {
            let moved = self.children.get_mut(child).map(std::mem::take).unwrap_or_default();
            for node in moved {
                self.parent.remove(node);
                self.link(parent, node, reference);
            }
            return Ok(());
        }

        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };
        self.unlink(child, true);
        self.link(parent, child, reference);
        Ok(())
    }

    /// Replace `old_child` of `parent` with `new_child`.
    pub fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> Result<()> {
        if self.parent(old_child) != Some(parent) {
            return Err(Error::Hierarchy("node to replace is not a child of the parent".into()));
        }
        if new_child == old_child {
            return Ok(());
        }
        self.insert_before(parent, new_child, Some(old_child))?;
        self.unlink(old_child, true);
        Ok(())
    }

    /// Remove `child` from `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Hierarchy("node is not a child of the parent".into()));
        }
        self.unlink(child, true);
        Ok(())
    }

    /// Detach a node from its parent. Returns `false` if it had none.
    pub fn detach(&mut self, id: NodeId) -> bool {
        self.unlink(id, true).is_some()
    }

    /// Remove all children of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        let kids = self.children(id).to_vec();
        for child in kids {
            self.unlink(child, true);
        }
    }

    /// Free a node and all its descendants from the arena.
    ///
    /// Returns the freed ids in breadth-first order. The document and body
    /// cannot be destroyed. No mutation record is produced.
    pub fn destroy(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) || id == self.document || id == self.body {
            return Vec::new();
        }
        self.unlink(id, false);

        let mut freed = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(id);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            self.native_listeners.remove(current);
            if self.nodes.remove(current).is_some() {
                freed.push(current);
            }
        }
        freed
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_data = self.nodes.get(parent).ok_or(Error::UnknownNode)?;
        let child_data = self.nodes.get(child).ok_or(Error::UnknownNode)?;
        if parent_data.is_text() {
            return Err(Error::Hierarchy("text nodes cannot have children".into()));
        }
        if matches!(child_data, NodeData::Document) {
            return Err(Error::Hierarchy("the document cannot be inserted".into()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::Hierarchy(
                "a node cannot be inserted into itself or its descendants".into(),
            ));
        }
        Ok(())
    }

    /// Insert an already-unlinked node.
    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.parent.insert(child, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            let pos = reference
                .and_then(|r| siblings.iter().position(|&c| c == r))
                .unwrap_or(siblings.len());
            siblings.insert(pos, child);
        }
    }

    /// Remove a node from its parent's child list, recording the removal
    /// when the parent is connected.
    fn unlink(&mut self, child: NodeId, record: bool) -> Option<NodeId> {
        let parent = self.parent.remove(child)?;
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&c| c != child);
        }
        if record && self.observing && self.is_connected(parent) {
            self.records.push(MutationRecord {
                target: parent,
                removed: vec![child],
            });
        }
        Some(parent)
    }

    // ── Content ──────────────────────────────────────────────────────

    /// Concatenated text of all descendant text nodes, in tree order.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.nodes.get(id) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(_) => self
                .walk_depth_first(id)
                .into_iter()
                .filter_map(|n| match self.nodes.get(n) {
                    Some(NodeData::Text(t)) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    /// Replace all children with a single text node (none for an empty string).
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        match self.nodes.get_mut(id).ok_or(Error::UnknownNode)? {
            NodeData::Text(data) => {
                *data = text.to_owned();
                Ok(())
            }
            _ => {
                self.clear_children(id);
                if !text.is_empty() {
                    let node = self.create_text(text);
                    self.link(id, node, None);
                }
                Ok(())
            }
        }
    }

    /// Copy a node, and its subtree when `deep` is set. The copy is detached.
    ///
    /// Native listeners are not copied.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId> {
        let data = match self.nodes.get(id).ok_or(Error::UnknownNode)? {
            NodeData::Document => {
                return Err(Error::Hierarchy("the document cannot be cloned".into()))
            }
            other => other.clone(),
        };
        let copy = self.alloc(data);
        if deep {
            let kids = self.children(id).to_vec();
            for child in kids {
                let child_copy = self.clone_node(child, true)?;
                self.link(copy, child_copy, None);
            }
        }
        Ok(copy)
    }

    /// Structural deep equality (kind, tag, attributes as a set, text, children).
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> bool {
        let (Some(da), Some(db)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        if !da.shallow_eq(db) {
            return false;
        }
        let (ka, kb) = (self.children(a), self.children(b));
        ka.len() == kb.len() && ka.iter().zip(kb).all(|(&x, &y)| self.is_equal_node(x, y))
    }

    // ── Walks ────────────────────────────────────────────────────────

    /// Pre-order depth-first traversal starting from `start` (inclusive).
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Breadth-first traversal starting from `start` (inclusive).
    pub fn walk_breadth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.children(current).iter().copied());
        }
        result
    }

    /// Descendants of `id` in tree order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = self.walk_depth_first(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    // ── Native listeners ─────────────────────────────────────────────

    /// Attach the native handler for `event` on `id`.
    ///
    /// Returns `false` if one was already attached for that event type.
    pub fn add_event_listener(&mut self, id: NodeId, event: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        let Some(entry) = self.native_listeners.entry(id) else {
            return false;
        };
        let events = entry.or_default();
        if events.iter().any(|e| e == event) {
            return false;
        }
        events.push(event.to_owned());
        true
    }

    /// Whether a native handler for `event` is attached on `id`.
    pub fn has_event_listener(&self, id: NodeId, event: &str) -> bool {
        self.event_listener_count(id, event) > 0
    }

    /// Number of native handlers attached for `event` on `id`.
    pub fn event_listener_count(&self, id: NodeId, event: &str) -> usize {
        self.native_listeners
            .get(id)
            .map(|events| events.iter().filter(|e| *e == event).count())
            .unwrap_or(0)
    }

    /// Detach every native handler from `id`.
    pub fn clear_event_listeners(&mut self, id: NodeId) {
        self.native_listeners.remove(id);
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Enable or disable removal recording.
    pub fn set_observing(&mut self, observing: bool) {
        self.observing = observing;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Drain the recorded removals.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Serialize a node and its subtree as HTML.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize the children of a node as HTML.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id) {
            Some(NodeData::Text(text)) => escape_into(text, false, out),
            Some(NodeData::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if el.namespace == Namespace::Html && VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            Some(NodeData::Document | NodeData::Fragment) => {
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
            }
            None => {}
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
