//! Node types: NodeId, NodeData, element data and name validation.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Namespace an element was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Element payload: tag, namespace and ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name. Lower-cased for HTML elements, kept verbatim for SVG.
    pub tag: String,
    pub namespace: Namespace,
    /// Attributes in insertion order.
    pub attributes: Vec<(String, String)>,
}

impl ElementData {
    /// Create an element payload with no attributes.
    pub fn new(tag: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            tag: tag.into(),
            namespace,
            attributes: Vec::new(),
        }
    }

    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the named attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute. Returns the old value if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Check whether the `class` attribute contains the given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Attribute sets are compared as sets: order does not matter.
    pub fn same_attributes(&self, other: &ElementData) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(k, v)| other.attribute(k) == Some(v.as_str()))
    }
}

/// The kind of a node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// The document node. Exactly one per [`Dom`](super::Dom).
    Document,
    Element(ElementData),
    Text(String),
    /// A document fragment. Appending it moves its children.
    Fragment,
}

impl NodeData {
    /// Element payload, if this is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable element payload, if this is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match self {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Tag name, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeData::Text(_))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, NodeData::Fragment)
    }

    /// Shallow equality: kind, tag, namespace, attributes and text data.
    pub fn shallow_eq(&self, other: &NodeData) -> bool {
        match (self, other) {
            (NodeData::Document, NodeData::Document) => true,
            (NodeData::Fragment, NodeData::Fragment) => true,
            (NodeData::Text(a), NodeData::Text(b)) => a == b,
            (NodeData::Element(a), NodeData::Element(b)) => {
                a.tag == b.tag && a.namespace == b.namespace && a.same_attributes(b)
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

/// Validate an element or attribute name.
///
/// Names must start with a letter, `_` or `:` and continue with letters,
/// digits, `-`, `_`, `.` or `:`.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let mut chars = name.chars();
    let first = chars.next().ok_or("name is empty")?;
    if !(first.is_alphabetic() || first == '_' || first == ':') {
        return Err("name must start with a letter, '_' or ':'");
    }
    if chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')) {
        Ok(())
    } else {
        Err("name contains an invalid character")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attribute_keeps_position() {
        let mut el = ElementData::new("div", Namespace::Html);
        el.set_attribute("id", "a");
        el.set_attribute("class", "x");
        el.set_attribute("id", "b");
        assert_eq!(
            el.attributes,
            vec![("id".into(), "b".into()), ("class".into(), "x".into())]
        );
    }

    #[test]
    fn remove_attribute() {
        let mut el = ElementData::new("div", Namespace::Html);
        el.set_attribute("title", "t");
        assert_eq!(el.remove_attribute("title").as_deref(), Some("t"));
        assert_eq!(el.remove_attribute("title"), None);
        assert!(!el.has_attribute("title"));
    }

    #[test]
    fn classes_split_on_whitespace() {
        let mut el = ElementData::new("div", Namespace::Html);
        el.set_attribute("class", " a  b\tc ");
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(el.has_class("b"));
        assert!(!el.has_class("d"));
    }

    #[test]
    fn attribute_order_is_irrelevant_for_equality() {
        let mut a = ElementData::new("p", Namespace::Html);
        a.set_attribute("x", "1");
        a.set_attribute("y", "2");
        let mut b = ElementData::new("p", Namespace::Html);
        b.set_attribute("y", "2");
        b.set_attribute("x", "1");
        assert!(NodeData::Element(a.clone()).shallow_eq(&NodeData::Element(b)));

        let mut c = a.clone();
        c.set_attribute("x", "3");
        assert!(!NodeData::Element(a).shallow_eq(&NodeData::Element(c)));
    }

    #[test]
    fn shallow_eq_by_kind() {
        assert!(NodeData::Text("a".into()).shallow_eq(&NodeData::Text("a".into())));
        assert!(!NodeData::Text("a".into()).shallow_eq(&NodeData::Fragment));
        assert!(NodeData::Fragment.shallow_eq(&NodeData::Fragment));
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("div").is_ok());
        assert!(validate_name("ojs-counter-tmp--").is_ok());
        assert!(validate_name("data-x.y").is_ok());
        assert!(validate_name("_private").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("1bad").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("a=b").is_err());
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
