//! Snapshot rendering helpers.
//!
//! Functions for converting live subtrees into plain-text strings suitable
//! for snapshot testing. Runtime bookkeeping attributes (`uid`, `key`,
//! `s-<id>`) can be masked so snapshots do not depend on id counters.

use crate::core::context::Context;
use crate::dom::{Dom, NodeData, NodeId};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a subtree as an indented outline, one node per line.
///
/// Elements print as `<tag attr="value">`, text nodes as their quoted
/// content. Children are indented by two spaces per level.
pub fn tree_to_string(dom: &Dom, root: NodeId) -> String {
    let mut lines = Vec::new();
    write_outline(dom, root, 0, false, &mut lines);
    lines.join("\n")
}

/// Like [`tree_to_string`], with runtime ids replaced by `*`.
pub fn masked_tree_to_string(dom: &Dom, root: NodeId) -> String {
    let mut lines = Vec::new();
    write_outline(dom, root, 0, true, &mut lines);
    lines.join("\n")
}

/// Masked outline of every child of the body.
pub fn body_snapshot(cx: &Context) -> String {
    let dom = cx.dom();
    let snapshot = dom
        .children(dom.body())
        .iter()
        .map(|&child| masked_tree_to_string(&dom, child))
        .collect::<Vec<_>>()
        .join("\n");
    snapshot
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn is_runtime_attribute(name: &str) -> bool {
    name == "uid" || name == "key" || name == "ojs-key" || name.starts_with("s-")
}

fn write_outline(dom: &Dom, node: NodeId, depth: usize, mask: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match dom.get(node) {
        Some(NodeData::Element(el)) => {
            let mut line = format!("{indent}<{}", el.tag);
            for (name, value) in &el.attributes {
                if mask && is_runtime_attribute(name) {
                    line.push_str(&format!(" {name}=*"));
                } else {
                    line.push_str(&format!(" {name}={value:?}"));
                }
            }
            line.push('>');
            lines.push(line);
        }
        Some(NodeData::Text(text)) => lines.push(format!("{indent}{text:?}")),
        Some(NodeData::Fragment) => lines.push(format!("{indent}#fragment")),
        Some(NodeData::Document) => lines.push(format!("{indent}#document")),
        None => return,
    }
    for &child in dom.children(node) {
        write_outline(dom, child, depth + 1, mask, lines);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
