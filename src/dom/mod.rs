//! DOM arena: slotmap-backed live document with selector queries.

pub mod node;
pub mod query;
pub mod tree;

pub use node::{validate_name, ElementData, Namespace, NodeData, NodeId};
pub use tree::{Dom, MutationRecord};
