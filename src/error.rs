//! Crate-wide error type.
//!
//! Errors that signal a mistake in how the API was used (bad attribute names,
//! unknown node methods, pushing onto a non-array cell) are returned to the
//! caller. Expected races (already mounted, node already detached) never reach
//! this type; they are logged and absorbed where they happen.

/// Errors produced by the runtime.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A tag or component name was empty or otherwise unusable.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// An element could not be created with the given tag name.
    #[error("invalid tag name {tag:?}: {reason}")]
    InvalidTagName { tag: String, reason: String },

    /// The DOM rejected an attribute.
    #[error("invalid attribute {name:?}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    /// A selector string failed to parse.
    #[error("invalid selector at token {position}: {message}")]
    InvalidSelector { position: usize, message: String },

    /// `push` was called on a cell whose value is not an array.
    #[error("cannot push onto state {state}: value is not an array")]
    NotAnArray { state: u64 },

    /// A keyed patch was attempted on a cell holding a primitive.
    #[error("cannot patch key {key:?} on state {state}: value is not an object or array")]
    NotAContainer { state: u64, key: String },

    /// A node method was called that is not attached to the node.
    #[error("method {method:?} is not attached to this node")]
    UnknownMethod { method: String },

    /// The node id does not refer to a live node in the arena.
    #[error("node does not exist")]
    UnknownNode,

    /// A tree operation would produce an invalid hierarchy.
    #[error("hierarchy request error: {0}")]
    Hierarchy(String),

    /// Service resolution re-entered a service already being resolved.
    #[error("circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    /// A service was not found anywhere in the container hierarchy.
    #[error("service {0:?} not found in container hierarchy")]
    ServiceNotFound(String),

    /// A service was found but has a different type than requested.
    #[error("service {0:?} has an unexpected type")]
    ServiceType(String),

    /// A cell or component outlived the context that created it.
    #[error("the runtime context has been dropped")]
    ContextDropped,

    /// A component's render function failed.
    #[error("render of component {component:?} failed: {message}")]
    Render { component: String, message: String },

    /// A user callback failed.
    #[error("listener failed: {0}")]
    Listener(String),
}

impl Error {
    /// Build a [`Error::Render`] from any displayable message.
    pub fn render(component: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Render {
            component: component.into(),
            message: message.to_string(),
        }
    }

    /// Build a [`Error::Listener`] from any displayable message.
    pub fn listener(message: impl std::fmt::Display) -> Self {
        Self::Listener(message.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
