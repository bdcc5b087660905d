//! Arguments accepted by the markup builder and passed to render functions.

use std::fmt;

use crate::dom::NodeId;
use crate::markup::Attrs;
use crate::reactive::{State, StateChange};
use crate::value::Value;

/// One argument to [`Context::handle`](crate::Context::handle) or a render
/// function.
#[derive(Clone)]
pub enum Arg {
    /// An existing node, appended as a child.
    Node(NodeId),
    /// A cell. Renders as its current text; components subscribe to it.
    State(State),
    /// Attributes and directives.
    Attrs(Attrs),
    /// Nested arguments, flattened recursively.
    List(Vec<Arg>),
    /// A plain value, rendered as text.
    Value(Value),
    /// Trailing marker of a cell-triggered re-render.
    Signature(StateChange),
}

impl Arg {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Arg::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&State> {
        match self {
            Arg::State(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_attrs(&self) -> Option<&Attrs> {
        match self {
            Arg::Attrs(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Depth-first flattening of nested lists.
    ///
    /// Each list element is processed by the same rule as a top-level
    /// argument, so a list holding a [`Markup::Nodes`](crate::Markup)
    /// conversion contributes its nodes rather than being dropped.
    pub fn flatten(args: &[Arg]) -> Vec<Arg> {
        let mut out = Vec::with_capacity(args.len());
        fn walk(args: &[Arg], out: &mut Vec<Arg>) {
            for arg in args {
                match arg {
                    Arg::List(items) => walk(items, out),
                    other => out.push(other.clone()),
                }
            }
        }
        walk(args, &mut out);
        out
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Arg::State(s) => f.debug_tuple("State").field(&s.id()).finish(),
            Arg::Attrs(a) => a.fmt(f),
            Arg::List(items) => f.debug_list().entries(items).finish(),
            Arg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Arg::Signature(c) => f.debug_tuple("Signature").field(&c.state).finish(),
        }
    }
}

impl From<NodeId> for Arg {
    fn from(id: NodeId) -> Self {
        Arg::Node(id)
    }
}

impl From<State> for Arg {
    fn from(state: State) -> Self {
        Arg::State(state)
    }
}

impl From<&State> for Arg {
    fn from(state: &State) -> Self {
        Arg::State(state.clone())
    }
}

impl From<Attrs> for Arg {
    fn from(attrs: Attrs) -> Self {
        Arg::Attrs(attrs)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<StateChange> for Arg {
    fn from(change: StateChange) -> Self {
        Arg::Signature(change)
    }
}

macro_rules! value_args {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Arg::Value(Value::from(v))
            }
        })*
    };
}

value_args!(&str, String, bool, i32, i64, u32, u64, usize, f64);

/// Build a `Vec<Arg>` from anything convertible into [`Arg`].
///
/// ```ignore
/// cx.handle("div", &args![Attrs::new().class("row"), "text", state])?;
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
