//! The `Render` trait and declared event listeners.

use std::fmt;
use std::rc::Rc;

use crate::core::context::Context;
use crate::core::emitter::{Emission, Handler};
use crate::error::Result;
use crate::markup::{Arg, Markup};

/// What a component type implements.
///
/// `render` receives the arguments the component was called with, minus
/// placement directives. It is called again with the same arguments on
/// every re-render.
pub trait Render: 'static {
    fn render(&self, cx: &Context, args: &[Arg]) -> Result<Markup>;

    /// Handlers bound once when the instance is constructed.
    fn listeners(&self) -> Vec<Declared> {
        Vec::new()
    }

    /// Called at the start of unmount.
    fn clean_up(&self, _cx: &Context) {}
}

/// Adapts a closure to [`Render`].
pub struct FnRender<F> {
    f: F,
}

impl<F> FnRender<F>
where
    F: Fn(&Context, &[Arg]) -> Result<Markup> + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Render for FnRender<F>
where
    F: Fn(&Context, &[Arg]) -> Result<Markup> + 'static,
{
    fn render(&self, cx: &Context, args: &[Arg]) -> Result<Markup> {
        (self.f)(cx, args)
    }
}

// ---------------------------------------------------------------------------
// Declared listeners
// ---------------------------------------------------------------------------

/// Where a declared handler is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenTarget {
    /// The component's own emitter.
    Component,
    /// The emitter of the component registered under this name. Attached
    /// through [`Context::on`], so the other component may not exist yet.
    Named(String),
    /// The context's broker.
    Broker,
}

/// A handler a component type declares for one or more events.
#[derive(Clone)]
pub struct Declared {
    pub(crate) events: Vec<String>,
    pub(crate) target: ListenTarget,
    pub(crate) replay: bool,
    pub(crate) handler: Handler,
}

impl Declared {
    /// Handle component events.
    pub fn on<I, S>(events: I, f: impl Fn(&Context, &Emission) -> Result<()> + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            target: ListenTarget::Component,
            replay: false,
            handler: Rc::new(f),
        }
    }

    /// Handle broker events.
    pub fn broker<I, S>(events: I, f: impl Fn(&Context, &Emission) -> Result<()> + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: ListenTarget::Broker,
            ..Self::on(events, f)
        }
    }

    /// Handle events of the component registered under `name`.
    pub fn component<I, S>(
        name: impl Into<String>,
        events: I,
        f: impl Fn(&Context, &Emission) -> Result<()> + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: ListenTarget::Named(name.into()),
            ..Self::on(events, f)
        }
    }

    /// Also deliver the last emission of each event, if it already
    /// happened. Brokers keep no history, so this has no effect there.
    pub fn replay(mut self) -> Self {
        self.replay = true;
        self
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn target(&self) -> &ListenTarget {
        &self.target
    }

    pub fn replays(&self) -> bool {
        self.replay
    }
}

impl fmt::Debug for Declared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declared")
            .field("events", &self.events)
            .field("target", &self.target)
            .field("replay", &self.replay)
            .finish()
    }
}
