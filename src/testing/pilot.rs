//! Pilot: programmatic interaction with a headless runtime.
//!
//! The `Pilot` owns a [`Context`] and provides methods to mount components
//! into the body, simulate events, drain deferred work and inspect the
//! resulting document.

use crate::component::Component;
use crate::config::Config;
use crate::core::context::Context;
use crate::dom::NodeId;
use crate::error::Result;
use crate::event::DomEvent;
use crate::markup::{Arg, Attrs, Markup};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless runtime driver for testing.
///
/// # Examples
///
/// ```
/// use openscript::testing::Pilot;
/// use openscript::args;
///
/// let mut pilot = Pilot::new();
/// pilot.context().register_fn("Hello", |cx, _| cx.handle("p", &args!["hi"]));
/// pilot.mount("Hello", &[]).unwrap();
/// assert!(pilot.body_html().contains("<p>hi</p>"));
/// ```
pub struct Pilot {
    cx: Context,
}

impl Pilot {
    /// Create a pilot over a context with the default config.
    pub fn new() -> Self {
        Self { cx: Context::new() }
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            cx: Context::with_config(config),
        }
    }

    /// Borrow the underlying context.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Render `name` with `args` into the body.
    pub fn mount(&mut self, name: &str, args: &[Arg]) -> Result<Markup> {
        let mut call = args.to_vec();
        call.push(Arg::Attrs(Attrs::new().parent(self.cx.body())));
        self.cx.handle(name, &call)
    }

    /// Look up a registered component instance by name.
    pub fn component(&self, name: &str) -> Option<Component> {
        self.cx.component(name)
    }

    // ── Event simulation ─────────────────────────────────────────────

    /// Dispatch a `click` on `node`. Returns the number of handlers run.
    pub fn click(&mut self, node: NodeId) -> usize {
        self.dispatch(DomEvent::new("click", node))
    }

    /// Dispatch an `input` event carrying `value` as its detail.
    pub fn input(&mut self, node: NodeId, value: impl Into<Value>) -> usize {
        self.dispatch(DomEvent::new("input", node).with_detail(value))
    }

    /// Dispatch an arbitrary event.
    pub fn dispatch(&mut self, event: DomEvent) -> usize {
        self.cx.dispatch(&event)
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Drain removals, discarded nodes and queued tasks.
    pub fn tick(&mut self) {
        self.cx.tick();
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Serialized children of the body.
    pub fn body_html(&self) -> String {
        let dom = self.cx.dom();
        dom.inner_html(dom.body())
    }

    /// First node in the body matching `selector`.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        let dom = self.cx.dom();
        let found = dom.query_selector(dom.body(), selector).ok().flatten();
        found
    }

    /// All nodes in the body matching `selector`, in tree order.
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let dom = self.cx.dom();
        let found = dom.query_selector_all(dom.body(), selector).unwrap_or_default();
        found
    }

    /// Text content of the first node matching `selector`.
    pub fn text(&self, selector: &str) -> Option<String> {
        let node = self.query(selector)?;
        Some(self.cx.dom().text_content(node))
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
