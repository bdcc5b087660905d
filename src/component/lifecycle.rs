//! Component lifecycle: mount, placeholder binding, visibility, unmount.
//!
//! Lifecycle transitions are announced through the component's emitter
//! using the names in [`LifecycleEvent`]. `mounted` fires at most once per
//! instance; `unmounted` fires once, right before the emitter is cleared.

use crate::component::Component;
use crate::core::context::Context;
use crate::dom::{Dom, NodeId};
use crate::markup::{Arg, Attrs, PLACEHOLDER_SUFFIX};

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Events a component emits on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Rendered,
    Rerendered,
    Premount,
    Mounted,
    Prebind,
    Bound,
    MarkupBound,
    BeforeHidden,
    Hidden,
    Unmounted,
    BeforeVisible,
    Visible,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 12] = [
        LifecycleEvent::Rendered,
        LifecycleEvent::Rerendered,
        LifecycleEvent::Premount,
        LifecycleEvent::Mounted,
        LifecycleEvent::Prebind,
        LifecycleEvent::Bound,
        LifecycleEvent::MarkupBound,
        LifecycleEvent::BeforeHidden,
        LifecycleEvent::Hidden,
        LifecycleEvent::Unmounted,
        LifecycleEvent::BeforeVisible,
        LifecycleEvent::Visible,
    ];

    /// The wire name used with [`Component::on`].
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Rendered => "rendered",
            LifecycleEvent::Rerendered => "rerendered",
            LifecycleEvent::Premount => "premount",
            LifecycleEvent::Mounted => "mounted",
            LifecycleEvent::Prebind => "prebind",
            LifecycleEvent::Bound => "bound",
            LifecycleEvent::MarkupBound => "markup-bound",
            LifecycleEvent::BeforeHidden => "before-hidden",
            LifecycleEvent::Hidden => "hidden",
            LifecycleEvent::Unmounted => "unmounted",
            LifecycleEvent::BeforeVisible => "before-visible",
            LifecycleEvent::Visible => "visible",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

// ---------------------------------------------------------------------------
// Visibility helpers
// ---------------------------------------------------------------------------

/// Set or clear the `display` declaration in a node's `style` attribute,
/// leaving other declarations alone.
pub(crate) fn set_display_none(dom: &mut Dom, node: NodeId, hidden: bool) {
    let mut declarations: Vec<(String, String)> = dom
        .attribute(node, "style")
        .unwrap_or_default()
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            Some((k.trim().to_owned(), v.trim().to_owned()))
        })
        .filter(|(k, _)| !k.is_empty() && k != "display")
        .collect();
    if hidden {
        declarations.push(("display".to_owned(), "none".to_owned()));
    }
    if declarations.is_empty() {
        dom.remove_attribute(node, "style");
        return;
    }
    let style = declarations
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ");
    if let Err(e) = dom.set_attribute(node, "style", style) {
        tracing::error!(error = %e, "failed to update style");
    }
}

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

impl Component {
    /// Register the instance under its name, bind pending placeholders and
    /// emit `mounted` (once).
    ///
    /// Mounting twice only warns.
    pub fn mount(&self) -> crate::Result<()> {
        let flags = &self.inner.flags;
        if flags.unmounted.get() {
            tracing::warn!(component = %self.name(), "mount called on an unmounted component");
            return Ok(());
        }
        if flags.registered.replace(true) {
            tracing::warn!(component = %self.name(), "component already mounted");
            return Ok(());
        }
        let cx = self.context()?;
        cx.repository_mut().set_name(self.name(), self.id());

        self.emit_lifecycle(LifecycleEvent::Premount, Vec::new());
        self.bind_placeholders(&cx)?;
        if !self.is_mounted() {
            self.emit_lifecycle(LifecycleEvent::Mounted, Vec::new());
        }
        tracing::debug!(component = %self.name(), id = %self.id(), "mounted");
        Ok(())
    }

    /// Replace every placeholder left for this component's name with a
    /// real render of the arguments captured at the placeholder.
    fn bind_placeholders(&self, cx: &Context) -> crate::Result<()> {
        self.emit_lifecycle(LifecycleEvent::Prebind, Vec::new());
        let tag = format!("{}{PLACEHOLDER_SUFFIX}", self.tag_name());
        let placeholders = {
            let dom = cx.dom();
            let mut found: Vec<NodeId> = dom.query_all(|_, data| data.tag() == Some(tag.as_str()));
            // bind in document order where possible
            let ordered: Vec<NodeId> = dom
                .descendants(dom.document())
                .into_iter()
                .filter(|n| found.contains(n))
                .collect();
            found.retain(|n| !ordered.contains(n));
            let mut all = ordered;
            all.extend(found);
            all
        };

        for placeholder in placeholders {
            let key = cx
                .dom()
                .attribute(placeholder, "ojs-key")
                .map(str::to_owned);
            let args = key
                .and_then(|k| cx.repository_mut().take_placeholder(&k))
                .unwrap_or_default();
            let mut call = args.clone();
            call.push(Arg::Attrs(
                Attrs::new().parent(placeholder).replace_parent(true),
            ));
            self.wrap(&call)?;
            self.emit_lifecycle(
                LifecycleEvent::MarkupBound,
                vec![Arg::Node(placeholder), Arg::List(args)],
            );
        }
        self.emit_lifecycle(LifecycleEvent::Bound, Vec::new());
        Ok(())
    }

    /// Hide every root.
    pub fn hide(&self) {
        self.emit_lifecycle(LifecycleEvent::BeforeHidden, Vec::new());
        self.set_roots_hidden(true);
        self.emit_lifecycle(LifecycleEvent::Hidden, Vec::new());
    }

    /// Show every root.
    pub fn show(&self) {
        self.emit_lifecycle(LifecycleEvent::BeforeVisible, Vec::new());
        self.set_roots_hidden(false);
        self.emit_lifecycle(LifecycleEvent::Visible, Vec::new());
    }

    fn set_roots_hidden(&self, hidden: bool) {
        let Ok(cx) = self.context() else {
            return;
        };
        let roots = self.all_markup();
        let mut dom = cx.dom_mut();
        for root in roots {
            set_display_none(&mut dom, root, hidden);
        }
    }

    /// Tear the instance down.
    ///
    /// Runs the render object's `clean_up`, destroys every root, drops cell
    /// and broker subscriptions, emits `unmounted`, clears the emitter and
    /// removes the instance from the repository. Returns `false` when the
    /// instance was already unmounted.
    pub fn unmount(&self) -> bool {
        let flags = &self.inner.flags;
        if flags.unmounted.get() || flags.unmounting.replace(true) {
            return false;
        }
        let Ok(cx) = self.context() else {
            flags.unmounted.set(true);
            return false;
        };
        tracing::debug!(component = %self.name(), id = %self.id(), "unmounting");

        self.inner.render.clean_up(&cx);
        let roots = self.all_markup();
        cx.dispose_subtrees(&roots);
        self.release_states();

        let subscriptions: Vec<_> = self.inner.broker_subscriptions.borrow_mut().drain(..).collect();
        if let Some(broker) = cx.broker() {
            for (event, id) in subscriptions {
                broker.unsubscribe(&event, id);
            }
        }

        flags.mounted.set(false);
        flags.unmounted.set(true);
        self.emit_lifecycle(LifecycleEvent::Unmounted, Vec::new());
        self.inner.emitter.clear();

        cx.repository_mut().remove_component(self.id());
        if self.is_anonymous() {
            cx.unregister(self.name());
        }
        true
    }
}
