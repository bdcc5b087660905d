//! Disposal: freeing nodes that left the document and unmounting the
//! components that lived in them.
//!
//! Two sources feed the pass run by [`Context::tick`]: removal records the
//! document collects while observation is on, and nodes the runtime itself
//! dropped via [`Context::discard`]. A node is only disposed if it is still
//! parentless when the pass runs; re-attached nodes are left alone.

use std::collections::HashSet;

use crate::component::ComponentId;
use crate::core::context::{Context, Task};
use crate::dom::NodeId;

impl Context {
    /// Drain deferred work: removals, discarded nodes and queued tasks.
    ///
    /// Repeats until nothing is left or `max_tick_rounds` is reached.
    pub fn tick(&self) {
        let rounds = self.config().max_tick_rounds;
        for round in 0..rounds {
            let removed: Vec<NodeId> = self
                .dom_mut()
                .take_records()
                .into_iter()
                .flat_map(|record| record.removed)
                .collect();
            let discarded = std::mem::take(&mut *self.inner.discarded.borrow_mut());
            let tasks: Vec<Task> = self.inner.tasks.borrow_mut().drain(..).collect();

            if removed.is_empty() && discarded.is_empty() && tasks.is_empty() {
                return;
            }
            tracing::trace!(
                round,
                removed = removed.len(),
                discarded = discarded.len(),
                tasks = tasks.len(),
                "tick"
            );

            self.dispose_removed(removed.into_iter().chain(discarded));
            for task in tasks {
                task(self);
            }
        }
        if self.has_deferred_work() {
            tracing::warn!(rounds, "tick stopped with work still pending");
        }
    }

    fn has_deferred_work(&self) -> bool {
        self.dom().has_records()
            || !self.inner.discarded.borrow().is_empty()
            || !self.inner.tasks.borrow().is_empty()
    }

    /// Mark a node the runtime no longer needs. It is disposed on the next
    /// tick unless it has been attached somewhere in the meantime.
    pub fn discard(&self, node: NodeId) {
        self.inner.discarded.borrow_mut().push(node);
    }

    fn dispose_removed(&self, nodes: impl IntoIterator<Item = NodeId>) {
        let mut seen = HashSet::new();
        let orphans: Vec<NodeId> = {
            let dom = self.dom();
            let orphans = nodes
                .into_iter()
                .filter(|&n| seen.insert(n))
                .filter(|&n| dom.contains(n) && dom.parent(n).is_none() && !dom.is_connected(n))
                .collect();
            orphans
        };
        if !orphans.is_empty() {
            self.dispose_subtrees(&orphans);
        }
    }

    /// Strip, free and unmount everything under `roots`.
    ///
    /// Components found in the subtrees are unmounted once none of their
    /// roots is left alive.
    pub(crate) fn dispose_subtrees(&self, roots: &[NodeId]) {
        let mut found: Vec<ComponentId> = Vec::new();
        for &root in roots {
            let nodes = {
                let dom = self.dom();
                if !dom.contains(root) {
                    continue;
                }
                let class = &self.config().component_class;
                let nodes = dom.walk_depth_first(root);
                for &node in &nodes {
                    if !dom.has_class(node, class) {
                        continue;
                    }
                    if let Some(id) = dom.attribute(node, "uid").and_then(ComponentId::parse) {
                        if !found.contains(&id) {
                            found.push(id);
                        }
                    }
                }
                nodes
            };
            for &node in &nodes {
                self.strip_node(node);
            }
            let freed = self.dom_mut().destroy(root);
            tracing::debug!(freed = freed.len(), "disposed subtree");
        }

        for id in found {
            let Some(component) = self.component_by_id(id) else {
                continue;
            };
            if !component.is_unmounted() && component.all_markup().is_empty() {
                component.unmount();
            }
        }
    }

    /// Drop a node's listeners and methods and run the disposal hooks.
    pub(crate) fn strip_node(&self, node: NodeId) {
        {
            let mut repository = self.repository_mut();
            repository.remove_listeners(node);
            repository.remove_methods(node);
        }
        self.dom_mut().clear_event_listeners(node);
        let hooks = self.repository().dispose_hooks();
        for hook in hooks {
            hook(self, node);
        }
    }

    /// Queue one [`sweep`](Context::sweep) for the next tick.
    pub(crate) fn schedule_sweep(&self) {
        if self.inner.sweep_pending.replace(true) {
            return;
        }
        self.queue_task(|cx| {
            cx.inner.sweep_pending.set(false);
            cx.sweep();
        });
    }

    /// Unmount every rendered, mounted component with no connected markup,
    /// and forget stored arguments no live root refers to.
    ///
    /// Returns the ids of the unmounted components.
    pub fn sweep(&self) -> Vec<ComponentId> {
        let mut unmounted = Vec::new();
        for component in self.components() {
            if component.is_unmounted() {
                continue;
            }
            if component.is_mounted() && component.is_rendered() && component.markup().is_empty() {
                tracing::debug!(component = %component.name(), id = %component.id(), "sweeping orphaned component");
                if component.unmount() {
                    unmounted.push(component.id());
                }
                continue;
            }
            let live: Vec<String> = {
                let roots = component.all_markup();
                let dom = self.dom();
                let live = roots
                    .into_iter()
                    .filter_map(|n| dom.attribute(n, "key").map(str::to_owned))
                    .collect();
                live
            };
            let pruned = self.repository_mut().retain_args(component.id(), &live);
            if pruned > 0 {
                tracing::trace!(component = %component.name(), pruned, "pruned stale arguments");
            }
        }
        unmounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::markup::Attrs;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn panel(cx: &Context) {
        cx.register_fn("Panel", |cx, args| {
            let state = args.iter().find_map(|a| a.as_state()).cloned();
            let text = state.map(|s| s.to_string()).unwrap_or_default();
            cx.handle("p", &args![text])
        });
    }

    #[test]
    fn removed_component_root_is_unmounted_on_tick() {
        let cx = Context::new();
        panel(&cx);
        let s = cx.state("hi");
        let body = cx.body();
        let root = cx
            .handle("Panel", &args![&s, Attrs::new().parent(body)])
            .unwrap()
            .node()
            .unwrap();
        let c = cx.component("Panel").unwrap();

        cx.dom_mut().detach(root);
        assert!(c.is_mounted());
        cx.tick();

        assert!(c.is_unmounted());
        assert_eq!(s.listener_count(), 0);
        assert!(!cx.dom().contains(root));
        assert!(cx.component("Panel").is_none());
    }

    #[test]
    fn reattached_nodes_survive() {
        let cx = Context::new();
        let body = cx.body();
        let host = cx.element("div", &args![Attrs::new().parent(body)]).unwrap();
        let node = cx
            .element("span", &args![Attrs::new().parent(host).on("click", |_, _| Ok(()))])
            .unwrap();
        cx.dom_mut().detach(node);
        cx.dom_mut().append_child(body, node).unwrap();
        cx.tick();
        assert!(cx.dom().contains(node));
        assert_eq!(cx.repository().listener_events(node), vec!["click"]);
    }

    #[test]
    fn disposal_strips_side_tables_and_runs_hooks() {
        let cx = Context::new();
        let body = cx.body();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s2 = seen.clone();
        cx.on_node_disposed(move |_, node| s2.borrow_mut().push(node));

        let outer = cx.element("div", &args![Attrs::new().parent(body)]).unwrap();
        let inner = cx
            .element(
                "b",
                &args![Attrs::new()
                    .parent(outer)
                    .on("click", |_, _| Ok(()))
                    .method("ping", |_, _, _| Ok(crate::value::json!("pong")))],
            )
            .unwrap();
        assert_eq!(cx.repository().side_table_len(), 2);

        cx.dom_mut().clear_children(body);
        cx.tick();

        assert_eq!(cx.repository().side_table_len(), 0);
        assert_eq!(*seen.borrow(), vec![outer, inner]);
    }

    #[test]
    fn discarded_nodes_are_freed() {
        let cx = Context::new();
        let node = cx.element("div", &[]).unwrap();
        cx.discard(node);
        cx.tick();
        assert!(!cx.dom().contains(node));
    }

    #[test]
    fn sweep_unmounts_components_without_connected_markup() {
        let cx = Context::with_config(crate::Config::new().with_observe_removals(false));
        panel(&cx);
        let s = cx.state("a");
        let root = cx
            .handle("Panel", &args![&s, Attrs::new().parent(cx.body())])
            .unwrap()
            .node()
            .unwrap();
        cx.dom_mut().detach(root);
        cx.tick();
        let c = cx.component("Panel").unwrap();
        assert!(c.is_mounted());

        let swept = cx.sweep();
        assert_eq!(swept, vec![c.id()]);
        assert!(c.is_unmounted());
    }

    #[test]
    fn sweep_is_scheduled_once_per_tick() {
        let cx = Context::new();
        cx.schedule_sweep();
        cx.schedule_sweep();
        assert_eq!(cx.pending_tasks(), 1);
        cx.tick();
        assert_eq!(cx.pending_tasks(), 0);
    }

    #[test]
    fn sweep_prunes_stale_arguments() {
        let cx = Context::new();
        panel(&cx);
        let s = cx.state("a");
        let body = cx.body();
        cx.handle("Panel", &args![&s, Attrs::new().parent(body)]).unwrap();
        let detached = cx.handle("Panel", &args![&s]).unwrap().node().unwrap();
        let c = cx.component("Panel").unwrap();
        assert_eq!(cx.repository().args_count(c.id()), 2);

        cx.dom_mut().destroy(detached);
        cx.sweep();
        assert_eq!(cx.repository().args_count(c.id()), 1);
    }
}
