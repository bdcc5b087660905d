//! Integration tests for openscript.
//!
//! These tests exercise the public API from outside the crate: cells driving
//! component re-renders, the lifecycle order of nested components, node
//! listener indirection, disposal, placeholders and the testing helpers.

use std::cell::RefCell;
use std::rc::Rc;

use openscript::testing::{body_snapshot, Pilot};
use openscript::{
    args, json, Arg, Attrs, Context, DomEvent, Emission, Error, Markup, Render, Subscriber,
};
use pretty_assertions::assert_eq;

fn log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

fn value_of(args: &[Arg]) -> openscript::Value {
    args.iter()
        .find_map(Arg::as_state)
        .map(|s| s.get())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[test]
fn setting_an_equal_primitive_fires_nothing() {
    let cx = Context::new();
    let c = cx.state(7);
    let calls = log();
    let l = calls.clone();
    c.on_change(move |_, _| {
        l.borrow_mut().push("fired".into());
        Ok(())
    });
    c.set(7);
    c.set(7.0);
    assert!(calls.borrow().is_empty());
}

#[test]
fn change_fires_each_listener_once_in_order() {
    let cx = Context::new();
    let c = cx.state("a");
    let calls = log();
    for name in ["first", "second", "third"] {
        let l = calls.clone();
        c.on_change(move |_, _| {
            l.borrow_mut().push(name.into());
            Ok(())
        });
    }
    c.set("b");
    assert_eq!(*calls.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn once_and_off() {
    let cx = Context::new();
    let c = cx.state(0);
    let calls = log();
    let l = calls.clone();
    c.once(Subscriber::callback(move |s, _| {
        l.borrow_mut().push(format!("once:{}", s.get()));
        Ok(())
    }));
    let l = calls.clone();
    let key = c.on_change(move |s, _| {
        l.borrow_mut().push(format!("always:{}", s.get()));
        Ok(())
    });

    c.set(1);
    assert!(c.off(&key));
    c.set(2);
    c.set(3);

    assert_eq!(*calls.borrow(), vec!["once:1", "always:1"]);
    assert!(!c.off(&key));
}

#[test]
fn failing_listener_does_not_stop_the_rest() {
    let cx = Context::new();
    let c = cx.state(0);
    let calls = log();
    c.on_change(|_, _| Err(Error::listener("boom")));
    let l = calls.clone();
    c.on_change(move |_, _| {
        l.borrow_mut().push("ran".into());
        Ok(())
    });
    c.set(1);
    assert_eq!(*calls.borrow(), vec!["ran"]);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn counter_patches_in_place_under_a_detached_parent() {
    let cx = Context::new();
    cx.register_fn("C", |cx, args| cx.handle("div", &args![value_of(args)]));
    let counter = cx.state(0);
    let p = cx.element("section", &[]).unwrap();

    let c = cx.obtain("C").unwrap();
    c.wrap(&args![&counter, Attrs::new().parent(p)]).unwrap();
    assert_eq!(cx.dom().text_content(p), "0");
    let root = cx.dom().children(p)[0];
    let div = cx.dom().children(root)[0];

    counter.set(1);

    assert_eq!(cx.dom().text_content(p), "1");
    assert_eq!(cx.dom().children(root), &[div]);
    assert_eq!(cx.dom().tag(div), Some("div"));
}

#[test]
fn nested_components_emit_in_pipeline_order() {
    let cx = Context::new();
    cx.register_fn("Parent", |cx, _| {
        let child = cx.handle("Child", &[])?;
        cx.handle("div", &args![child])
    });
    cx.register_fn("Child", |cx, _| cx.handle("span", &args!["child"]));

    let order = log();
    for name in ["Parent", "Child"] {
        for event in ["rendered", "mounted"] {
            let o = order.clone();
            cx.on(name, event, move |_, e: &Emission| {
                o.borrow_mut().push(format!("{name}.{}", e.event));
                Ok(())
            });
        }
    }

    cx.handle("Parent", &args![Attrs::new().parent(cx.body())])
        .unwrap();

    assert_eq!(
        *order.borrow(),
        vec![
            "Child.rendered",
            "Parent.rendered",
            "Child.rendered",
            "Parent.mounted",
            "Child.mounted",
        ]
    );
    assert!(cx.component("Child").unwrap().is_mounted());
}

#[test]
fn mounting_twice_mounts_once() {
    let cx = Context::new();
    cx.register_fn("Once", |cx, _| cx.handle("p", &[]));
    let mounted = log();
    let m = mounted.clone();
    cx.on("Once", "mounted", move |_, _| {
        m.borrow_mut().push("mounted".into());
        Ok(())
    });
    let c = cx.run("Once").unwrap();
    c.mount().unwrap();
    assert_eq!(mounted.borrow().len(), 1);
}

#[test]
fn render_errors_reach_the_caller() {
    let cx = Context::new();
    cx.register_fn("Broken", |_, _| Err(Error::render("Broken", "missing data")));
    let err = cx.handle("Broken", &[]).unwrap_err();
    assert_eq!(err.to_string(), r#"render of component "Broken" failed: missing data"#);
}

#[test]
fn visibility_survives_rerender() {
    let cx = Context::new();
    cx.register_fn("Label", |cx, args| cx.handle("i", &args![value_of(args)]));
    let text = cx.state("a");
    let root = cx
        .handle("Label", &args![&text, Attrs::new().parent(cx.body())])
        .unwrap()
        .node()
        .unwrap();
    assert!(cx.hide("Label"));
    text.set("b");
    assert_eq!(cx.dom().attribute(root, "style"), Some("display: none;"));
    assert!(cx.show("Label"));
    assert_eq!(cx.dom().attribute(root, "style"), None);
    assert_eq!(cx.dom().text_content(root), "b");
}

struct TodoList;

impl Render for TodoList {
    fn render(&self, cx: &Context, args: &[Arg]) -> openscript::Result<Markup> {
        let Some(items) = args.iter().find_map(Arg::as_state) else {
            return cx.handle("ul", &[]);
        };
        let rows: Vec<Arg> = items
            .values()
            .into_iter()
            .map(|item| cx.handle("li", &args![item]).map(Arg::from))
            .collect::<openscript::Result<_>>()?;
        cx.handle("ul", &args![Attrs::new().class("todos"), rows])
    }
}

#[test]
fn list_grows_and_shrinks_with_its_cell() {
    let cx = Context::new();
    cx.register("TodoList", || TodoList);
    let items = cx.state(json!(["milk"]));
    let root = cx
        .handle("TodoList", &args![&items, Attrs::new().parent(cx.body())])
        .unwrap()
        .node()
        .unwrap();
    let ul = cx.dom().children(root)[0];

    items.push("eggs").unwrap();
    items.push("bread").unwrap();
    assert_eq!(
        cx.dom().inner_html(ul),
        "<li>milk</li><li>eggs</li><li>bread</li>"
    );

    items.remove_key("0");
    assert_eq!(cx.dom().inner_html(ul), "<li>eggs</li><li>bread</li>");
    assert_eq!(cx.dom().children(root), &[ul]);
}

#[test]
fn anonymous_component_tracks_its_cell() {
    let cx = Context::new();
    let name = cx.state("Ada");
    let markup = cx
        .anonymous(
            &name,
            |cx, s| cx.handle("b", &args![s.get()]).map(Arg::from),
            &args![Attrs::new().parent(cx.body())],
        )
        .unwrap();
    let root = markup.node().unwrap();
    assert_eq!(cx.dom().tag(root), Some("ojs-anonym-0"));
    name.set("Grace");
    assert_eq!(
        cx.dom().inner_html(root),
        "<ojs-wrapper><b>Grace</b></ojs-wrapper>"
    );
}

#[test]
fn reconcile_patches_class_and_text_on_the_same_element() {
    let cx = Context::new();
    let current = cx.element("div", &args![Attrs::new().class("a"), "x"]).unwrap();
    let incoming = cx.element("div", &args![Attrs::new().class("b"), "y"]).unwrap();

    assert!(cx.reconcile(incoming, current));

    let dom = cx.dom();
    assert_eq!(dom.attribute(current, "class"), Some("b"));
    assert_eq!(dom.text_content(current), "y");
    assert_eq!(dom.outer_html(current), r#"<div class="b">y</div>"#);
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[test]
fn placeholders_materialize_when_the_component_mounts() {
    let cx = Context::new();
    let body = cx.body();
    cx.handle("Card", &args![Attrs::new().parent(body), "first"])
        .unwrap();
    cx.handle("Card", &args![Attrs::new().parent(body), "second"])
        .unwrap();
    assert_eq!(cx.repository().placeholder_count(), 2);

    cx.register_fn("Card", |cx, args| {
        let text = args.iter().find_map(Arg::as_value).cloned().unwrap_or_default();
        cx.handle("article", &args![text])
    });
    let bound = log();
    let b = bound.clone();
    cx.on("Card", "markup-bound", move |_, _| {
        b.borrow_mut().push("markup-bound".into());
        Ok(())
    });
    cx.run("Card").unwrap();
    cx.tick();

    assert_eq!(bound.borrow().len(), 2);
    assert_eq!(cx.repository().placeholder_count(), 0);
    insta::assert_snapshot!(body_snapshot(&cx), @r#"
    <ojs-card uid=* key=* class="__ojs-c-class__">
      <article>
        "first"
    <ojs-card uid=* key=* class="__ojs-c-class__">
      <article>
        "second"
    "#);
}

// ---------------------------------------------------------------------------
// Node listeners and methods
// ---------------------------------------------------------------------------

#[test]
fn five_logical_listeners_share_one_native_listener() {
    let cx = Context::new();
    let hits = Rc::new(RefCell::new(0));
    let mut attrs = Attrs::new().parent(cx.body());
    for _ in 0..5 {
        let h = hits.clone();
        attrs = attrs.on("click", move |_, _| {
            *h.borrow_mut() += 1;
            Ok(())
        });
    }
    let button = cx.element("button", &args![attrs]).unwrap();
    assert_eq!(cx.dom().event_listener_count(button, "click"), 1);
    assert_eq!(cx.repository().listeners(button, "click").len(), 5);

    cx.dispatch(&DomEvent::new("click", button));
    assert_eq!(*hits.borrow(), 5);
}

#[test]
fn methods_survive_reconciliation() {
    let cx = Context::new();
    cx.register_fn("Field", |cx, args| {
        let label = value_of(args);
        cx.handle(
            "input",
            &args![Attrs::new()
                .attr("placeholder", label.clone())
                .method("label", move |_, _, _| Ok(label.clone()))],
        )
    });
    let label = cx.state("name");
    let root = cx
        .handle("Field", &args![&label, Attrs::new().parent(cx.body())])
        .unwrap()
        .node()
        .unwrap();
    let input = cx.dom().children(root)[0];

    label.set("email");

    assert_eq!(cx.dom().children(root), &[input]);
    assert_eq!(cx.call_method(input, "label", &[]).unwrap(), json!("email"));
    assert_eq!(cx.dom().attribute(input, "placeholder"), Some("email"));
}

// ---------------------------------------------------------------------------
// Disposal
// ---------------------------------------------------------------------------

#[test]
fn removing_a_root_unmounts_after_one_tick() {
    let cx = Context::new();
    cx.register_fn("Panel", |cx, args| cx.handle("p", &args![value_of(args)]));
    let s = cx.state(1);
    let root = cx
        .handle("Panel", &args![&s, Attrs::new().parent(cx.body())])
        .unwrap()
        .node()
        .unwrap();
    let panel = cx.component("Panel").unwrap();

    cx.dom_mut().detach(root);
    assert!(cx.component("Panel").is_some());
    cx.tick();

    assert!(cx.component("Panel").is_none());
    assert!(cx.component_by_id(panel.id()).is_none());
    assert_eq!(s.listener_count(), 0);
    assert!(panel.states().is_empty());
}

#[test]
fn nested_components_go_with_their_parent() {
    let cx = Context::new();
    cx.register_fn("Outer", |cx, _| {
        let inner = cx.handle("Inner", &[])?;
        cx.handle("div", &args![inner])
    });
    cx.register_fn("Inner", |cx, _| cx.handle("span", &args!["inner"]));
    let root = cx
        .handle("Outer", &args![Attrs::new().parent(cx.body())])
        .unwrap()
        .node()
        .unwrap();
    let inner = cx.component("Inner").unwrap();

    cx.dom_mut().detach(root);
    cx.tick();

    assert!(inner.is_unmounted());
    assert_eq!(cx.repository().component_count(), 0);
}

#[test]
fn sweep_after_rerender_collects_dropped_children() {
    let cx = Context::new();
    let show = cx.state(true);
    cx.register_fn("Toggle", |cx, args| {
        let visible = openscript::value::is_truthy(&value_of(args));
        if visible {
            let child = cx.handle("Leaf", &[])?;
            cx.handle("div", &args![child])
        } else {
            cx.handle("div", &[])
        }
    });
    cx.register_fn("Leaf", |cx, _| cx.handle("em", &args!["leaf"]));
    cx.handle("Toggle", &args![&show, Attrs::new().parent(cx.body())])
        .unwrap();
    let leaf = cx.component("Leaf").unwrap();
    assert!(leaf.is_mounted());

    show.set(false);
    cx.tick();

    assert!(leaf.is_unmounted());
    assert!(cx.component("Toggle").unwrap().is_mounted());
}

#[test]
fn listener_subscription_is_released_on_unmount() {
    let cx = Context::new();
    cx.register_fn("Badge", |cx, _| cx.handle("b", &[]));
    let s = cx.state(0);
    let badge = cx.obtain("Badge").unwrap();

    s.listener(&badge);
    s.listener(&badge);
    assert_eq!(badge.states(), vec![s.id()]);
    assert_eq!(s.listener_count(), 1);

    assert!(badge.unmount());
    assert_eq!(s.listener_count(), 0);
    assert!(badge.states().is_empty());

    s.listener(&badge);
    assert_eq!(s.listener_count(), 0);
}

#[test]
fn unmounted_component_is_never_re_registered() {
    let cx = Context::new();
    cx.register_fn("Panel", |cx, args| cx.handle("p", &args![value_of(args)]));
    let s = cx.state(1);
    let panel = cx.obtain("Panel").unwrap();
    panel
        .wrap(&args![&s, Attrs::new().parent(cx.body())])
        .unwrap();
    assert!(panel.is_mounted());

    panel.unmount();
    cx.tick();
    panel
        .wrap(&args![&s, Attrs::new().parent(cx.body())])
        .unwrap();
    cx.tick();

    assert!(panel.is_unmounted());
    assert!(!panel.is_mounted());
    assert_eq!(cx.repository().args_count(panel.id()), 0);
    assert_eq!(cx.repository().component_count(), 0);
    assert!(cx.component("Panel").is_none());
    assert_eq!(s.listener_count(), 0);
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[test]
fn container_resolves_through_the_context() {
    let cx = Context::new();
    cx.container()
        .value("greeting", String::from("hello"))
        .singleton("shout", |c| {
            let greeting = c.resolve::<String>("greeting")?;
            Ok(greeting.to_uppercase())
        });
    let shout = cx.container().resolve::<String>("shout").unwrap();
    assert_eq!(shout.as_str(), "HELLO");
    assert!(matches!(
        cx.container().resolve::<u32>("missing"),
        Err(Error::ServiceNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

#[test]
fn pilot_drives_a_counter() {
    let mut pilot = Pilot::new();
    let count = pilot.context().state(0);
    pilot.context().register_fn("Counter", |cx, args| {
        let Some(count) = args.iter().find_map(Arg::as_state).cloned() else {
            return cx.handle("p", &[]);
        };
        let target = count.clone();
        let button = cx.handle(
            "button",
            &args![
                Attrs::new().id("inc").on("click", move |_, _| {
                    let next = target.get().as_i64().unwrap_or(0) + 1;
                    target.set(next);
                    Ok(())
                }),
                "+"
            ],
        )?;
        cx.handle("p", &args![Attrs::new().class("count"), &count, button])
    });
    pilot.mount("Counter", &args![&count]).unwrap();

    let button = pilot.query("#inc").unwrap();
    pilot.click(button);
    pilot.click(button);
    pilot.tick();

    assert_eq!(count.get(), json!(2));
    assert_eq!(pilot.text("p.count"), Some("2+".to_owned()));
    assert_eq!(pilot.query("#inc"), Some(button));
}

#[cfg(feature = "macros")]
#[test]
fn html_macro_builds_the_same_tree() {
    let cx = Context::new();
    let body = cx.body();
    let markup = openscript::html!(cx,
        <ul class="items" parent={body}>
            <li>"one"</li>
            <li data-n="2">{2}</li>
        </ul>
    )
    .unwrap();
    let ul = markup.node().unwrap();
    assert_eq!(
        cx.dom().outer_html(ul),
        r#"<ul class="items"><li>one</li><li data-n="2">2</li></ul>"#
    );
}
