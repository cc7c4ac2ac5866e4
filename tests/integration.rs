//! Integration tests for sprig.
//!
//! These tests exercise the public API from outside the crate, verifying that
//! reactivity, the scheduler, the reconciler and components work together.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use sprig::app::{App, AppConfig};
use sprig::component::{on_mounted, render_fn, Component};
use sprig::dom::{Dom, HostOp, NodeId};
use sprig::error::RenderError;
use sprig::reactive::{
    effect, reactive, watch, Computed, EffectOptions, Object, Ref, Value, WatchOptions,
};
use sprig::renderer::Renderer;
use sprig::scheduler::{self, flush_jobs, pending_jobs};
use sprig::testing::snapshot::to_html;
use sprig::testing::Pilot;
use sprig::vnode::{h, VNode};

fn keyed(keys: &[&str]) -> VNode {
    h("ul")
        .children(keys.iter().map(|k| h("li").key(*k).text(*k)))
        .build()
}

fn renderer_with(initial: VNode) -> (Renderer<Dom>, NodeId) {
    let mut dom = Dom::new();
    let root = dom.create_container("root");
    let renderer = Renderer::new(dom);
    renderer.render(Some(initial), root);
    renderer.with_host_mut(Dom::take_ops);
    (renderer, root)
}

fn ops_after(renderer: &Renderer<Dom>, root: NodeId, next: VNode) -> Vec<HostOp> {
    renderer.render(Some(next), root);
    renderer.with_host_mut(Dom::take_ops)
}

fn count(ops: &[HostOp], pred: fn(&HostOp) -> bool) -> usize {
    ops.iter().filter(|op| pred(op)).count()
}

// ---------------------------------------------------------------------------
// Reactivity
// ---------------------------------------------------------------------------

#[test]
fn test_wrapping_same_raw_object_is_cached() {
    let raw = Object::from_iter([("a", 1)]);
    let first = reactive(&raw);
    let second = reactive(&raw);
    assert!(first.ptr_eq(&second));
}

#[test]
fn test_effect_reruns_only_for_real_changes_of_read_keys() {
    let state = reactive(&Object::from_iter([("p", 1), ("q", 1)]));
    let runs = Rc::new(Cell::new(0));
    let _e = effect(
        {
            let state = state.clone();
            let runs = runs.clone();
            move || {
                state.get("p");
                runs.set(runs.get() + 1);
            }
        },
        EffectOptions::new(),
    );
    assert_eq!(runs.get(), 1);
    state.set("p", 2);
    assert_eq!(runs.get(), 2);
    state.set("p", 2);
    assert_eq!(runs.get(), 2);
    state.set("q", 5);
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_derived_value_notified_before_plain_effects() {
    let state = reactive(&Object::from_iter([("x", 1)]));
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    let doubled = Computed::new({
        let state = state.clone();
        let log = log.clone();
        move || {
            log.borrow_mut().push("derived".into());
            state.get("x").as_int().unwrap_or(0) * 2
        }
    });
    let _plain = effect(
        {
            let state = state.clone();
            let log = log.clone();
            move || {
                state.get("x");
                log.borrow_mut().push("plain".into());
            }
        },
        EffectOptions::new(),
    );
    let _dependent = effect(
        {
            let doubled = doubled.clone();
            let log = log.clone();
            move || {
                let value = doubled.get();
                log.borrow_mut().push(format!("dependent:{value}"));
            }
        },
        EffectOptions::new(),
    );
    log.borrow_mut().clear();

    state.set("x", 2);
    assert_eq!(
        *log.borrow(),
        vec!["derived".to_owned(), "dependent:4".to_owned(), "plain".to_owned()]
    );
}

#[test]
fn test_watch_ref_reports_new_and_old_after_flush() {
    let count = Ref::new(1);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handle = watch(
        count.clone(),
        {
            let seen = seen.clone();
            move |new: &Value, old: &Value| seen.borrow_mut().push((new.clone(), old.clone()))
        },
        WatchOptions::new(),
    );
    count.set(2);
    count.set(3);
    assert!(seen.borrow().is_empty());
    flush_jobs();
    assert_eq!(*seen.borrow(), vec![(Value::from(3), Value::from(1))]);

    handle.stop();
    count.set(4);
    flush_jobs();
    assert_eq!(seen.borrow().len(), 1);
}

// ---------------------------------------------------------------------------
// Keyed diff
// ---------------------------------------------------------------------------

#[test]
fn test_swap_in_middle_moves_exactly_one() {
    let old = keyed(&["a", "b", "c", "d"]);
    let (renderer, root) = renderer_with(old.clone());
    let c_el = old.children().as_slice()[2].el();

    let next = keyed(&["a", "c", "b", "d"]);
    let ops = ops_after(&renderer, root, next.clone());

    let moves: Vec<_> = ops.iter().filter(|op| op.is_move()).map(HostOp::node).collect();
    assert_eq!(moves, vec![c_el.expect("mounted")]);
    assert_eq!(count(&ops, HostOp::is_insert), 0);
    assert_eq!(count(&ops, HostOp::is_remove), 0);
    // Every new child reuses the host node of its old counterpart.
    for (old, new) in old.children().as_slice().iter().zip([0, 2, 1, 3]) {
        assert_eq!(old.el(), next.children().as_slice()[new].el());
    }
}

#[test]
fn test_growth_mounts_one() {
    let (renderer, root) = renderer_with(keyed(&["a", "b"]));
    let ops = ops_after(&renderer, root, keyed(&["a", "b", "c"]));
    assert_eq!(count(&ops, HostOp::is_insert), 1);
    assert_eq!(count(&ops, HostOp::is_move), 0);
    assert_eq!(count(&ops, HostOp::is_remove), 0);
}

#[test]
fn test_shrink_unmounts_two() {
    let (renderer, root) = renderer_with(keyed(&["a", "b", "c"]));
    let ops = ops_after(&renderer, root, keyed(&["a"]));
    assert_eq!(count(&ops, HostOp::is_remove), 2);
    assert_eq!(count(&ops, HostOp::is_move), 0);
    assert_eq!(
        renderer.with_host(|dom| to_html(dom, root)),
        "<ul><li>a</li></ul>"
    );
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[test]
fn test_three_writes_cause_one_render() {
    let renders = Rc::new(Cell::new(0));
    let root = Component::new("Triple")
        .data(|| Object::from_iter([("a", 0), ("b", 0), ("c", 0)]))
        .render({
            let renders = renders.clone();
            move |ctx| {
                renders.set(renders.get() + 1);
                let sum: i64 = ["a", "b", "c"]
                    .iter()
                    .map(|k| ctx.get(k).as_int().unwrap_or(0))
                    .sum();
                Ok(h("p").text(sum.to_string()).build())
            }
        })
        .build();
    let pilot = Pilot::new(root);
    assert_eq!(renders.get(), 1);

    let data = pilot.root_instance().expect("mounted").data();
    data.set("a", 1);
    data.set("b", 2);
    data.set("c", 3);
    assert_eq!(renders.get(), 1);
    assert!(scheduler::has_pending_flush());

    pilot.tick();
    assert_eq!(renders.get(), 2);
    assert_eq!(pilot.text("p").as_deref(), Some("6"));
}

#[test]
fn test_batched_render_runs_after_synchronous_burst() {
    let root = Component::new("Async")
        .data(|| Object::from_iter([("n", 0)]))
        .render(|ctx| Ok(h("p").text(ctx.get("n").to_string()).build()))
        .build();
    let output = scheduler::block_on(async move {
        let pilot = Pilot::new(root);
        let data = pilot.root_instance().expect("mounted").data();
        data.set("n", 1);
        data.set("n", 2);
        let before = pilot.text("p");
        pilot.next_tick().await;
        (before, pilot.text("p"))
    })
    .expect("runtime");
    assert_eq!(output, (Some("0".to_owned()), Some("2".to_owned())));
}

#[test]
fn test_render_failure_keeps_mounted_tree() {
    let calls = Rc::new(Cell::new(0));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let root = Component::new("Flaky")
        .data(|| Object::from_iter([("n", 0)]))
        .render({
            let calls = calls.clone();
            move |ctx| {
                calls.set(calls.get() + 1);
                let n = ctx.get("n");
                if calls.get() == 2 {
                    return Err(RenderError::failed("second render"));
                }
                Ok(h("div").child(h("p").text(n.to_string())).build())
            }
        })
        .build();
    let config = AppConfig::new().with_error_handler({
        let errors = errors.clone();
        move |err, name| errors.borrow_mut().push(format!("{name}: {err}"))
    });
    let pilot = Pilot::with_config(root, config);
    let before = pilot.html();
    pilot.take_ops();

    pilot.root_instance().expect("mounted").data().set("n", 1);
    pilot.tick();

    assert_eq!(pilot.html(), before);
    assert!(pilot.take_ops().is_empty());
    assert_eq!(*errors.borrow(), vec!["Flaky: render failed: second render".to_owned()]);

    // The next successful pass patches against the last good tree.
    pilot.root_instance().expect("mounted").data().set("n", 2);
    pilot.tick();
    assert_eq!(pilot.html(), "<div><p>2</p></div>");
}

#[test]
fn test_lifecycle_order() {
    let log = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let push = |name: &'static str| {
        let log = log.clone();
        move |_: &sprig::component::RenderContext| log.borrow_mut().push(name)
    };
    let root = Component::new("Life")
        .data(|| Object::from_iter([("n", 0)]))
        .before_create(push("beforeCreate"))
        .created(push("created"))
        .before_mount(push("beforeMount"))
        .mounted(push("mounted"))
        .before_update(push("beforeUpdate"))
        .updated(push("updated"))
        .unmounted(push("unmounted"))
        .render(|ctx| Ok(VNode::text(ctx.get("n").to_string())))
        .build();

    let mut pilot = Pilot::new(root);
    assert_eq!(
        *log.borrow(),
        vec!["beforeCreate", "created", "beforeMount", "mounted"]
    );

    log.borrow_mut().clear();
    pilot.root_instance().expect("mounted").data().set("n", 1);
    pilot.tick();
    assert_eq!(*log.borrow(), vec!["beforeUpdate", "updated"]);

    log.borrow_mut().clear();
    pilot.unmount();
    assert_eq!(*log.borrow(), vec!["unmounted"]);
}

#[test]
fn test_setup_hooks_and_render() {
    let mounted = Rc::new(Cell::new(false));
    let root = Component::new("Setup")
        .setup({
            let mounted = mounted.clone();
            move |_| {
                let mounted = mounted.clone();
                on_mounted(move |_| mounted.set(true));
                let label = Ref::new("from setup");
                render_fn(move |_| Ok(h("span").text(label.get().to_string()).build()))
            }
        })
        .build();
    let pilot = Pilot::new(root);
    assert!(mounted.get());
    assert_eq!(pilot.html(), "<span>from setup</span>");
}

#[test]
fn test_child_component_keeps_instance_across_parent_updates() {
    let child_renders = Rc::new(Cell::new(0));
    let child = Component::new("Child")
        .data(|| Object::from_iter([("label", "child")]))
        .render({
            let child_renders = child_renders.clone();
            move |ctx| {
                child_renders.set(child_renders.get() + 1);
                Ok(h("em").text(ctx.get("label").to_string()).build())
            }
        })
        .build();
    let parent = Component::new("Parent")
        .data(|| Object::from_iter([("title", "a")]))
        .render(move |ctx| {
            Ok(h("div")
                .child(h("h1").text(ctx.get("title").to_string()))
                .child(h(&child))
                .build())
        })
        .build();

    let pilot = Pilot::new(parent);
    assert_eq!(pilot.html(), "<div><h1>a</h1><em>child</em></div>");

    pilot.root_instance().expect("mounted").data().set("title", "b");
    pilot.tick();
    assert_eq!(pilot.html(), "<div><h1>b</h1><em>child</em></div>");
    assert_eq!(child_renders.get(), 1);
}

#[test]
fn test_child_updates_on_its_own_state() {
    let child = Component::new("Toggle")
        .data(|| Object::from_iter([("on", false)]))
        .render(|ctx| {
            let data = ctx.data();
            let on = ctx.get("on").as_bool().unwrap_or(false);
            Ok(h("button")
                .on("click", move |_| {
                    let on = data.get("on").as_bool().unwrap_or(false);
                    data.set("on", !on);
                })
                .text(if on { "on" } else { "off" })
                .build())
        })
        .build();
    let parent = Component::new("Panel")
        .render(move |_| Ok(h("section").child(h(&child)).build()))
        .build();

    let pilot = Pilot::new(parent);
    pilot.click("button");
    pilot.tick();
    assert_eq!(pilot.text("button").as_deref(), Some("on"));
}

#[test]
fn test_unmount_stops_render_effect() {
    let renders = Rc::new(Cell::new(0));
    let root = Component::new("Gone")
        .data(|| Object::from_iter([("n", 0)]))
        .render({
            let renders = renders.clone();
            move |ctx| {
                renders.set(renders.get() + 1);
                Ok(VNode::text(ctx.get("n").to_string()))
            }
        })
        .build();
    let mut dom = Dom::new();
    let container = dom.create_container("app");
    let mut app = App::new(dom, root);
    let instance = app.mount(container).expect("mounted");
    let data = instance.data();

    app.unmount();
    data.set("n", 1);
    assert_eq!(pending_jobs(), 0);
    flush_jobs();
    assert_eq!(renders.get(), 1);
    assert_eq!(app.with_host(|dom| to_html(dom, container)), "");
}

#[test]
fn test_keyed_component_list_reorders() {
    let item = Component::new("Item")
        .data(|| Object::from_iter([("n", 0)]))
        .render(|ctx| Ok(h("li").text(format!("item-{}", ctx.uid())).build()))
        .build();
    let list = Component::new("List")
        .data(|| Object::from_iter([("reversed", false)]))
        .render(move |ctx| {
            let mut keys = vec![1, 2, 3];
            if ctx.get("reversed").as_bool().unwrap_or(false) {
                keys.reverse();
            }
            Ok(h("ul")
                .children(keys.into_iter().map(|k| h(&item).key(k)))
                .build())
        })
        .build();

    let pilot = Pilot::new(list);
    let before: Vec<String> = pilot
        .app()
        .with_host(|dom| {
            let ul = dom.query(pilot.container(), "ul").expect("ul");
            dom.children(ul).iter().map(|&li| dom.text_content(li)).collect()
        });
    pilot.root_instance().expect("mounted").data().set("reversed", true);
    pilot.tick();
    let after: Vec<String> = pilot
        .app()
        .with_host(|dom| {
            let ul = dom.query(pilot.container(), "ul").expect("ul");
            dom.children(ul).iter().map(|&li| dom.text_content(li)).collect()
        });
    let mut reversed = before.clone();
    reversed.reverse();
    assert_eq!(after, reversed);
}

#[test]
fn test_repeated_keys_in_old_component_list_unmount_the_extra() {
    let unmounted = Rc::new(Cell::new(0));
    let item = Component::new("Item")
        .render(|ctx| Ok(h("li").text(format!("item-{}", ctx.uid())).build()))
        .unmounted({
            let unmounted = unmounted.clone();
            move |_| unmounted.set(unmounted.get() + 1)
        })
        .build();
    let settled = Ref::new(false);
    let list = Component::new("List")
        .render({
            let settled = settled.clone();
            move |_| {
                let keys: &[&str] = if settled.get().as_bool().unwrap_or(false) {
                    &["a", "x", "z"]
                } else {
                    &["x", "a", "a"]
                };
                Ok(h("ul").children(keys.iter().map(|&k| h(&item).key(k))).build())
            }
        })
        .build();

    let pilot = Pilot::new(list);
    settled.set(true);
    pilot.tick();

    assert_eq!(unmounted.get(), 1);
    let items = pilot.app().with_host(|dom| {
        let ul = dom.query(pilot.container(), "ul").expect("ul");
        dom.children(ul).len()
    });
    assert_eq!(items, 3);
}

#[test]
fn test_component_with_empty_fragment_fills_before_sibling() {
    let count = Ref::new(0);
    let items = Component::new("Items")
        .render({
            let count = count.clone();
            move |_| {
                let n = count.get().as_int().unwrap_or(0);
                Ok(VNode::fragment((0..n).map(|i| VNode::text(i.to_string()))))
            }
        })
        .build();
    let root = Component::new("Page")
        .render(move |_| Ok(h("div").child(h(&items)).child(h("hr")).build()))
        .build();

    let pilot = Pilot::new(root);
    assert_eq!(pilot.html(), "<div><hr></hr></div>");

    count.set(2);
    pilot.tick();
    assert_eq!(pilot.html(), "<div>01<hr></hr></div>");

    count.set(0);
    pilot.tick();
    count.set(1);
    pilot.tick();
    assert_eq!(pilot.html(), "<div>0<hr></hr></div>");
}

#[test]
fn test_render_failing_before_any_read_still_retries() {
    let calls = Rc::new(Cell::new(0));
    let root = Component::new("Late")
        .data(|| Object::from_iter([("n", 0)]))
        .render({
            let calls = calls.clone();
            move |ctx| {
                calls.set(calls.get() + 1);
                if matches!(calls.get(), 1 | 3) {
                    return Err(RenderError::failed("not yet"));
                }
                Ok(h("p").text(ctx.get("n").to_string()).build())
            }
        })
        .build();
    let pilot = Pilot::with_config(root, AppConfig::new().with_error_handler(|_, _| {}));
    assert_eq!(pilot.html(), "");
    let data = pilot.root_instance().expect("instance").data();

    // The failed mount read nothing, yet a state change retries it.
    data.set("n", 1);
    pilot.tick();
    assert_eq!(pilot.html(), "<p>1</p>");

    // A failed update keeps the deps of the last good render.
    data.set("n", 2);
    pilot.tick();
    assert_eq!(pilot.html(), "<p>1</p>");
    data.set("n", 3);
    pilot.tick();
    assert_eq!(pilot.html(), "<p>3</p>");
    assert_eq!(calls.get(), 4);
}
