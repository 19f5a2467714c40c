//! Integration Tests for Refs, Memoization and Render-Skip Wrappers

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::{
    create_root_with, deep_memo, deps, h, memo, use_auto_callback, use_callback, use_deep_memo,
    use_effect, use_memo, use_memo_with, use_ref, use_state, Callback, Component, Deps, Host,
    MemoryDocument, NodeId, Props, Ref, Root, RootConfig, Setter, TaskQueue, VNode, Value,
};

struct Slot<T>(Rc<RefCell<Option<T>>>);

impl<T> Slot<T> {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    fn put(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone().expect("slot is filled by a render")
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

struct Harness {
    doc: Rc<MemoryDocument>,
    container: NodeId,
    queue: TaskQueue,
    root: Root,
}

impl Harness {
    fn new() -> Self {
        let doc = Rc::new(MemoryDocument::new());
        let container = doc.create_element("div");
        let queue = TaskQueue::new();
        let root = create_root_with(
            doc.clone(),
            container,
            queue.clone(),
            RootConfig::production(),
        )
        .expect("container is an element");

        Self {
            doc,
            container,
            queue,
            root,
        }
    }

    fn render(&self, node: VNode) {
        self.root.render(node).expect("render succeeds");
        self.queue.run_until_idle();
    }

    /// Apply a state update and drain the passes it causes.
    fn set<T: Clone + PartialEq + 'static>(&self, setter: &Slot<Setter<T>>, value: T) {
        setter.get().set(value);
        self.queue.run_until_idle();
    }

    fn html(&self) -> String {
        self.doc.inner_html(self.container)
    }
}

fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

fn bump(c: &Cell<usize>) {
    c.set(c.get() + 1);
}

fn deps_of(value: &Value) -> Deps {
    Deps::from(value.as_list().unwrap_or_default().to_vec())
}

fn props_of(value: &Value) -> Props {
    value
        .as_map()
        .map(|entries| {
            entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

// ---- Refs ----

#[test]
fn refs_are_stable_per_component_instance() {
    let hx = Harness::new();
    let seen: Rc<RefCell<Vec<Ref<i32>>>> = Rc::default();
    let force = Slot::new();

    let holder = {
        let seen = seen.clone();
        Component::new("Holder", move |_| {
            seen.borrow_mut().push(use_ref(0));
            Ok(None)
        })
    };
    let app = {
        let force = force.clone();
        Component::new("App", move |_| {
            let (tick, set_tick) = use_state(0);
            force.put(set_tick);
            Ok(Some(h(
                "div",
                Props::new().with("data-tick", tick),
                [h(&holder, Props::new(), ()), h(&holder, Props::new(), ())],
            )))
        })
    };

    hx.render(h(&app, Props::new(), ()));
    hx.set(&force, 1);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    assert!(seen[0].ptr_eq(&seen[2]));
    assert!(seen[1].ptr_eq(&seen[3]));
    assert!(!seen[0].ptr_eq(&seen[1]));
}

#[test]
fn ref_writes_do_not_render() {
    let hx = Harness::new();
    let renders = counter();
    let cell = Slot::new();
    let force = Slot::new();

    let component = {
        let (renders, cell, force) = (renders.clone(), cell.clone(), force.clone());
        Component::new("Quiet", move |_| {
            bump(&renders);
            let (_, set_tick) = use_state(0);
            force.put(set_tick);
            let r = use_ref(0);
            cell.put(r.clone());
            Ok(Some(h("i", Props::new(), r.get())))
        })
    };

    hx.render(h(&component, Props::new(), ()));
    cell.get().set(1);
    assert_eq!(hx.queue.pending(), 0);
    assert_eq!(hx.html(), "<i>0</i>");

    hx.set(&force, 1);
    assert_eq!(renders.get(), 2);
    assert_eq!(hx.html(), "<i>1</i>");
}

// ---- Memoization ----

/// A component memoizing a factory under dependencies taken from state.
fn memo_counter<M>(calls: &Rc<Cell<usize>>, deps: &Slot<Setter<Value>>, memoize: M) -> Component
where
    M: Fn(Box<dyn FnOnce()>, Deps) + 'static,
{
    let (calls, deps) = (calls.clone(), deps.clone());
    Component::new("Counted", move |_| {
        let (list, set_list) = use_state(Value::list([42]));
        deps.put(set_list);
        let calls = calls.clone();
        memoize(Box::new(move || bump(&calls)), deps_of(&list));
        Ok(None)
    })
}

#[test]
fn memo_recomputes_when_a_dependency_changes_identity() {
    let hx = Harness::new();
    let calls = counter();
    let deps = Slot::new();
    let counted = memo_counter(&calls, &deps, |factory, d| use_memo(factory, d));

    hx.render(h(&counted, Props::new(), ()));
    assert_eq!(calls.get(), 1);

    hx.set(&deps, Value::list([42]));
    assert_eq!(calls.get(), 1);

    hx.set(&deps, Value::list([43]));
    assert_eq!(calls.get(), 2);

    hx.set(&deps, Value::list([42, 43]));
    assert_eq!(calls.get(), 3);
    hx.set(&deps, Value::list([42, 43]));
    assert_eq!(calls.get(), 3);

    let obj = Value::map(Vec::<(String, Value)>::new());
    hx.set(&deps, Value::list([obj.clone()]));
    assert_eq!(calls.get(), 4);
    hx.set(&deps, Value::list([obj.clone()]));
    assert_eq!(calls.get(), 4);

    // an equal but distinct object is a new dependency
    hx.set(&deps, Value::list([Value::map(Vec::<(String, Value)>::new())]));
    assert_eq!(calls.get(), 5);
}

#[test]
fn memo_with_custom_comparator() {
    let hx = Harness::new();
    let calls = counter();
    let deps = Slot::new();
    let counted = memo_counter(&calls, &deps, |factory, d| {
        use_memo_with(factory, d, |prev: &[Value], next: &[Value]| {
            prev.first().zip(next.first()).is_some_and(|(a, b)| a.same(b))
        })
    });

    hx.render(h(&counted, Props::new(), ()));
    assert_eq!(calls.get(), 1);

    hx.set(&deps, Value::list([43]));
    assert_eq!(calls.get(), 2);

    hx.set(&deps, Value::list([43, 44]));
    assert_eq!(calls.get(), 2);

    hx.set(&deps, Value::list([41, 44]));
    assert_eq!(calls.get(), 3);
}

#[test]
fn deep_memo_compares_structure() {
    let hx = Harness::new();
    let calls = counter();
    let deps = Slot::new();
    let counted = memo_counter(&calls, &deps, |factory, d| use_deep_memo(factory, d));
    let empty = || Value::map(Vec::<(String, Value)>::new());

    hx.render(h(&counted, Props::new(), ()));
    hx.set(&deps, Value::list([empty()]));
    assert_eq!(calls.get(), 2);
    hx.set(&deps, Value::list([empty()]));
    assert_eq!(calls.get(), 2);

    hx.set(&deps, Value::list([Value::map([("a", 1)])]));
    assert_eq!(calls.get(), 3);
    hx.set(&deps, Value::list([Value::map([("a", 1)])]));
    assert_eq!(calls.get(), 3);

    hx.set(&deps, Value::list([Value::list([1, 2])]));
    assert_eq!(calls.get(), 4);
    hx.set(&deps, Value::list([Value::list([1, 2])]));
    assert_eq!(calls.get(), 4);

    hx.set(&deps, Value::list([Value::list([1, 2, 3])]));
    assert_eq!(calls.get(), 5);
}

#[test]
fn callback_identity_follows_dependencies() {
    let hx = Harness::new();
    let seen: Rc<RefCell<Vec<Callback>>> = Rc::default();
    let deps = Slot::new();

    let component = {
        let (seen, deps) = (seen.clone(), deps.clone());
        Component::new("Handler", move |_| {
            let (list, set_list) = use_state(Value::list(["a"]));
            deps.put(set_list);
            let cb = use_callback(|arg: &Value| arg.clone(), deps_of(&list));
            seen.borrow_mut().push(cb);
            Ok(None)
        })
    };

    hx.render(h(&component, Props::new(), ()));
    hx.set(&deps, Value::list(["a"]));
    hx.set(&deps, Value::list(["b"]));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].ptr_eq(&seen[1]));
    assert!(!seen[1].ptr_eq(&seen[2]));
    assert_eq!(seen[2].call(&Value::from(7)), Value::from(7));
}

#[test]
fn auto_callback_is_stable_and_never_stale() {
    let hx = Harness::new();
    let runs = Rc::new(RefCell::new([0usize; 3]));
    let callbacks: Slot<[Callback; 3]> = Slot::new();
    let count = Slot::new();

    let component = {
        let (runs, callbacks, count) = (runs.clone(), callbacks.clone(), count.clone());
        Component::new("Doubler", move |_| {
            let (n, set_n) = use_state(0);
            count.put(set_n);

            let auto = use_auto_callback(move |_: &Value| n * 2);
            let frozen = use_callback(move |_: &Value| n * 2, deps![]);
            let tracked = use_callback(move |_: &Value| n * 2, deps![n]);

            for (i, cb) in [&auto, &frozen, &tracked].into_iter().enumerate() {
                let runs = runs.clone();
                use_effect(move || runs.borrow_mut()[i] += 1, deps![cb.clone()]);
            }

            callbacks.put([auto, frozen, tracked]);
            Ok(None)
        })
    };

    let results = || callbacks.get().map(|cb| cb.invoke().as_f64().unwrap_or(-1.0));

    hx.render(h(&component, Props::new(), ()));
    assert_eq!(*runs.borrow(), [1, 1, 1]);

    hx.set(&count, 1);
    assert_eq!(results(), [2.0, 0.0, 2.0]);
    assert_eq!(*runs.borrow(), [1, 1, 2]);

    hx.set(&count, 2);
    assert_eq!(results(), [4.0, 0.0, 4.0]);
    assert_eq!(*runs.borrow(), [1, 1, 3]);
}

// ---- Render-skip wrappers ----

/// A parent rendering `wrap(Test)` with props taken from state, and a count
/// of how often `Test` itself ran.
fn wrapped_counter(
    wrap: fn(&Component) -> Component,
    initial: Value,
) -> (Component, Rc<Cell<usize>>, Slot<Setter<Value>>) {
    let calls = counter();
    let props = Slot::new();

    let inner = {
        let calls = calls.clone();
        Component::new("Test", move |props: &Props| {
            bump(&calls);
            let value = props.get("value").cloned().unwrap_or_default();
            Ok(Some(h(
                "div",
                Props::new().with("data-testid", "test-component"),
                value.to_attribute_string(),
            )))
        })
    };
    let wrapped = wrap(&inner);

    let parent = {
        let props = props.clone();
        Component::new("Wrapper", move |_| {
            let (current, set_current) = use_state(initial.clone());
            props.put(set_current);
            Ok(Some(h(&wrapped, props_of(&current), ())))
        })
    };

    (parent, calls, props)
}

#[test]
fn memo_skips_shallowly_equal_props() {
    let hx = Harness::new();
    let (parent, calls, props) = wrapped_counter(memo, Value::map([("value", 1)]));

    hx.render(h(&parent, Props::new(), ()));
    assert_eq!(calls.get(), 1);
    assert_eq!(
        hx.html(),
        r#"<div data-testid="test-component">1</div>"#
    );

    hx.set(&props, Value::map([("value", 1)]));
    assert_eq!(calls.get(), 1);

    hx.set(&props, Value::map([("value", 2)]));
    assert_eq!(calls.get(), 2);
    assert_eq!(hx.html(), r#"<div data-testid="test-component">2</div>"#);

    hx.set(&props, Value::map([("value", 2)]));
    assert_eq!(calls.get(), 2);

    // shallow comparison: a fresh nested object is a change
    let styled = || {
        Value::map([
            ("value", Value::from(2)),
            ("style", Value::map([("color", "#09F")])),
        ])
    };
    hx.set(&props, styled());
    assert_eq!(calls.get(), 3);
    hx.set(&props, styled());
    assert_eq!(calls.get(), 4);
}

#[test]
fn deep_memo_skips_structurally_equal_props() {
    let hx = Harness::new();
    let (parent, calls, props) = wrapped_counter(deep_memo, Value::map([("value", 1)]));

    hx.render(h(&parent, Props::new(), ()));
    hx.set(&props, Value::map([("value", 2)]));
    assert_eq!(calls.get(), 2);

    hx.set(
        &props,
        Value::map([
            ("value", Value::from(2)),
            ("style", Value::map([("color", "#09F")])),
        ]),
    );
    assert_eq!(calls.get(), 3);

    // equal structure in a different key order
    hx.set(
        &props,
        Value::map([
            ("style", Value::map([("color", "#09F")])),
            ("value", Value::from(2)),
        ]),
    );
    assert_eq!(calls.get(), 3);

    hx.set(
        &props,
        Value::map([
            ("value", Value::from(2)),
            ("style", Value::map([("color", "#0F0")])),
        ]),
    );
    assert_eq!(calls.get(), 4);
}

#[test]
fn deep_memo_compares_nested_objects_and_arrays() {
    let hx = Harness::new();
    let nested = |b: i32| Value::map([("value", Value::map([("a", Value::map([("b", b)]))]))]);
    let (parent, calls, props) = wrapped_counter(deep_memo, nested(1));

    hx.render(h(&parent, Props::new(), ()));
    hx.set(&props, nested(1));
    assert_eq!(calls.get(), 1);
    hx.set(&props, nested(2));
    assert_eq!(calls.get(), 2);

    hx.set(&props, Value::map([("value", Value::list([1, 2]))]));
    assert_eq!(calls.get(), 3);
    hx.set(&props, Value::map([("value", Value::list([1, 2]))]));
    assert_eq!(calls.get(), 3);
    hx.set(&props, Value::map([("value", Value::list([2, 1]))]));
    assert_eq!(calls.get(), 4);
}

#[test]
fn memoized_component_still_renders_its_own_updates() {
    let hx = Harness::new();
    let calls = counter();
    let inner_state = Slot::new();
    let outer_state = Slot::new();

    let inner = {
        let (calls, inner_state) = (calls.clone(), inner_state.clone());
        Component::new("Badge", move |props: &Props| {
            bump(&calls);
            let (clicks, set_clicks) = use_state(0);
            inner_state.put(set_clicks);
            let label = props.get("label").and_then(Value::as_str).unwrap_or_default();
            Ok(Some(h("b", Props::new(), format!("{}:{}", label, clicks))))
        })
    };
    let badge = memo(&inner);

    let app = {
        let outer_state = outer_state.clone();
        Component::new("App", move |_| {
            let (tick, set_tick) = use_state(0);
            outer_state.put(set_tick);
            Ok(Some(h(
                "p",
                Props::new().with("data-tick", tick),
                h(&badge, Props::new().with("label", "x"), ()),
            )))
        })
    };

    hx.render(h(&app, Props::new(), ()));
    assert_eq!(hx.html(), r#"<p data-tick="0"><b>x:0</b></p>"#);

    hx.set(&outer_state, 1);
    assert_eq!(calls.get(), 1);
    assert_eq!(hx.html(), r#"<p data-tick="1"><b>x:0</b></p>"#);

    // state below the wrapper survived the skipped render
    hx.set(&inner_state, 5);
    assert_eq!(calls.get(), 2);
    assert_eq!(hx.html(), r#"<p data-tick="1"><b>x:5</b></p>"#);
}
