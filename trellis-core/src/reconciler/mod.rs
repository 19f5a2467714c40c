//! Reconciler
//!
//! Brings the document in line with a new descriptor tree, reusing the live
//! instances of the previous pass wherever identity allows.
//!
//! # Decisions per Position
//!
//! | previous | next    | action                                   |
//! |----------|---------|------------------------------------------|
//! | none     | node    | mount                                    |
//! | instance | none    | unmount (remove owned document nodes)    |
//! | instance | node    | update if type and key match, else unmount then mount |
//!
//! Every matched component is invoked again. The one exception is a
//! render-skip wrapper (see [`memo`](crate::memo)) that hands back the very
//! descriptor it returned last time: if no state changed at or below that
//! position since the previous pass, the wrapped subtree is kept as it is.
//!
//! # Children
//!
//! Previous children are split into a keyed map and a FIFO of keyless
//! instances. A keyed child takes the instance with its key; a keyless child
//! takes the next keyless instance in order, whatever its type (a type
//! mismatch then remounts). Unclaimed instances are unmounted. Document
//! order is then fixed by walking the new children backwards and inserting
//! each one's nodes before the nodes of the child after it.
//!
//! # Component Errors
//!
//! A component that returns an error renders as an empty `div` instead. Its
//! hook state is kept, so the next render can recover.

mod instance;

pub(crate) use instance::{Instance, InstanceKind};

use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{error, trace};

use crate::dom::nodes::{first_dom, insert_instance, remove_instance};
use crate::dom::props::{set_props, update_props};
use crate::dom::{Host, NodeId};
use crate::hooks::HookContext;
use crate::node::{create_child_path, h, Component, NodeType, Props, VNode};
use crate::runtime::Runtime;

pub(crate) struct Reconciler<'a> {
    runtime: &'a Rc<Runtime>,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(runtime: &'a Rc<Runtime>) -> Self {
        Self { runtime }
    }

    fn host(&self) -> &dyn Host {
        &*self.runtime.host
    }

    /// Reconcile one position under `parent`.
    pub(crate) fn reconcile(
        &self,
        parent: NodeId,
        previous: Option<Instance>,
        next: Option<&VNode>,
        path: &str,
    ) -> Option<Instance> {
        match (previous, next) {
            (None, None) => None,
            (Some(previous), None) => {
                trace!(path = %previous.path, "unmount");
                remove_instance(self.host(), parent, &previous);
                None
            }
            (None, Some(node)) => {
                trace!(path, "mount");
                Some(self.mount(parent, node, path))
            }
            (Some(previous), Some(node)) => {
                if previous.node.ty() != node.ty() || previous.node.key() != node.key() {
                    trace!(path, "replace");
                    remove_instance(self.host(), parent, &previous);
                    return Some(self.mount(parent, node, path));
                }

                trace!(path, "update");
                Some(self.update(parent, previous, node, path))
            }
        }
    }

    /// Whether a wrapper's repeated descriptor can keep its subtree.
    fn can_retain(&self, previous: &Instance, node: &VNode, path: &str) -> bool {
        previous.node.ptr_eq(node)
            && &*previous.path == path
            && !self.runtime.hooks.borrow().has_pending_within(path)
    }

    /// Keep a subtree alive without rendering it.
    fn retain(&self, instance: &Instance) {
        let mut hooks = self.runtime.hooks.borrow_mut();
        instance.walk(&mut |inst| {
            if inst.kind == InstanceKind::Component {
                hooks.mark_visited(inst.path.clone());
            }
        });
    }

    fn mount(&self, parent: NodeId, node: &VNode, path: &str) -> Instance {
        let host = self.host();

        match node.ty() {
            NodeType::Text => {
                let dom = host.create_text(node.text().unwrap_or_default());
                host.append_child(parent, dom);
                Instance::new(InstanceKind::Text, Some(dom), node, Vec::new(), path)
            }
            NodeType::Fragment => {
                let children = self.reconcile_children(parent, Vec::new(), node.children(), path);
                Instance::new(InstanceKind::Fragment, None, node, children, path)
            }
            NodeType::Host(tag) => {
                let dom = host.create_element(tag);
                set_props(host, dom, node.props());
                let children = self.reconcile_children(dom, Vec::new(), node.children(), path);
                host.append_child(parent, dom);
                Instance::new(InstanceKind::Host, Some(dom), node, children, path)
            }
            NodeType::Component(component) => {
                let child = self.render_child(parent, component, None, node, path);
                Instance::new(
                    InstanceKind::Component,
                    None,
                    node,
                    child.into_iter().collect(),
                    path,
                )
            }
        }
    }

    fn update(
        &self,
        parent: NodeId,
        mut instance: Instance,
        node: &VNode,
        path: &str,
    ) -> Instance {
        let host = self.host();
        let previous_children = std::mem::take(&mut instance.children);

        instance.children = match (node.ty(), instance.dom) {
            (NodeType::Text, Some(dom)) => {
                if instance.node.text() != node.text() {
                    host.set_text(dom, node.text().unwrap_or_default());
                }
                Vec::new()
            }
            (NodeType::Host(_), Some(dom)) => {
                update_props(host, dom, instance.node.props(), node.props());
                self.reconcile_children(dom, previous_children, node.children(), path)
            }
            (NodeType::Component(component), _) => {
                let previous = previous_children.into_iter().next();
                self.render_child(parent, component, previous, node, path)
                    .into_iter()
                    .collect()
            }
            _ => self.reconcile_children(parent, previous_children, node.children(), path),
        };

        instance.node = node.clone();
        instance.path = Rc::from(path);
        instance
    }

    /// Render a component and reconcile its output as the single child at
    /// index 0 below `path`.
    fn render_child(
        &self,
        parent: NodeId,
        component: &Component,
        previous: Option<Instance>,
        node: &VNode,
        path: &str,
    ) -> Option<Instance> {
        let rendered = self.render_component(component, node.props(), path);
        let child_path = rendered.as_ref().map(|child| {
            create_child_path(
                path,
                child.key(),
                0,
                child.ty(),
                std::slice::from_ref(child),
            )
        });

        if let (Some(kept), Some(child), Some(child_path)) = (&previous, &rendered, &child_path) {
            if component.is_memoizing() && self.can_retain(kept, child, child_path) {
                trace!(path = %child_path, "retain");
                self.retain(kept);
                return previous;
            }
        }

        self.reconcile(
            parent,
            previous,
            rendered.as_ref(),
            child_path.as_deref().unwrap_or(path),
        )
    }

    fn render_component(
        &self,
        component: &Component,
        props: &Props,
        path: &str,
    ) -> Option<VNode> {
        let result = {
            let _ctx = HookContext::enter(self.runtime, path);
            component.render(props)
        };

        match result {
            Ok(node) => node,
            Err(err) => {
                if self.runtime.config.log_component_errors {
                    error!(
                        component = component.name(),
                        path,
                        error = %err,
                        "component failed to render; using placeholder"
                    );
                }
                Some(h("div", Props::new(), ()))
            }
        }
    }

    fn reconcile_children(
        &self,
        parent: NodeId,
        previous: Vec<Instance>,
        next: &[VNode],
        parent_path: &str,
    ) -> Vec<Instance> {
        let mut keyed: IndexMap<Rc<str>, Instance> = IndexMap::new();
        let mut keyless: VecDeque<Instance> = VecDeque::new();
        let mut leftovers = Vec::new();

        for instance in previous {
            match instance.key.clone() {
                Some(key) => {
                    // Duplicate keys: the later instance wins the slot.
                    if let Some(shadowed) = keyed.insert(key, instance) {
                        leftovers.push(shadowed);
                    }
                }
                None => keyless.push_back(instance),
            }
        }

        let mut children = Vec::with_capacity(next.len());
        for (index, child) in next.iter().enumerate() {
            let path = create_child_path(parent_path, child.key(), index, child.ty(), next);
            let previous = match child.key() {
                Some(key) => keyed.shift_remove(key),
                None => keyless.pop_front(),
            };
            if let Some(instance) = self.reconcile(parent, previous, Some(child), &path) {
                children.push(instance);
            }
        }

        for instance in keyed.into_values().chain(keyless).chain(leftovers) {
            trace!(path = %instance.path, "unmount");
            remove_instance(self.host(), parent, &instance);
        }

        self.reorder(parent, &children);
        children
    }

    /// Insert each child's nodes before the first node of the child after it.
    fn reorder(&self, parent: NodeId, children: &[Instance]) {
        let mut anchor = None;
        for child in children.iter().rev() {
            insert_instance(self.host(), parent, child, anchor);
            if let Some(first) = first_dom(child) {
                anchor = Some(first);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::node::{fragment, text};
    use crate::runtime::{RootConfig, TaskQueue};

    struct Fixture {
        doc: Rc<MemoryDocument>,
        container: NodeId,
        runtime: Rc<Runtime>,
    }

    impl Fixture {
        fn new() -> Self {
            let doc = Rc::new(MemoryDocument::new());
            let container = doc.create_element("div");
            let runtime = Runtime::new(
                doc.clone(),
                container,
                Rc::new(TaskQueue::new()),
                RootConfig::production(),
            );
            Self {
                doc,
                container,
                runtime,
            }
        }

        fn pass(&self, previous: Option<Instance>, node: &VNode) -> Option<Instance> {
            self.runtime.hooks.borrow_mut().begin_pass();
            let out =
                Reconciler::new(&self.runtime).reconcile(self.container, previous, Some(node), "");
            self.runtime.hooks.borrow_mut().end_pass();
            out
        }

        fn html(&self) -> String {
            self.doc.inner_html(self.container)
        }
    }

    fn list(keys: &[&str]) -> VNode {
        let items: Vec<VNode> = keys
            .iter()
            .map(|k| h("li", Props::new().key(*k), *k))
            .collect();
        h("ul", Props::new(), items)
    }

    #[test]
    fn mounts_nested_tree() {
        let fx = Fixture::new();
        let tree = h(
            "section",
            Props::new().with("className", "box"),
            crate::children![h("b", Props::new(), "hi"), " there"],
        );
        fx.pass(None, &tree);
        assert_eq!(fx.html(), "<section class=\"box\"><b>hi</b> there</section>");
    }

    #[test]
    fn keyed_reorder_moves_without_recreating() {
        let fx = Fixture::new();
        let first = fx.pass(None, &list(&["1", "2", "3"]));
        let created = fx.doc.elements_created();

        fx.pass(first, &list(&["3", "1", "2"]));
        assert_eq!(fx.doc.elements_created(), created);
        assert_eq!(fx.html(), "<ul><li>3</li><li>1</li><li>2</li></ul>");
    }

    #[test]
    fn keyed_removal_and_insertion() {
        let fx = Fixture::new();
        let first = fx.pass(None, &list(&["a", "b", "c"]));
        let second = fx.pass(first, &list(&["c", "d", "a"]));
        assert_eq!(fx.html(), "<ul><li>c</li><li>d</li><li>a</li></ul>");

        fx.pass(second, &list(&[]));
        assert_eq!(fx.html(), "<ul></ul>");
    }

    #[test]
    fn type_change_remounts() {
        let fx = Fixture::new();
        let first = fx.pass(None, &h("div", Props::new(), "x"));
        let before = fx.doc.elements_created();
        fx.pass(first, &h("p", Props::new(), "x"));
        assert_eq!(fx.doc.elements_created(), before + 1);
        assert_eq!(fx.html(), "<p>x</p>");
    }

    #[test]
    fn key_change_remounts_same_tag() {
        let fx = Fixture::new();
        let first = fx.pass(None, &h("div", Props::new().key("a"), ()));
        let before = fx.doc.elements_created();
        fx.pass(first, &h("div", Props::new().key("b"), ()));
        assert_eq!(fx.doc.elements_created(), before + 1);
    }

    #[test]
    fn keyless_children_match_in_order() {
        let fx = Fixture::new();
        let first = fx.pass(
            None,
            &h("div", Props::new(), crate::children![h("p", Props::new(), "a"), text("b")]),
        );
        let texts_before = fx.doc.texts_created();

        // the text node is reused for "c", the <p> is updated in place
        fx.pass(
            first,
            &h("div", Props::new(), crate::children![h("p", Props::new(), "a2"), text("c")]),
        );
        assert_eq!(fx.html(), "<div><p>a2</p>c</div>");
        assert_eq!(fx.doc.texts_created(), texts_before);
    }

    #[test]
    fn fragments_own_no_node() {
        let fx = Fixture::new();
        let tree = h(
            "div",
            Props::new(),
            crate::children![
                "start",
                h(
                    NodeType::Fragment,
                    Props::new(),
                    crate::children![h("i", Props::new(), ()), h("u", Props::new(), ())]
                ),
                "end"
            ],
        );
        fx.pass(None, &tree);
        assert_eq!(fx.html(), "<div>start<i></i><u></u>end</div>");

        let fx = Fixture::new();
        let root = fragment(crate::children![h("a", Props::new(), ()), h("b", Props::new(), ())]);
        let first = fx.pass(None, &root);
        assert_eq!(fx.html(), "<a></a><b></b>");
        let reversed = fragment(crate::children![h("b", Props::new(), ()), h("a", Props::new(), ())]);
        fx.pass(first, &reversed);
        assert_eq!(fx.html(), "<b></b><a></a>");
    }

    #[test]
    fn component_error_becomes_placeholder() {
        let fx = Fixture::new();
        let broken = Component::new("Broken", |_| Err("boom".into()));
        let fine = Component::new("Fine", |_| Ok(Some(text("ok"))));
        let tree = h(
            "main",
            Props::new(),
            crate::children![h(&broken, Props::new(), ()), h(&fine, Props::new(), ())],
        );
        fx.pass(None, &tree);
        assert_eq!(fx.html(), "<main><div></div>ok</main>");
    }

    fn counting(name: &str, calls: &Rc<std::cell::Cell<usize>>, out: &'static str) -> Component {
        let calls = calls.clone();
        Component::new(name, move |_| {
            calls.set(calls.get() + 1);
            Ok(Some(text(out)))
        })
    }

    #[test]
    fn repeated_descriptor_still_reinvokes_plain_component() {
        let fx = Fixture::new();
        let calls = Rc::new(std::cell::Cell::new(0));
        let child = h(&counting("Counted", &calls, "c"), Props::new(), ());

        let first = fx.pass(None, &h("div", Props::new(), child.clone()));
        fx.pass(first, &h("div", Props::new(), child));
        assert_eq!(calls.get(), 2);
        assert_eq!(fx.html(), "<div>c</div>");
    }

    #[test]
    fn memo_wrapper_skips_wrapped_component() {
        let fx = Fixture::new();
        let calls = Rc::new(std::cell::Cell::new(0));
        let wrapped = crate::hooks::memo(&counting("Counted", &calls, "c"));

        let first = fx.pass(None, &h(&wrapped, Props::new().with("n", 1), ()));
        let second = fx.pass(first, &h(&wrapped, Props::new().with("n", 1), ()));
        assert_eq!(calls.get(), 1);

        fx.pass(second, &h(&wrapped, Props::new().with("n", 2), ()));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn component_returning_nothing_removes_its_child() {
        let fx = Fixture::new();
        let show = Rc::new(std::cell::Cell::new(true));
        let toggled = {
            let show = show.clone();
            Component::new("Toggled", move |_| {
                Ok(show.get().then(|| h("span", Props::new(), "on")))
            })
        };
        let node = h("div", Props::new(), h(&toggled, Props::new(), ()));

        let first = fx.pass(None, &node);
        assert_eq!(fx.html(), "<div><span>on</span></div>");

        show.set(false);
        let second = fx.pass(first, &node);
        assert_eq!(fx.html(), "<div></div>");
        assert!(second
            .as_ref()
            .is_some_and(|div| div.children.len() == 1 && div.children[0].children.is_empty()));

        show.set(true);
        fx.pass(second, &node);
        assert_eq!(fx.html(), "<div><span>on</span></div>");
    }
}
