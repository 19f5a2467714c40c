//! Live Instances
//!
//! An [`Instance`] is what a descriptor turns into once it has been
//! reconciled into the document. Host and text instances own exactly one
//! document node. Component and fragment instances own none; the nodes they
//! stand for are those of their descendants.

use std::rc::Rc;

use crate::dom::NodeId;
use crate::node::VNode;

/// The kind of a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstanceKind {
    Host,
    Text,
    Component,
    Fragment,
}

/// A descriptor materialized in the document.
#[derive(Debug)]
pub(crate) struct Instance {
    pub(crate) kind: InstanceKind,
    pub(crate) dom: Option<NodeId>,
    pub(crate) node: VNode,
    pub(crate) children: Vec<Instance>,
    pub(crate) key: Option<Rc<str>>,
    pub(crate) path: Rc<str>,
}

impl Instance {
    pub(crate) fn new(
        kind: InstanceKind,
        dom: Option<NodeId>,
        node: &VNode,
        children: Vec<Instance>,
        path: &str,
    ) -> Self {
        Self {
            kind,
            dom,
            node: node.clone(),
            children,
            key: node.key().map(Rc::from),
            path: Rc::from(path),
        }
    }

    /// Visit this instance and every descendant, parents first.
    pub(crate) fn walk(&self, f: &mut impl FnMut(&Instance)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{h, text, Props};

    #[test]
    fn key_is_taken_from_descriptor() {
        let node = h("li", Props::new().key("a"), ());
        let inst = Instance::new(InstanceKind::Host, Some(NodeId::from(1)), &node, vec![], ".ka.eli");
        assert_eq!(inst.key.as_deref(), Some("a"));
        assert_eq!(&*inst.path, ".ka.eli");
    }

    #[test]
    fn walk_visits_parents_first() {
        let leaf = Instance::new(InstanceKind::Text, None, &text("x"), vec![], "r.i0.stext");
        let root = Instance::new(
            InstanceKind::Fragment,
            None,
            &h("div", Props::new(), ()),
            vec![leaf],
            "r",
        );

        let mut seen = Vec::new();
        root.walk(&mut |inst| seen.push(inst.path.to_string()));
        assert_eq!(seen, vec!["r", "r.i0.stext"]);
    }
}
