//! Instance Node Sets
//!
//! A fragment or component instance may stand for zero, one or many
//! document nodes. Every insertion and removal goes through the node set of
//! the instance subtree, found by walking down until an instance with its
//! own document node is reached.

use super::{Host, NodeId};
use crate::reconciler::Instance;

/// Document nodes owned by an instance subtree, in document order.
pub(crate) fn dom_nodes(instance: &Instance) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect(instance, &mut out);
    out
}

fn collect(instance: &Instance, out: &mut Vec<NodeId>) {
    match instance.dom {
        Some(node) => out.push(node),
        None => {
            for child in &instance.children {
                collect(child, out);
            }
        }
    }
}

/// First document node of an instance subtree.
pub(crate) fn first_dom(instance: &Instance) -> Option<NodeId> {
    match instance.dom {
        Some(node) => Some(node),
        None => instance.children.iter().find_map(first_dom),
    }
}

/// Place every node of `instance` under `parent`, before `anchor` when
/// given, otherwise at the end.
pub(crate) fn insert_instance(
    host: &dyn Host,
    parent: NodeId,
    instance: &Instance,
    anchor: Option<NodeId>,
) {
    for node in dom_nodes(instance) {
        match anchor {
            Some(anchor) => host.insert_before(parent, node, anchor),
            None => host.append_child(parent, node),
        }
    }
}

/// Detach every node of `instance` that currently sits under `parent`.
pub(crate) fn remove_instance(host: &dyn Host, parent: NodeId, instance: &Instance) {
    for node in dom_nodes(instance) {
        if host.parent(node) == Some(parent) {
            host.remove_child(parent, node);
        }
    }
}
