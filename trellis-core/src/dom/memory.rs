//! In-Memory Document
//!
//! [`MemoryDocument`] is a small document implementation that keeps every
//! node in an arena indexed by [`NodeId`]. It implements [`Host`], so the
//! runtime can render into it without a browser, and adds inspection helpers
//! (`to_html`, `text_content`, `dispatch`, creation counters) for tests and
//! benchmarks.
//!
//! # Native Properties
//!
//! Elements expose a fixed set of native properties, chosen by tag:
//!
//! - every element: `hidden`, `tabIndex`, `id`, `title`
//! - form controls: `disabled`, `value`
//! - `input`: `checked`, `readOnly`, `multiple`, `autofocus`
//! - `select`: `multiple`; `option`: `selected`; `textarea`: `readOnly`
//!
//! `id` and `title` reflect into attributes, as they do in a browser.
//!
//! # Removal
//!
//! `remove_child` and `clear_children` free the detached nodes and their
//! subtrees, listeners included. Handles to them become dangling and every
//! operation on them is a no-op. Moving a node with `append_child` or
//! `insert_before` never frees it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use indexmap::IndexMap;

use super::{Host, NativeValue, NodeId};
use crate::node::{Callback, Value};

const FORM_CONTROLS: &[&str] = &["input", "textarea", "select", "button", "option", "fieldset"];
const REFLECTED: &[&str] = &["id", "title"];

#[derive(Debug)]
enum NodeKind {
    Element { tag: String },
    Text,
}

#[derive(Debug)]
struct MemoryNode {
    kind: NodeKind,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, NativeValue>,
    class_name: String,
    style: IndexMap<String, String>,
    listeners: Vec<(String, Callback)>,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            class_name: String::new(),
            style: IndexMap::new(),
            listeners: Vec::new(),
        }
    }

    fn element(tag: &str) -> Self {
        let mut node = Self::new(NodeKind::Element {
            tag: tag.to_owned(),
        });
        node.properties = default_properties(tag);
        node
    }
}

fn default_properties(tag: &str) -> IndexMap<String, NativeValue> {
    let mut props = IndexMap::new();
    props.insert("hidden".to_owned(), NativeValue::Bool(false));
    props.insert("tabIndex".to_owned(), NativeValue::Number(0.0));
    props.insert("id".to_owned(), NativeValue::Text(String::new()));
    props.insert("title".to_owned(), NativeValue::Text(String::new()));

    if FORM_CONTROLS.contains(&tag) {
        props.insert("disabled".to_owned(), NativeValue::Bool(false));
        props.insert("value".to_owned(), NativeValue::Text(String::new()));
    }

    let extra: &[&str] = match tag {
        "input" => &["checked", "readOnly", "multiple", "autofocus"],
        "select" => &["multiple"],
        "option" => &["selected"],
        "textarea" => &["readOnly"],
        _ => &[],
    };
    for name in extra {
        props.insert((*name).to_owned(), NativeValue::Bool(false));
    }

    props
}

// Coerce a property write to the property's existing kind.
fn coerce(current: &NativeValue, value: NativeValue) -> NativeValue {
    match (current, value) {
        (NativeValue::Bool(_), NativeValue::Bool(b)) => NativeValue::Bool(b),
        (NativeValue::Bool(_), NativeValue::Number(n)) => NativeValue::Bool(n != 0.0),
        (NativeValue::Bool(_), NativeValue::Text(s)) => NativeValue::Bool(!s.is_empty()),
        (NativeValue::Number(_), NativeValue::Number(n)) => NativeValue::Number(n),
        (NativeValue::Number(_), NativeValue::Bool(b)) => NativeValue::Number(f64::from(u8::from(b))),
        (NativeValue::Number(_), NativeValue::Text(s)) => {
            NativeValue::Number(s.trim().parse().unwrap_or(0.0))
        }
        (NativeValue::Text(_), NativeValue::Text(s)) => NativeValue::Text(s),
        (NativeValue::Text(_), NativeValue::Bool(b)) => NativeValue::Text(b.to_string()),
        (NativeValue::Text(_), NativeValue::Number(n)) => {
            NativeValue::Text(Value::Number(n).to_attribute_string())
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// An in-process document.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: RefCell<HashMap<NodeId, MemoryNode>>,
    next_id: Cell<u64>,
    elements_created: Cell<usize>,
    texts_created: Cell<usize>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&self, node: MemoryNode) -> NodeId {
        let id = NodeId::from(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.nodes.borrow_mut().insert(id, node);
        id
    }

    fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&MemoryNode) -> R) -> Option<R> {
        self.nodes.borrow().get(&id).map(f)
    }

    fn with_node_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut MemoryNode) -> R) -> Option<R> {
        self.nodes.borrow_mut().get_mut(&id).map(f)
    }

    fn detach(nodes: &mut HashMap<NodeId, MemoryNode>, child: NodeId) {
        let parent = nodes.get(&child).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = nodes.get_mut(&parent) {
                p.children.retain(|c| *c != child);
            }
        }
        if let Some(c) = nodes.get_mut(&child) {
            c.parent = None;
        }
    }

    /// Take `root` and everything below it out of the arena.
    fn take_subtree(nodes: &mut HashMap<NodeId, MemoryNode>, root: NodeId) -> Vec<MemoryNode> {
        let mut freed = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = nodes.remove(&id) {
                stack.extend(node.children.iter().copied());
                freed.push(node);
            }
        }
        freed
    }

    /// Number of nodes currently held, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Number of elements created so far.
    pub fn elements_created(&self) -> usize {
        self.elements_created.get()
    }

    /// Number of text nodes created so far.
    pub fn texts_created(&self) -> usize {
        self.texts_created.get()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.with_node(node, |n| match &n.kind {
            NodeKind::Element { tag } => Some(tag.clone()),
            NodeKind::Text => None,
        })
        .flatten()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.with_node(node, |n| n.children.clone()).unwrap_or_default()
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |n| n.attributes.get(name).cloned())
            .flatten()
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.with_node(node, |n| n.class_name.clone())
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |n| n.style.get(name).cloned()).flatten()
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.with_node(node, |n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    /// Serialized markup of a node's children.
    pub fn inner_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if let Some(n) = nodes.get(&node) {
            for child in &n.children {
                write_html(&nodes, *child, &mut out);
            }
        }
        out
    }

    /// Serialized markup of a node.
    pub fn to_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        write_html(&nodes, node, &mut out);
        out
    }

    /// First descendant of `root` (depth first, including `root`) whose
    /// attribute `name` equals `value`.
    pub fn find_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = nodes.get(&id)?;
            if node.attributes.get(name).is_some_and(|v| v == value) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Invoke every listener registered for `event` on `node`.
    ///
    /// Returns the number of listeners called. Listeners run without any
    /// document borrow held, so they may mutate the document.
    pub fn dispatch(&self, node: NodeId, event: &str, payload: &Value) -> usize {
        let listeners: Vec<Callback> = self
            .with_node(node, |n| {
                n.listeners
                    .iter()
                    .filter(|(e, _)| e == event)
                    .map(|(_, cb)| cb.clone())
                    .collect()
            })
            .unwrap_or_default();

        for listener in &listeners {
            listener.call(payload);
        }
        listeners.len()
    }
}

fn collect_text(nodes: &HashMap<NodeId, MemoryNode>, id: NodeId, out: &mut String) {
    let Some(node) = nodes.get(&id) else {
        return;
    };
    match node.kind {
        NodeKind::Text => out.push_str(&node.text),
        NodeKind::Element { .. } => {
            for child in &node.children {
                collect_text(nodes, *child, out);
            }
        }
    }
}

fn write_html(nodes: &HashMap<NodeId, MemoryNode>, id: NodeId, out: &mut String) {
    let Some(node) = nodes.get(&id) else {
        return;
    };
    match &node.kind {
        NodeKind::Text => out.push_str(&escape(&node.text)),
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            if !node.class_name.is_empty() {
                out.push_str(&format!(" class=\"{}\"", escape(&node.class_name)));
            }
            for (name, value) in &node.attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
            }
            if !node.style.is_empty() {
                let style: Vec<String> = node
                    .style
                    .iter()
                    .map(|(k, v)| format!("{}: {};", k, v))
                    .collect();
                out.push_str(&format!(" style=\"{}\"", escape(&style.join(" "))));
            }
            out.push('>');
            for child in &node.children {
                write_html(nodes, *child, out);
            }
            out.push_str(&format!("</{}>", tag));
        }
    }
}

impl Host for MemoryDocument {
    fn create_element(&self, tag: &str) -> NodeId {
        self.elements_created.set(self.elements_created.get() + 1);
        self.alloc(MemoryNode::element(tag))
    }

    fn create_text(&self, text: &str) -> NodeId {
        self.texts_created.set(self.texts_created.get() + 1);
        let mut node = MemoryNode::new(NodeKind::Text);
        node.text = text.to_owned();
        self.alloc(node)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.with_node(node, |n| matches!(n.kind, NodeKind::Element { .. }))
            .unwrap_or(false)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.with_node(node, |n| n.parent).flatten()
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(&parent) || !nodes.contains_key(&child) {
            return;
        }
        Self::detach(&mut nodes, child);
        if let Some(p) = nodes.get_mut(&parent) {
            p.children.push(child);
        }
        if let Some(c) = nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn insert_before(&self, parent: NodeId, child: NodeId, anchor: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(&parent) || !nodes.contains_key(&child) || child == anchor {
            return;
        }
        Self::detach(&mut nodes, child);
        if let Some(p) = nodes.get_mut(&parent) {
            match p.children.iter().position(|c| *c == anchor) {
                Some(index) => p.children.insert(index, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) {
        let freed = {
            let mut nodes = self.nodes.borrow_mut();
            if nodes.get(&child).and_then(|c| c.parent) != Some(parent) {
                return;
            }
            Self::detach(&mut nodes, child);
            Self::take_subtree(&mut nodes, child)
        };
        // Listener captures may call back into the document when dropped.
        drop(freed);
    }

    fn clear_children(&self, parent: NodeId) {
        let freed: Vec<MemoryNode> = {
            let mut nodes = self.nodes.borrow_mut();
            let children = nodes
                .get_mut(&parent)
                .map(|p| std::mem::take(&mut p.children))
                .unwrap_or_default();
            children
                .into_iter()
                .flat_map(|child| Self::take_subtree(&mut nodes, child))
                .collect()
        };
        drop(freed);
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.with_node_mut(node, |n| n.text = text.to_owned());
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_node_mut(node, |n| {
            n.attributes.insert(name.to_owned(), value.to_owned());
        });
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |n| {
            n.attributes.shift_remove(name);
        });
    }

    fn property(&self, node: NodeId, name: &str) -> Option<NativeValue> {
        self.with_node(node, |n| n.properties.get(name).cloned())
            .flatten()
    }

    fn set_property(&self, node: NodeId, name: &str, value: NativeValue) {
        self.with_node_mut(node, |n| {
            let Some(current) = n.properties.get(name) else {
                return;
            };
            let value = coerce(current, value);
            if REFLECTED.contains(&name) {
                if let NativeValue::Text(text) = &value {
                    n.attributes.insert(name.to_owned(), text.clone());
                }
            }
            n.properties.insert(name.to_owned(), value);
        });
    }

    fn set_class_name(&self, node: NodeId, class_name: &str) {
        self.with_node_mut(node, |n| n.class_name = class_name.to_owned());
    }

    fn set_style(&self, node: NodeId, name: &str, value: &str) {
        self.with_node_mut(node, |n| {
            if value.is_empty() {
                n.style.shift_remove(name);
            } else {
                n.style.insert(name.to_owned(), value.to_owned());
            }
        });
    }

    fn remove_style(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |n| {
            n.style.shift_remove(name);
        });
    }

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Callback) {
        self.with_node_mut(node, |n| {
            let exists = n
                .listeners
                .iter()
                .any(|(e, cb)| e == event && cb.ptr_eq(&listener));
            if !exists {
                n.listeners.push((event.to_owned(), listener));
            }
        });
    }

    fn remove_event_listener(&self, node: NodeId, event: &str, listener: &Callback) {
        self.with_node_mut(node, |n| {
            n.listeners
                .retain(|(e, cb)| !(e == event && cb.ptr_eq(listener)));
        });
    }
}
