//! Document Adapter
//!
//! The runtime never touches a concrete document. It talks to a [`Host`],
//! which offers the primitive node operations a live document provides
//! (create, insert, remove, attributes, native properties, listeners).
//!
//! On top of those primitives this module implements:
//!
//! - `props`: applying descriptor props to a node on mount, and diffing
//!   previous against next props on update
//! - `nodes`: finding the document nodes owned by an instance subtree, and
//!   inserting/removing them as a unit
//! - `memory`: [`MemoryDocument`], an in-process host used for tests,
//!   benchmarks and headless embedding
//!
//! # Node Handles
//!
//! Document nodes are referenced by [`NodeId`]. Handles are plain integers;
//! the host owns the nodes and decides what a handle refers to.

mod memory;
pub(crate) mod nodes;
pub(crate) mod props;

pub use memory::MemoryDocument;

use crate::node::Callback;

/// Handle to a live document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Value of a native (non-attribute) node property.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl NativeValue {
    /// The zero value of the same kind: `false`, `0` or the empty string.
    pub fn zero_like(&self) -> NativeValue {
        match self {
            NativeValue::Bool(_) => NativeValue::Bool(false),
            NativeValue::Number(_) => NativeValue::Number(0.0),
            NativeValue::Text(_) => NativeValue::Text(String::new()),
        }
    }
}

/// Primitive operations of a live document.
///
/// Methods take `&self`; implementations use interior mutability, the same
/// way a script-facing document API does. Operations on handles the host
/// does not know are ignored.
pub trait Host {
    /// Create a detached element.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> NodeId;

    /// Whether the handle refers to a live element (not a text node).
    fn is_element(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Append `child` to `parent`, detaching it from any previous parent.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Insert `child` before `anchor` under `parent`, detaching it from any
    /// previous parent. Appends if `anchor` is not a child of `parent`.
    fn insert_before(&self, parent: NodeId, child: NodeId, anchor: NodeId);

    /// Remove `child` from `parent`. Ignored if `parent` is not its parent.
    /// The runtime never reuses a removed node, so hosts may free it along
    /// with its subtree.
    fn remove_child(&self, parent: NodeId, child: NodeId);

    /// Remove every child of `parent`, with the same freeing rule as
    /// [`Host::remove_child`].
    fn clear_children(&self, parent: NodeId);

    /// Replace the content of a text node.
    fn set_text(&self, node: NodeId, text: &str);

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Current value of a native property, or `None` if the node has no
    /// property of that name.
    fn property(&self, node: NodeId, name: &str) -> Option<NativeValue>;

    fn set_property(&self, node: NodeId, name: &str, value: NativeValue);

    fn set_class_name(&self, node: NodeId, class_name: &str);

    fn set_style(&self, node: NodeId, name: &str, value: &str);

    fn remove_style(&self, node: NodeId, name: &str);

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Callback);

    /// Remove a listener previously added with the same callback.
    fn remove_event_listener(&self, node: NodeId, event: &str, listener: &Callback);
}
