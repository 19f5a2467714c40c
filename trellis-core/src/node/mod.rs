//! Node Model
//!
//! Declarative descriptors and the identity-path scheme that ties a
//! descriptor position to persistent component state.
//!
//! - `value`: dynamic prop/state values and callbacks
//! - `element`: descriptors, component types, child normalization
//! - `path`: identity path derivation

mod element;
mod path;
mod value;

pub use element::{
    create_element, fragment, h, normalize_children, text, Child, Component, ComponentId,
    NodeType, Props, RenderResult, VNode, CHILDREN, KEY, NODE_VALUE,
};
pub use path::create_child_path;
pub use value::{Callback, Value};

pub(crate) use path::is_within;
