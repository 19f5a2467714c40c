//! Trellis Core
//!
//! This crate provides the rendering runtime for the Trellis component UI
//! framework. It implements:
//!
//! - Declarative descriptors and child normalization
//! - Identity paths that bind component state to tree positions
//! - Reconciliation of descriptor trees against a live document
//! - Hooks: state, effects, refs and memoization
//! - Batched, deferred render and effect scheduling
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `node`: descriptors, values and identity paths
//! - `dom`: the [`Host`] document abstraction, prop application and an
//!   in-memory document
//! - `reconciler`: the diffing algorithm
//! - `hooks`: the hook API and its per-root store
//! - `runtime`: roots, render passes and deferred execution
//! - `equals`: shallow and deep comparators
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use trellis_core::{create_root, h, use_state, Component, Host, MemoryDocument, Props, TaskQueue};
//!
//! let counter = Component::new("Counter", |_props| {
//!     let (count, set_count) = use_state(0);
//!     let on_click = trellis_core::Callback::action(move || set_count.set(count + 1));
//!     Ok(Some(h("button", Props::new().with("onClick", on_click), count)))
//! });
//!
//! let doc = Rc::new(MemoryDocument::new());
//! let container = doc.create_element("div");
//! let queue = TaskQueue::new();
//! let root = create_root(doc.clone(), container, queue.clone())?;
//! root.render(h(&counter, Props::new(), ()))?;
//!
//! // clicks request a render; the queue runs it
//! queue.run_until_idle();
//! ```

pub mod dom;
pub mod equals;
pub mod error;
pub mod hooks;
pub mod node;
mod reconciler;
pub mod runtime;

pub use dom::{Host, MemoryDocument, NativeValue, NodeId};
pub use equals::{deep_equals, shallow_equals};
pub use error::{ComponentError, MountError};
pub use hooks::{
    deep_memo, memo, memo_with, use_auto_callback, use_callback, use_deep_memo, use_effect,
    use_memo, use_memo_with, use_ref, use_state, use_state_with, Cleanup, Deps, Ref, Setter,
};
pub use node::{
    create_element, fragment, h, text, Callback, Child, Component, NodeType, Props, RenderResult,
    VNode, Value,
};
pub use runtime::{
    create_root, create_root_with, mount, Deferrer, Root, RootConfig, TaskQueue, TokioDeferrer,
};
