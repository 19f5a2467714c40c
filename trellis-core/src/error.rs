//! Error Types
//!
//! Two kinds of failure surface from the runtime:
//!
//! - [`MountError`]: configuration problems detected when a tree is mounted.
//!   These are returned synchronously to the caller of `render`/`mount`.
//!
//! - [`ComponentError`]: a component failed while rendering. These never
//!   reach the caller; the reconciler replaces the failing component's output
//!   with an empty placeholder and keeps going.
//!
//! Hook ordering mistakes (calling hooks conditionally or outside a render)
//! are a caller contract and are not represented here.

use std::error::Error as StdError;

use thiserror::Error;

use crate::dom::NodeId;

/// Errors returned when mounting a tree into a container.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MountError {
    /// The container handle does not refer to a live element.
    #[error("container {0:?} is not a live document element")]
    InvalidContainer(NodeId),

    /// No root descriptor was supplied.
    #[error("a root descriptor is required to render")]
    MissingRoot,

    /// `render` was called while a render pass was in flight on this root.
    #[error("cannot mount while a render pass is in progress")]
    AlreadyRendering,
}

/// An error raised by a component while it was rendering.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Source(#[from] Box<dyn StdError + Send + Sync + 'static>),
}

impl ComponentError {
    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<String> for ComponentError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ComponentError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}
