//! Hooks
//!
//! Hooks give function components persistent state and side effects. They
//! are ordinary function calls that must run while their component is being
//! rendered, in the same order on every render.
//!
//! # Concepts
//!
//! ## Slots
//!
//! Each component path owns an array of slots. The n-th hook call of a render
//! reads and writes the n-th slot. Calling hooks conditionally shifts every
//! slot after it; this is a caller contract and is not detected beyond a
//! warning when a slot changes type.
//!
//! ## State
//!
//! [`use_state`] returns the current value and a [`Setter`]. Setting a new
//! value requests a render; all requests in one turn share one render pass.
//!
//! ## Effects
//!
//! [`use_effect`] queues work for after the document has been updated. The
//! queue is flushed in a later turn, in the order effects were registered.
//!
//! ## Memoization
//!
//! [`use_ref`], [`use_memo`], [`use_callback`] and friends cache values in
//! slots. [`memo`] and [`deep_memo`] skip whole subtrees when props are
//! unchanged.

mod context;
mod effect;
mod hoc;
mod memo;
mod state;
pub(crate) mod store;

pub(crate) use context::HookContext;
pub use effect::{use_effect, Cleanup, Deps, IntoCleanup};
pub use hoc::{deep_memo, memo, memo_with};
pub use memo::{
    use_auto_callback, use_callback, use_deep_memo, use_memo, use_memo_with, use_ref, Ref,
};
pub use state::{use_state, use_state_with, Setter};
