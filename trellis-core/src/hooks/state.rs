//! State Hook
//!
//! `use_state` gives a component a value that survives re-renders, plus a
//! [`Setter`] that replaces it and schedules a render.
//!
//! # Updates
//!
//! A setter compares the next value with the stored one. Equal values are
//! dropped on the floor: no write, no render. Otherwise the value is written
//! immediately and a render is requested; any number of updates in the same
//! turn are picked up by one render pass.

use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::context::current_runtime;
use super::store::HookSlot;
use crate::runtime::Runtime;

/// Handle that updates one `use_state` slot.
///
/// Setters hold a weak link to their root. Once the owning component has
/// left the tree, or the root has been dropped, updates are ignored.
pub struct Setter<T> {
    runtime: Weak<Runtime>,
    path: Rc<str>,
    index: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Compute the next value from the current one.
    ///
    /// Nothing is written or scheduled when the result equals the current
    /// value under `PartialEq`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };

        let current = match runtime.hooks.borrow().value::<T>(&self.path, self.index) {
            Some(value) => value.clone(),
            None => return,
        };

        let next = f(&current);
        if next == current {
            return;
        }

        {
            let mut hooks = runtime.hooks.borrow_mut();
            match hooks.value_mut::<T>(&self.path, self.index) {
                Some(slot) => *slot = next,
                None => return,
            }
            hooks.mark_pending(self.path.clone());
        }

        runtime.request_render();
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            path: self.path.clone(),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("path", &self.path)
            .field("index", &self.index)
            .finish()
    }
}

/// Persistent state for the rendering component.
///
/// `PartialEq` on `T` decides whether an update re-renders. For [`Value`]
/// state that is strict identity: lists, maps and callbacks compare by
/// pointer, `NaN` equals `NaN` and `0.0` differs from `-0.0`. Plain `f64`
/// state follows IEEE equality instead, so setting `NaN` always re-renders
/// and `-0.0` over `0.0` is dropped. Hold numbers in a [`Value`] when that
/// distinction matters.
///
/// [`Value`]: crate::Value
pub fn use_state<T>(initial: T) -> (T, Setter<T>)
where
    T: Clone + PartialEq + 'static,
{
    use_state_with(move || initial)
}

/// Like [`use_state`], computing the initial value only on first render.
pub fn use_state_with<T, F>(init: F) -> (T, Setter<T>)
where
    T: Clone + PartialEq + 'static,
    F: FnOnce() -> T,
{
    let runtime = current_runtime("use_state");
    let (path, index) = runtime.next_hook("use_state");

    let (existing, occupied) = {
        let hooks = runtime.hooks.borrow();
        (
            hooks.value::<T>(&path, index).cloned(),
            hooks.slot(&path, index).is_some(),
        )
    };

    let value = match existing {
        Some(value) => value,
        None => {
            if occupied {
                warn!(path = %path, index, "hook order changed; resetting state slot");
            }
            let value = init();
            runtime
                .hooks
                .borrow_mut()
                .set_slot(&path, index, HookSlot::Value(Box::new(value.clone())));
            value
        }
    };

    let setter = Setter {
        runtime: Rc::downgrade(&runtime),
        path,
        index,
        _marker: PhantomData,
    };

    (value, setter)
}
