//! Ref and Memo Hooks
//!
//! - [`use_ref`]: a mutable cell allocated once per call site. Writing to it
//!   never triggers a render.
//! - [`use_memo`] / [`use_deep_memo`] / [`use_memo_with`]: cache a computed
//!   value until the dependency list changes under a comparator.
//! - [`use_callback`]: a memoized [`Callback`].
//! - [`use_auto_callback`]: a callback with a stable identity that always
//!   calls the closure passed on the latest render.
//!
//! All of them are built on `use_ref`; the cached dependencies and value live
//! inside the cell.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::context::current_runtime;
use super::effect::Deps;
use super::store::HookSlot;
use crate::equals::{deep_equals_list, shallow_equals_list};
use crate::node::{Callback, Value};

/// A shared mutable cell returned by [`use_ref`].
pub struct Ref<T>(Rc<RefCell<T>>);

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Replace the value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.0.borrow()).finish()
    }
}

/// A cell that lives as long as the rendering component.
///
/// `initial` is only used on the first render; later renders return the
/// same cell.
pub fn use_ref<T: 'static>(initial: T) -> Ref<T> {
    let runtime = current_runtime("use_ref");
    let (path, index) = runtime.next_hook("use_ref");

    let (existing, occupied) = {
        let hooks = runtime.hooks.borrow();
        (
            hooks.value::<Ref<T>>(&path, index).cloned(),
            hooks.slot(&path, index).is_some(),
        )
    };

    match existing {
        Some(cell) => cell,
        None => {
            if occupied {
                warn!(path = %path, index, "hook order changed; resetting ref slot");
            }
            let cell = Ref::new(initial);
            runtime
                .hooks
                .borrow_mut()
                .set_slot(&path, index, HookSlot::Value(Box::new(cell.clone())));
            cell
        }
    }
}

/// Memoize `factory()` under a custom dependency comparator.
///
/// The value is recomputed on the first call, when either dependency list
/// is [`Deps::Always`], or when `equals(previous, next)` is false.
pub fn use_memo_with<T, F, E>(factory: F, deps: Deps, equals: E) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
    E: Fn(&[Value], &[Value]) -> bool,
{
    let cache: Ref<Option<(Deps, T)>> = use_ref(None);

    let hit = cache.with(|cached| match (cached, &deps) {
        (Some((Deps::List(prev), value)), Deps::List(next))
            if equals(prev.as_slice(), next.as_slice()) =>
        {
            Some(value.clone())
        }
        _ => None,
    });
    if let Some(value) = hit {
        return value;
    }

    let value = factory();
    cache.set(Some((deps, value.clone())));
    value
}

/// Memoize `factory()` until a dependency changes identity.
pub fn use_memo<T, F>(factory: F, deps: Deps) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    use_memo_with(factory, deps, shallow_equals_list)
}

/// Memoize `factory()` until a dependency changes structurally.
pub fn use_deep_memo<T, F>(factory: F, deps: Deps) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    use_memo_with(factory, deps, deep_equals_list)
}

/// A [`Callback`] whose identity only changes with `deps`.
pub fn use_callback<F, R>(f: F, deps: Deps) -> Callback
where
    F: Fn(&Value) -> R + 'static,
    R: Into<Value>,
{
    use_memo(move || Callback::new(f), deps)
}

/// A [`Callback`] with a stable identity that calls the latest `f`.
///
/// Safe to list as a dependency or pass to a memoized child: its identity
/// never changes, yet it never sees stale captures.
pub fn use_auto_callback<F, R>(f: F) -> Callback
where
    F: Fn(&Value) -> R + 'static,
    R: Into<Value>,
{
    let latest = Callback::new(f);
    let cell = use_ref(latest.clone());
    cell.set(latest);

    use_callback(move |arg: &Value| cell.get().call(arg), Deps::none())
}
