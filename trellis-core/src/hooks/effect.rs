//! Effect Hook
//!
//! `use_effect` schedules a side effect to run after the render pass that
//! produced it has been committed to the document.
//!
//! # When Effects Run
//!
//! 1. No dependency list (`Deps::Always`): after every render.
//! 2. First render of the call site: always.
//! 3. Otherwise: when the new dependency list differs from the previous one
//!    by element-wise identity ([`shallow_equals_list`]).
//!
//! # Cleanup
//!
//! An effect may return a [`Cleanup`]. It runs right before the same call
//! site's next effect, and when the owning component leaves the tree.

use std::fmt;

use smallvec::SmallVec;
use tracing::warn;

use super::context::current_runtime;
use super::store::{EffectFn, EffectRecord, EffectTask, HookSlot};
use crate::equals::shallow_equals_list;
use crate::node::Value;

/// Teardown returned by an effect.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self(Box::new(f))
    }

    pub(crate) fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Return types accepted from an effect body.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// Dependencies of an effect or memo.
#[derive(Debug, Clone)]
pub enum Deps {
    /// No dependency list: re-run on every render.
    Always,
    /// Re-run when any element changes.
    List(SmallVec<[Value; 4]>),
}

impl Deps {
    /// The empty list: run once, on mount.
    pub fn none() -> Self {
        Deps::List(SmallVec::new())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Deps::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Deps::Always => None,
            Deps::List(items) => Some(items.as_slice()),
        }
    }
}

impl From<Vec<Value>> for Deps {
    fn from(items: Vec<Value>) -> Self {
        Deps::List(SmallVec::from_vec(items))
    }
}

/// Build a dependency list: `deps![count, name]`, or `deps![]` for none.
#[macro_export]
macro_rules! deps {
    () => {
        $crate::Deps::none()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::Deps::list([$($crate::Value::from($dep)),+])
    };
}

fn should_run(prev: Option<&Deps>, next: &Deps) -> bool {
    match (prev, next) {
        (_, Deps::Always) => true,
        (None, _) | (Some(Deps::Always), _) => true,
        (Some(Deps::List(prev)), Deps::List(next)) => !shallow_equals_list(prev, next),
    }
}

/// Run `effect` after commit when `deps` changed.
///
/// # Example
///
/// ```rust,ignore
/// use_effect(move || {
///     let id = timer.start();
///     Cleanup::new(move || timer.stop(id))
/// }, deps![interval]);
/// ```
pub fn use_effect<F, R>(effect: F, deps: Deps)
where
    F: FnOnce() -> R + 'static,
    R: IntoCleanup,
{
    let runtime = current_runtime("use_effect");
    let (path, index) = runtime.next_hook("use_effect");
    let pending: EffectFn = Box::new(move || effect().into_cleanup());

    let mut hooks = runtime.hooks.borrow_mut();
    let run = match hooks.effect_mut(&path, index) {
        Some(record) => {
            let run = should_run(Some(&record.deps), &deps);
            record.deps = deps;
            record.pending = Some(pending);
            run
        }
        None => {
            if hooks.slot(&path, index).is_some() {
                warn!(path = %path, index, "hook order changed; replacing slot with an effect");
            }
            let run = should_run(None, &deps);
            hooks.set_slot(
                &path,
                index,
                HookSlot::Effect(EffectRecord {
                    deps,
                    cleanup: None,
                    pending: Some(pending),
                }),
            );
            run
        }
    };

    if run {
        hooks.enqueue_effect(EffectTask { path, index });
    }
}
