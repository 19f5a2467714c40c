//! Render Context
//!
//! Hooks are plain function calls, so they need an ambient way to find the
//! runtime and the component path they belong to.
//!
//! # Implementation
//!
//! A thread-local stack holds the runtime of every component currently
//! rendering. The reconciler enters a [`HookContext`] around each component
//! invocation: that pushes the runtime onto the stack and the component's
//! path onto the runtime's hook store. Dropping the guard pops both, even if
//! the component panics.
//!
//! Nested entries are normal: a component's render may drive a nested root
//! (each root has its own runtime), and the innermost entry always wins.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::Runtime;

thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Rc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that marks a component path as rendering.
pub(crate) struct HookContext {
    runtime: Rc<Runtime>,
    path: Rc<str>,
}

impl HookContext {
    pub(crate) fn enter(runtime: &Rc<Runtime>, path: &str) -> Self {
        let path: Rc<str> = Rc::from(path);
        runtime.hooks.borrow_mut().enter_component(path.clone());
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime.clone()));

        Self {
            runtime: runtime.clone(),
            path,
        }
    }
}

impl Drop for HookContext {
    fn drop(&mut self) {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        let popped = self.runtime.hooks.borrow_mut().exit_component();
        if let Some(path) = popped {
            debug_assert_eq!(
                path, self.path,
                "HookContext mismatch: expected {:?}, got {:?}",
                self.path, path
            );
        }
    }
}

/// The runtime of the component currently rendering.
///
/// # Panics
///
/// When called outside a component render. Hooks only have meaning while
/// their component is being invoked by the reconciler.
pub(crate) fn current_runtime(hook: &str) -> Rc<Runtime> {
    let runtime = RUNTIME_STACK.with(|stack| stack.borrow().last().cloned());
    match runtime {
        Some(runtime) => runtime,
        None => panic!("{} called outside of a component render", hook),
    }
}
