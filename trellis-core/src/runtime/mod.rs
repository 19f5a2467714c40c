//! Render Runtime
//!
//! The runtime is the per-root coordinator: it owns the hook store, the live
//! instance tree and the deferred jobs, and it drives render passes.
//!
//! # How a Render Pass Works
//!
//! 1. The visited set is cleared and the paths updated since the previous
//!    pass are snapshotted.
//!
//! 2. The root descriptor is reconciled against the previous instance tree.
//!    Every component rendered (or retained unchanged) marks its path as
//!    visited.
//!
//! 3. Garbage collection: every tracked path that was not visited belongs
//!    to a component that left the tree. Its effect cleanups run, its slots
//!    are deleted, and queued effects that point at it are dropped.
//!
//! 4. An effect flush is requested. Effects run in a later turn, after the
//!    whole pass has been committed, in the order they were queued.
//!
//! # Scheduling
//!
//! State updates never render synchronously. They request a render, which is
//! coalesced: however many updates happen in a turn, one pass runs in the
//! next. An update made from an effect lands in a new pass after the current
//! flush, never inside it.
//!
//! # Panics
//!
//! Errors returned by components are contained (see [`ComponentError`]),
//! panics are not. A panic unwinds out of the pass after the previous
//! instance tree has been taken, so the root loses track of whatever it had
//! mounted. The document keeps those nodes and the next pass would mount a
//! second copy next to them. Recover with [`Root::render`], which empties
//! the container before mounting.
//!
//! [`ComponentError`]: crate::ComponentError

mod config;
mod scheduler;

pub use config::RootConfig;
pub use scheduler::{Deferrer, Task, TaskQueue, TokioDeferrer};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, debug_span, warn};

use crate::dom::nodes::remove_instance;
use crate::dom::{Host, NodeId};
use crate::error::MountError;
use crate::hooks::store::HookStore;
use crate::node::VNode;
use crate::reconciler::{Instance, Reconciler};
use scheduler::CoalescedJob;

pub(crate) struct RootState {
    pub(crate) container: NodeId,
    pub(crate) node: Option<VNode>,
    pub(crate) instance: Option<Instance>,
}

/// Resets the in-flight flag even if a component panics.
struct RenderingGuard<'a>(&'a Cell<bool>);

impl<'a> RenderingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RenderingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Per-root render state.
pub(crate) struct Runtime {
    pub(crate) host: Rc<dyn Host>,
    pub(crate) config: RootConfig,
    pub(crate) hooks: RefCell<HookStore>,
    pub(crate) root: RefCell<RootState>,
    deferrer: Rc<dyn Deferrer>,
    render_job: CoalescedJob,
    effects_job: CoalescedJob,
    rendering: Cell<bool>,
}

impl Runtime {
    pub(crate) fn new(
        host: Rc<dyn Host>,
        container: NodeId,
        deferrer: Rc<dyn Deferrer>,
        config: RootConfig,
    ) -> Rc<Self> {
        Rc::new(Self {
            host,
            config,
            hooks: RefCell::new(HookStore::new()),
            root: RefCell::new(RootState {
                container,
                node: None,
                instance: None,
            }),
            deferrer,
            render_job: CoalescedJob::default(),
            effects_job: CoalescedJob::default(),
            rendering: Cell::new(false),
        })
    }

    /// Claim the next hook slot of the rendering component.
    ///
    /// # Panics
    ///
    /// If no component of this root is rendering.
    pub(crate) fn next_hook(&self, hook: &str) -> (Rc<str>, usize) {
        match self.hooks.borrow_mut().next_index() {
            Some(slot) => slot,
            None => panic!("{} called outside of a component render", hook),
        }
    }

    /// Ask for a render pass in a later turn.
    pub(crate) fn request_render(self: &Rc<Self>) {
        if !self.render_job.try_schedule() {
            return;
        }

        let runtime = Rc::downgrade(self);
        self.deferrer.defer(Box::new(move || {
            let Some(runtime) = runtime.upgrade() else {
                return;
            };
            runtime.render_job.finish();
            if runtime.rendering.get() {
                warn!("render requested while a render pass is in flight; ignored");
                return;
            }
            runtime.render_pass();
        }));
    }

    /// Ask for an effect flush in a later turn.
    pub(crate) fn request_effect_flush(self: &Rc<Self>) {
        if !self.effects_job.try_schedule() {
            return;
        }

        let runtime = Rc::downgrade(self);
        self.deferrer.defer(Box::new(move || {
            let Some(runtime) = runtime.upgrade() else {
                return;
            };
            runtime.effects_job.finish();
            runtime.flush_effects();
        }));
    }

    /// Reconcile the mounted root descriptor. A no-op when nothing is
    /// mounted.
    pub(crate) fn render_pass(self: &Rc<Self>) {
        let (container, node, previous) = {
            let mut root = self.root.borrow_mut();
            let Some(node) = root.node.clone() else {
                return;
            };
            (root.container, node, root.instance.take())
        };

        let _span = debug_span!("render_pass").entered();
        {
            let _rendering = RenderingGuard::enter(&self.rendering);
            self.hooks.borrow_mut().begin_pass();

            let instance =
                Reconciler::new(self).reconcile(container, previous, Some(&node), "");
            self.root.borrow_mut().instance = instance;

            self.hooks.borrow_mut().end_pass();
            self.collect_garbage();
        }

        self.request_effect_flush();
    }

    /// Run cleanups and delete state of every path the last pass did not
    /// visit.
    fn collect_garbage(&self) {
        let unvisited = self.hooks.borrow().unvisited_paths();

        for path in unvisited {
            // Cleanups may touch the runtime; run them without a borrow.
            let cleanups = self.hooks.borrow_mut().take_cleanups(&path);
            for cleanup in cleanups {
                cleanup.run();
            }
            self.hooks.borrow_mut().remove_path(&path);
            debug!(path = %path, "collected unmounted component state");
        }

        self.hooks.borrow_mut().drop_orphan_effects();
    }

    /// Run queued effects in FIFO order.
    fn flush_effects(&self) {
        let _span = debug_span!("flush_effects").entered();
        let mut ran = 0usize;

        loop {
            let Some(task) = self.hooks.borrow_mut().pop_effect() else {
                break;
            };

            let (effect, cleanup) = {
                let mut hooks = self.hooks.borrow_mut();
                let Some(record) = hooks.effect_mut(&task.path, task.index) else {
                    continue;
                };
                let Some(effect) = record.pending.take() else {
                    continue;
                };
                (effect, record.cleanup.take())
            };

            if let Some(cleanup) = cleanup {
                cleanup.run();
            }
            let next = effect();
            ran += 1;

            if let Some(next) = next {
                let orphan = {
                    let mut hooks = self.hooks.borrow_mut();
                    match hooks.effect_mut(&task.path, task.index) {
                        Some(record) => {
                            record.cleanup = Some(next);
                            None
                        }
                        None => Some(next),
                    }
                };
                // The component left the tree while its effect ran.
                if let Some(orphan) = orphan {
                    orphan.run();
                }
            }
        }

        debug!(ran, "flushed effects");
    }

    /// Remove the mounted tree and forget all hook state, running every
    /// cleanup.
    fn teardown(&self) {
        let (container, instance) = {
            let mut root = self.root.borrow_mut();
            root.node = None;
            (root.container, root.instance.take())
        };

        if let Some(instance) = instance {
            remove_instance(&*self.host, container, &instance);
        }

        // Nothing is visited: every tracked path is collected.
        self.hooks.borrow_mut().begin_pass();
        self.hooks.borrow_mut().end_pass();
        self.collect_garbage();
        self.hooks.borrow_mut().clear();
    }
}

/// A render root bound to one container element.
///
/// Dropping the root leaves the rendered document in place; call
/// [`Root::unmount`] to tear it down with cleanups.
pub struct Root {
    runtime: Rc<Runtime>,
}

impl Root {
    /// Render `node` into the container, replacing anything rendered before.
    ///
    /// The previous tree is unmounted first (its cleanups run), the
    /// container is emptied, and the new tree is rendered synchronously.
    /// Effects of the new tree run in a later turn.
    ///
    /// This is also how a root recovers after a component panicked.
    pub fn render(&self, node: impl Into<Option<VNode>>) -> Result<(), MountError> {
        let runtime = &self.runtime;
        let container = runtime.root.borrow().container;

        if !runtime.host.is_element(container) {
            return Err(MountError::InvalidContainer(container));
        }
        let node = node.into().ok_or(MountError::MissingRoot)?;
        if runtime.rendering.get() {
            return Err(MountError::AlreadyRendering);
        }

        runtime.teardown();
        runtime.host.clear_children(container);
        runtime.root.borrow_mut().node = Some(node);
        runtime.render_pass();
        Ok(())
    }

    /// Remove the rendered tree and run every cleanup.
    pub fn unmount(&self) -> Result<(), MountError> {
        if self.runtime.rendering.get() {
            return Err(MountError::AlreadyRendering);
        }
        self.runtime.teardown();
        Ok(())
    }

    pub fn container(&self) -> NodeId {
        self.runtime.root.borrow().container
    }

    pub fn host(&self) -> Rc<dyn Host> {
        self.runtime.host.clone()
    }

    pub fn config(&self) -> &RootConfig {
        &self.runtime.config
    }

    /// Whether a tree is mounted.
    pub fn is_mounted(&self) -> bool {
        self.runtime.root.borrow().node.is_some()
    }

    /// Number of component paths holding hook state.
    pub fn tracked_paths(&self) -> usize {
        self.runtime.hooks.borrow().len()
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("container", &self.container())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Create a root with the default configuration.
pub fn create_root<D>(
    host: Rc<dyn Host>,
    container: NodeId,
    deferrer: D,
) -> Result<Root, MountError>
where
    D: Deferrer + 'static,
{
    create_root_with(host, container, deferrer, RootConfig::default())
}

/// Create a root bound to `container`.
///
/// Fails if `container` is not a live element of `host`.
pub fn create_root_with<D>(
    host: Rc<dyn Host>,
    container: NodeId,
    deferrer: D,
    config: RootConfig,
) -> Result<Root, MountError>
where
    D: Deferrer + 'static,
{
    if !host.is_element(container) {
        return Err(MountError::InvalidContainer(container));
    }

    Ok(Root {
        runtime: Runtime::new(host, container, Rc::new(deferrer), config),
    })
}

/// Create a root and render `node` into it.
pub fn mount<D>(
    node: impl Into<Option<VNode>>,
    host: Rc<dyn Host>,
    container: NodeId,
    deferrer: D,
) -> Result<Root, MountError>
where
    D: Deferrer + 'static,
{
    let root = create_root(host, container, deferrer)?;
    root.render(node)?;
    Ok(root)
}
