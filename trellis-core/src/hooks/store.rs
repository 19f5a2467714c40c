//! Hook Store
//!
//! Per-root storage for hook state, keyed by identity path.
//!
//! # Layout
//!
//! Each path owns a growable slot array. A component's hooks claim slots in
//! call order through a per-path cursor that is reset whenever the path
//! starts rendering, so the n-th hook call of a render always lands on the
//! n-th slot.
//!
//! Alongside the slots the store tracks:
//!
//! - the stack of paths currently rendering (components render nested)
//! - the paths visited by the in-flight render pass, used to collect state
//!   of components that were not rendered
//! - the queue of effect tasks waiting for the post-commit flush
//! - paths whose state changed since the last pass, used to decide whether
//!   an unchanged subtree may be retained without re-rendering

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use indexmap::IndexMap;

use super::effect::{Cleanup, Deps};
use crate::node::is_within;

/// A queued effect body: runs once and may hand back a cleanup.
pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// State of one `use_effect` call site.
pub(crate) struct EffectRecord {
    pub(crate) deps: Deps,
    pub(crate) cleanup: Option<Cleanup>,
    pub(crate) pending: Option<EffectFn>,
}

/// One persisted hook slot.
pub(crate) enum HookSlot {
    Value(Box<dyn Any>),
    Effect(EffectRecord),
}

/// An effect waiting to run: which path, which slot.
#[derive(Debug, Clone)]
pub(crate) struct EffectTask {
    pub(crate) path: Rc<str>,
    pub(crate) index: usize,
}

#[derive(Default)]
pub(crate) struct HookStore {
    slots: IndexMap<Rc<str>, Vec<HookSlot>>,
    cursors: HashMap<Rc<str>, usize>,
    visited: HashSet<Rc<str>>,
    stack: Vec<Rc<str>>,
    effects: VecDeque<EffectTask>,
    pending: HashSet<Rc<str>>,
    in_pass: HashSet<Rc<str>>,
}

impl HookStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start a render pass: forget the previous pass's visits and snapshot
    /// the paths updated since then.
    pub(crate) fn begin_pass(&mut self) {
        self.visited.clear();
        self.in_pass = std::mem::take(&mut self.pending);
    }

    pub(crate) fn end_pass(&mut self) {
        self.in_pass.clear();
    }

    /// Make `path` the currently rendering component.
    pub(crate) fn enter_component(&mut self, path: Rc<str>) {
        self.visited.insert(path.clone());
        self.cursors.insert(path.clone(), 0);
        self.slots.entry(path.clone()).or_default();
        self.stack.push(path);
    }

    pub(crate) fn exit_component(&mut self) -> Option<Rc<str>> {
        self.stack.pop()
    }

    #[cfg(test)]
    pub(crate) fn current_path(&self) -> Option<&Rc<str>> {
        self.stack.last()
    }

    /// Claim the next slot of the rendering component.
    pub(crate) fn next_index(&mut self) -> Option<(Rc<str>, usize)> {
        let path = self.stack.last()?.clone();
        let cursor = self.cursors.entry(path.clone()).or_insert(0);
        let index = *cursor;
        *cursor += 1;
        Some((path, index))
    }

    pub(crate) fn slot(&self, path: &str, index: usize) -> Option<&HookSlot> {
        self.slots.get(path)?.get(index)
    }

    /// Write a slot. Slots are claimed in order, so `index` is at most the
    /// current length of the path's array.
    pub(crate) fn set_slot(&mut self, path: &str, index: usize, slot: HookSlot) {
        let Some(slots) = self.slots.get_mut(path) else {
            return;
        };
        if index < slots.len() {
            slots[index] = slot;
        } else {
            debug_assert_eq!(index, slots.len(), "hook slots must be claimed in order");
            slots.push(slot);
        }
    }

    pub(crate) fn value<T: 'static>(&self, path: &str, index: usize) -> Option<&T> {
        match self.slot(path, index)? {
            HookSlot::Value(value) => value.downcast_ref(),
            HookSlot::Effect(_) => None,
        }
    }

    pub(crate) fn value_mut<T: 'static>(&mut self, path: &str, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(path)?.get_mut(index)? {
            HookSlot::Value(value) => value.downcast_mut(),
            HookSlot::Effect(_) => None,
        }
    }

    pub(crate) fn effect_mut(&mut self, path: &str, index: usize) -> Option<&mut EffectRecord> {
        match self.slots.get_mut(path)?.get_mut(index)? {
            HookSlot::Effect(record) => Some(record),
            HookSlot::Value(_) => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn has_path(&self, path: &str) -> bool {
        self.slots.contains_key(path)
    }

    pub(crate) fn mark_visited(&mut self, path: Rc<str>) {
        self.visited.insert(path);
    }

    /// Record that state under `path` changed.
    pub(crate) fn mark_pending(&mut self, path: Rc<str>) {
        self.pending.insert(path);
    }

    /// Whether the pass in flight was requested by a state change at or
    /// below `path`.
    pub(crate) fn has_pending_within(&self, path: &str) -> bool {
        self.in_pass.iter().any(|p| is_within(p, path))
    }

    /// Tracked paths not visited by the current pass.
    pub(crate) fn unvisited_paths(&self) -> Vec<Rc<str>> {
        self.slots
            .keys()
            .filter(|path| !self.visited.contains(*path))
            .cloned()
            .collect()
    }

    /// Detach every effect cleanup stored under `path`, in slot order.
    pub(crate) fn take_cleanups(&mut self, path: &str) -> Vec<Cleanup> {
        let Some(slots) = self.slots.get_mut(path) else {
            return Vec::new();
        };
        slots
            .iter_mut()
            .filter_map(|slot| match slot {
                HookSlot::Effect(record) => record.cleanup.take(),
                HookSlot::Value(_) => None,
            })
            .collect()
    }

    /// Delete every trace of `path`.
    pub(crate) fn remove_path(&mut self, path: &str) {
        self.slots.shift_remove(path);
        self.cursors.remove(path);
        self.pending.remove(path);
    }

    pub(crate) fn enqueue_effect(&mut self, task: EffectTask) {
        self.effects.push_back(task);
    }

    pub(crate) fn pop_effect(&mut self) -> Option<EffectTask> {
        self.effects.pop_front()
    }

    #[cfg(test)]
    pub(crate) fn pending_effects(&self) -> usize {
        self.effects.len()
    }

    /// Drop queued effects whose path is no longer tracked.
    pub(crate) fn drop_orphan_effects(&mut self) {
        let slots = &self.slots;
        self.effects.retain(|task| slots.contains_key(&task.path));
    }

    /// Number of tracked paths.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Forget everything. Cleanups still stored are dropped without running.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.cursors.clear();
        self.visited.clear();
        self.effects.clear();
        self.pending.clear();
        self.in_pass.clear();
    }
}

// ---- Tests ----
