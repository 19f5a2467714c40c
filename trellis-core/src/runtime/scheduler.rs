//! Deferred Execution
//!
//! Render passes and effect flushes never run inside the call that asked for
//! them. They are handed to a [`Deferrer`], which runs them in a later turn.
//!
//! # Coalescing
//!
//! Each kind of job has a [`CoalescedJob`] flag. The first request in a turn
//! sets the flag and defers the job; later requests see the flag and are
//! absorbed. The job clears the flag before doing its work, so a request
//! issued while it runs schedules a fresh job instead of being lost.
//!
//! # Executors
//!
//! - [`TaskQueue`]: a manual queue. The embedder decides when a turn ends by
//!   calling [`TaskQueue::run_until_idle`]. Deterministic; used in tests.
//! - [`TokioDeferrer`]: spawns each job onto the current tokio `LocalSet`.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks in a later turn, in the order they were deferred.
pub trait Deferrer {
    fn defer(&self, task: Task);
}

/// A manually drained task queue.
///
/// Clones share the same queue, so an embedder can keep one handle and give
/// another to a root.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run tasks until the queue is empty, including tasks deferred by the
    /// tasks being run. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop without holding the borrow: tasks defer more tasks.
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Number of tasks waiting.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Deferrer for TaskQueue {
    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Defers tasks with `tokio::task::spawn_local`.
///
/// Must be used from within a `tokio::task::LocalSet`; spawning outside one
/// panics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDeferrer;

impl Deferrer for TokioDeferrer {
    fn defer(&self, task: Task) {
        tokio::task::spawn_local(async move { task() });
    }
}

/// At-most-once-per-turn flag for a deferred job.
#[derive(Debug, Default)]
pub(crate) struct CoalescedJob {
    scheduled: Cell<bool>,
}

impl CoalescedJob {
    /// Returns true if the caller should defer the job now.
    pub(crate) fn try_schedule(&self) -> bool {
        !self.scheduled.replace(true)
    }

    /// Called by the job when it starts running.
    pub(crate) fn finish(&self) {
        self.scheduled.set(false);
    }

    #[cfg(test)]
    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_runs_tasks_in_order_including_nested() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (q, l) = (queue.clone(), log.clone());
        queue.defer(Box::new(move || {
            l.borrow_mut().push(1);
            let l = l.clone();
            q.defer(Box::new(move || l.borrow_mut().push(3)));
        }));
        let l = log.clone();
        queue.defer(Box::new(move || l.borrow_mut().push(2)));

        assert_eq!(queue.pending(), 2);
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn coalesced_job_absorbs_repeat_requests() {
        let job = CoalescedJob::default();
        assert!(job.try_schedule());
        assert!(!job.try_schedule());
        assert!(job.is_scheduled());

        job.finish();
        assert!(!job.is_scheduled());
        assert!(job.try_schedule());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn tokio_deferrer_runs_on_local_set() {
        let hits = Rc::new(Cell::new(0));
        let local = tokio::task::LocalSet::new();

        let h = hits.clone();
        local
            .run_until(async move {
                TokioDeferrer.defer(Box::new(move || h.set(h.get() + 1)));
                tokio::task::yield_now().await;
            })
            .await;
        local.await;

        assert_eq!(hits.get(), 1);
    }
}
