//! Flush Scheduling
//!
//! Async-mode frames are not re-run inside `trigger`. The engine marks one
//! flush as pending and, if it was built with a [`Scheduler`], hands the
//! flush task to it to run once the current synchronous turn has finished.
//! This plays the role of a microtask checkpoint. A flush is run at most
//! once: whichever of the scheduler and `Engine::complete_effects` gets
//! there first runs it.
//!
//! Two schedulers ship with the crate:
//!
//! - [`LocalTaskScheduler`] spawns the flush onto the thread's tokio
//!   `LocalSet`. The flush runs the next time the executor regains control,
//!   i.e. when the current task yields or awaits.
//! - [`ManualScheduler`] queues flushes until the host calls
//!   [`ManualScheduler::run_until_idle`]. Useful for hosts without a tokio
//!   runtime and for deterministic tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Runs deferred tasks after the current synchronous turn.
pub trait Scheduler {
    /// Queue `task` to run later. Must not run it before returning.
    fn schedule(&self, task: Task);
}

/// Scheduler backed by `tokio::task::spawn_local`.
///
/// Only for engines whose writes happen inside a `tokio::task::LocalSet`;
/// tokio panics when `spawn_local` is called anywhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTaskScheduler;

impl Scheduler for LocalTaskScheduler {
    fn schedule(&self, task: Task) {
        tokio::task::spawn_local(async move { task() });
    }
}

/// Scheduler that holds tasks until they are run explicitly.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<VecDeque<Task>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run queued tasks in FIFO order, including tasks queued by the tasks
    /// themselves, until the queue is empty. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        // The borrow must end before the task runs: tasks may schedule more.
        while let Some(task) = self.pop() {
            task();
            ran += 1;
        }
        ran
    }

    fn pop(&self) -> Option<Task> {
        self.queue.borrow_mut().pop_front()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
