//! Per-event wait queues
//!
//! Threads waiting on a page under validation, and the faulting thread
//! itself, are parked here. The queues only record who waits on what; the
//! actual blocking and waking is delegated to the injected
//! [`ThreadControl`], so any scheduler (or a scripted one in tests) can drive
//! them. The queue lock is never held across a call into the scheduler.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use hashbrown::HashMap;
use nos_api::sync::Mutex;
use nos_api::{Event, ThreadControl, ThreadId};

/// Threads parked on events
#[derive(Debug, Default)]
pub struct WaitQueues {
    queues: Mutex<HashMap<Event, VecDeque<ThreadId>>>,
}

impl WaitQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `thread` on `event` until the next notification
    ///
    /// The thread stays queued after the scheduler returns; a later
    /// [`notify_all`](Self::notify_all) resumes it.
    pub fn suspend(&self, threads: &dyn ThreadControl, thread: ThreadId, event: Event) {
        self.queues.lock().entry(event).or_default().push_back(thread);
        vm_trace!("thread {} suspended on {}", thread, event);
        threads.suspend(thread, event);
    }

    /// Park `thread` on `event` and withdraw it once it runs again
    ///
    /// A thread killed while parked is never notified, so it is taken off
    /// the queue here rather than left for a notification that would
    /// resume a dead thread.
    pub fn wait(&self, threads: &dyn ThreadControl, thread: ThreadId, event: Event) {
        self.suspend(threads, thread, event);
        self.withdraw(thread, event);
    }

    /// Resume every thread parked on `event`; returns how many were woken
    pub fn notify_all(&self, threads: &dyn ThreadControl, event: Event) -> usize {
        let waiters = self.queues.lock().remove(&event).unwrap_or_default();
        for &thread in &waiters {
            vm_trace!("resuming thread {} on {}", thread, event);
            threads.resume(thread, event);
        }
        waiters.len()
    }

    /// Remove `thread` from the queue of `event`
    pub fn withdraw(&self, thread: ThreadId, event: Event) -> bool {
        let mut queues = self.queues.lock();
        let Some(queue) = queues.get_mut(&event) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|&waiter| waiter != thread);
        let removed = queue.len() != before;
        if queue.is_empty() {
            queues.remove(&event);
        }
        removed
    }

    /// Threads currently parked on `event`, in arrival order
    pub fn waiters(&self, event: Event) -> Vec<ThreadId> {
        self.queues
            .lock()
            .get(&event)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of events with at least one waiter
    pub fn pending_events(&self) -> usize {
        self.queues.lock().len()
    }
}
