//! Process management interface

use crate::core::types::{TaskId, ThreadId, ThreadStatus};
use crate::event::Event;

/// Trait for the scheduler's thread control
///
/// The paging subsystem never blocks on its own: it parks threads through
/// this interface and lets the scheduler decide what runs next. `suspend`
/// is the scheduling point. When it returns, the scheduler has run whatever
/// it chose while the thread was parked, and the thread may have been killed.
pub trait ThreadControl: Send + Sync {
    /// Returns the task owning a thread
    fn task_of(&self, thread: ThreadId) -> Option<TaskId>;

    /// Returns the current status of a thread
    fn status(&self, thread: ThreadId) -> ThreadStatus;

    /// Parks a thread on an event
    fn suspend(&self, thread: ThreadId, event: Event);

    /// Wakes a thread parked on an event
    fn resume(&self, thread: ThreadId, event: Event);

    /// Picks the next thread to run
    fn dispatch(&self);

    /// Returns true if the thread has been killed
    fn is_killed(&self, thread: ThreadId) -> bool {
        self.status(thread).is_killed()
    }
}
