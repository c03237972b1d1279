//! Memory management types

use core::fmt;

use crate::core::types::{PageNum, TaskId, ThreadId};

/// Identity of one virtual page: the owning task and its page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// Owning task
    pub task: TaskId,
    /// Page number within the task's page table
    pub number: PageNum,
}

impl PageId {
    /// Creates a page identity
    pub const fn new(task: TaskId, number: PageNum) -> Self {
        Self { task, number }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.task, self.number)
    }
}

/// Kind of memory reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Memory read
    Read,
    /// Memory write
    Write,
    /// Pin for I/O
    Lock,
}

impl AccessKind {
    /// Returns true if a frame loaded for this access starts out dirty
    #[inline]
    pub const fn dirties_frame(self) -> bool {
        matches!(self, AccessKind::Write)
    }
}

/// Outcome of a fault resolution or a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultStatus {
    /// The page is resident (and pinned, for a pin)
    Success,
    /// The acting thread died, or the call was made in an invalid state
    Failure,
    /// Every frame is pinned or reserved
    NotEnoughMemory,
}

impl FaultStatus {
    /// Returns true for [`FaultStatus::Success`]
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, FaultStatus::Success)
    }
}

/// An I/O request that needs its target page pinned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoRequest {
    /// Thread that issued the request
    pub thread: ThreadId,
    /// Page the transfer targets
    pub page: PageId,
}

impl IoRequest {
    /// Creates an I/O request
    pub const fn new(thread: ThreadId, page: PageId) -> Self {
        Self { thread, page }
    }
}

/// Transfer record populated when a reference raises a page fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptVector {
    /// Kind of the faulting reference
    pub access: AccessKind,
    /// Page that faulted
    pub page: PageId,
    /// Thread that faulted
    pub thread: ThreadId,
}
