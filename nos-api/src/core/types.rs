//! Core types used throughout the paging subsystem

/// Represents a task (address-space owner) ID
pub type TaskId = u32;

/// Represents a thread ID
pub type ThreadId = u32;

/// Represents a physical frame index
pub type FrameId = usize;

/// Represents a virtual page number within one task
pub type PageNum = usize;

/// Represents a virtual address
pub type VirtAddr = usize;

/// Represents a size in bytes
pub type Size = usize;

/// Identifies one in-flight page fault
pub type FaultId = u64;

/// Represents a thread state as reported by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadStatus {
    /// Thread is running
    Running,
    /// Thread is ready to run
    Ready,
    /// Thread is parked on an event
    Waiting,
    /// Thread has been killed
    Killed,
}

impl ThreadStatus {
    /// Returns true if the thread has been killed
    #[inline]
    pub const fn is_killed(self) -> bool {
        matches!(self, ThreadStatus::Killed)
    }
}
