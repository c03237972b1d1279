//! Memory management interface

use crate::core::types::{FrameId, TaskId, ThreadId, VirtAddr};
use crate::error::Result;
use crate::memory::types::{AccessKind, FaultStatus, InterruptVector, IoRequest, PageId};

/// Trait for the demand pager
///
/// The operations a host kernel drives: task start and teardown, memory
/// references, fault resolution and I/O pinning.
pub trait DemandPager {
    /// Creates the page table of a starting task
    fn create_page_table(&self, task: TaskId) -> Result<()>;

    /// Handles a memory reference and returns the referenced page
    ///
    /// The page may still be invalid if the thread was killed while the
    /// fault was being resolved.
    fn translate(&self, address: VirtAddr, access: AccessKind, thread: ThreadId) -> Result<PageId>;

    /// Resolves a page fault on behalf of `thread`
    fn resolve_fault(&self, thread: ThreadId, access: AccessKind, page: PageId) -> Result<FaultStatus>;

    /// Pins the page targeted by an I/O request, faulting it in if needed
    fn pin(&self, request: &IoRequest) -> Result<FaultStatus>;

    /// Releases one pin on a page
    fn unpin(&self, page: PageId) -> Result<()>;

    /// Releases every frame held by a terminating task
    fn deallocate(&self, task: TaskId) -> Result<()>;
}

/// Trait for the swap device backing each task's address space
///
/// Both transfers suspend the requesting thread until they complete. The
/// thread may be killed while suspended; callers check on return.
pub trait SwapDevice: Send + Sync {
    /// Reads `page` from the backing store into `frame`
    fn read(&self, page: PageId, frame: FrameId, thread: ThreadId);

    /// Writes the contents of `frame` back to the slot of `page`
    fn write(&self, page: PageId, frame: FrameId, thread: ThreadId);
}

/// Trait for page fault delivery
///
/// A reference to an invalid page raises a fault through this trap. The
/// provided method routes the fault straight to the pager; hosts override it
/// to interpose their own interrupt handling.
pub trait FaultTrap: Send + Sync {
    /// Delivers a page fault and returns the resolution outcome
    fn page_fault(&self, pager: &dyn DemandPager, vector: InterruptVector) -> Result<FaultStatus> {
        pager.resolve_fault(vector.thread, vector.access, vector.page)
    }
}

/// Fault trap that hands every fault directly to the pager
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectTrap;

impl FaultTrap for DirectTrap {}
