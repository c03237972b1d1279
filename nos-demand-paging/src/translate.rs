//! Address translation

use nos_api::error::Result;
use nos_api::{AccessKind, Event, InterruptVector, PageId, ThreadId, VirtAddr};

use crate::manager::MemoryManager;
use crate::stats::PagingStats;

impl MemoryManager {
    /// Handle a memory reference of `thread` to `address`
    ///
    /// Raises a page fault through the trap if the page is not resident, or
    /// waits for the fault already in progress on it. Once the page is
    /// resident its frame is marked referenced, and dirty for a write.
    /// Returns the page the address falls in.
    pub fn refer(&self, address: VirtAddr, access: AccessKind, thread: ThreadId) -> Result<PageId> {
        let number = self.config.page_number(address)?;
        let task = self.task_of(thread)?;
        let page = PageId::new(task, number);

        let (valid, validating) = {
            let state = self.state.lock();
            let entry = state.require_page(page)?;
            (entry.is_valid(), entry.validating_thread())
        };
        PagingStats::bump(&self.stats.references);

        if !valid {
            match validating {
                None => {
                    let vector = InterruptVector { access, page, thread };
                    self.trap.page_fault(self, vector)?;
                }
                Some(other) => {
                    vm_trace!("thread {}: page {} is being brought in by thread {}", thread, page, other);
                    self.waiters.wait(&*self.threads, thread, Event::Page(page));
                }
            }
            if self.is_killed(thread) {
                return Ok(page);
            }
        }

        let mut state = self.state.lock();
        let Some(frame) = state.page(page).and_then(|entry| entry.frame()) else {
            vm_warn!("thread {}: page {} not resident after its fault", thread, page);
            return Ok(page);
        };
        let slot = &mut state.frames[frame];
        if slot.page() != Some(page) {
            vm_warn!("thread {}: frame {} no longer holds page {}", thread, frame, page);
            return Ok(page);
        }
        slot.set_referenced(true);
        if access == AccessKind::Write {
            slot.set_dirty(true);
        }
        vm_trace!("thread {}: {:?} of {:#x} in page {} (frame {})", thread, access, address, page, frame);
        Ok(page)
    }
}
