//! Pinning pages for device transfers
//!
//! A pinned page's frame has a non-zero lock count and is skipped by the
//! clock. Pins nest; each [`MemoryManager::unpin`] drops one.

use nos_api::error::Result;
use nos_api::{AccessKind, Event, FaultStatus, IoRequest, PageId};

use crate::manager::MemoryManager;
use crate::stats::PagingStats;

impl MemoryManager {
    /// Make the page of `request` resident and pin its frame
    ///
    /// A pin by the thread that is itself validating the page does not wait
    /// for that fault and pins whatever frame is bound already.
    pub fn pin(&self, request: &IoRequest) -> Result<FaultStatus> {
        let IoRequest { thread, page } = *request;

        let (valid, validating) = {
            let state = self.state.lock();
            let entry = state.require_page(page)?;
            (entry.is_valid(), entry.validating_thread())
        };

        if !valid {
            match validating {
                None => {
                    self.handle_page_fault(thread, AccessKind::Lock, page)?;
                    if self.is_killed(thread) {
                        return Ok(FaultStatus::Failure);
                    }
                }
                Some(other) if other != thread => {
                    self.waiters.wait(&*self.threads, thread, Event::Page(page));
                    let valid = self.state.lock().page(page).is_some_and(|entry| entry.is_valid());
                    if !valid || self.is_killed(thread) {
                        return Ok(FaultStatus::Failure);
                    }
                }
                Some(_) => {}
            }
        }

        let mut state = self.state.lock();
        let Some(frame) = state.page(page).and_then(|entry| entry.frame()) else {
            vm_debug!("thread {}: nothing to pin for page {}", thread, page);
            return Ok(FaultStatus::Failure);
        };
        state.frames[frame].increment_lock_count();
        PagingStats::bump(&self.stats.pins);
        vm_debug!(
            "thread {}: pinned page {} in frame {} ({} pins)",
            thread,
            page,
            frame,
            state.frames[frame].lock_count()
        );
        Ok(FaultStatus::Success)
    }

    /// Drop one pin from the frame of `page`
    ///
    /// An unbound page or a frame without pins is left as it is.
    pub fn unpin(&self, page: PageId) -> Result<()> {
        let mut state = self.state.lock();
        let Some(frame) = state.require_page(page)?.frame() else {
            return Ok(());
        };
        state.frames[frame].decrement_lock_count();
        PagingStats::bump(&self.stats.unpins);
        Ok(())
    }
}
