//! Page fault resolution
//!
//! A fault takes a free frame if one exists, otherwise asks the clock for a
//! victim and writes it back first when it is dirty. The target frame is
//! reserved for the faulting task for the whole transfer so that no other
//! fault or clock sweep can claim it while the thread is suspended.
//!
//! The faulting thread can be killed at every suspension point: while parked
//! on its fault event, during the swap-out and during the swap-in. Each
//! checkpoint unwinds the page to invalid, unbound and not under validation,
//! gives up the frame reservation and wakes everything waiting on it.
//!
//! Only one fault per page is in flight. A fault raised on a page another
//! thread is already bringing in waits for that transfer instead.

use nos_api::error::Result;
use nos_api::{AccessKind, Event, FaultStatus, FrameId, PageId, TaskId, ThreadId};

use crate::manager::MemoryManager;
use crate::stats::PagingStats;

enum Precheck {
    Spurious,
    InFlight(ThreadId),
    Exhausted,
    Proceed,
}

enum Claim {
    /// A free frame, already bound to the faulting page
    Free(FrameId),
    /// A clean frame from the clock, already bound to the faulting page
    Clean(FrameId),
    /// A dirty frame whose occupant must be written back first
    Dirty { frame: FrameId, occupant: PageId },
    /// Every frame got pinned or reserved while the thread was parked
    Nothing,
}

impl MemoryManager {
    /// Resolve a page fault of `thread` on `page`
    ///
    /// Returns [`FaultStatus::Failure`] if the page was already valid or the
    /// thread died along the way, and [`FaultStatus::NotEnoughMemory`] if no
    /// frame could be claimed. If another thread is validating the page the
    /// caller waits for it and gets [`FaultStatus::Success`] only if the page
    /// came in.
    pub fn handle_page_fault(&self, thread: ThreadId, access: AccessKind, page: PageId) -> Result<FaultStatus> {
        let task = self.task_of(thread)?;

        let precheck = {
            let mut state = self.state.lock();
            let exhausted = state.frames.all_unavailable();
            let entry = state.require_page_mut(page)?;
            if entry.is_valid() {
                Precheck::Spurious
            } else if let Some(other) = entry.validating_thread() {
                Precheck::InFlight(other)
            } else if exhausted {
                Precheck::Exhausted
            } else {
                entry.set_validating_thread(Some(thread));
                Precheck::Proceed
            }
        };

        match precheck {
            Precheck::Spurious => {
                vm_warn!("thread {}: spurious fault on valid page {}", thread, page);
                PagingStats::bump(&self.stats.spurious_faults);
                self.notify(Event::Page(page));
                self.threads.dispatch();
                return Ok(FaultStatus::Failure);
            }
            Precheck::InFlight(other) => {
                return Ok(self.await_fault(thread, page, other));
            }
            Precheck::Exhausted => {
                vm_warn!("thread {}: every frame is pinned or reserved, page {} stays out", thread, page);
                PagingStats::bump(&self.stats.not_enough_memory);
                self.notify(Event::Page(page));
                self.threads.dispatch();
                return Ok(FaultStatus::NotEnoughMemory);
            }
            Precheck::Proceed => {}
        }

        PagingStats::bump(&self.stats.faults);
        vm_debug!("thread {}: {:?} fault on page {}", thread, access, page);

        let fault_event = self.next_fault_event();
        self.waiters.suspend(&*self.threads, thread, fault_event);
        if self.is_killed(thread) {
            return Ok(self.abandon_fault(thread, task, page, None, fault_event, FaultStatus::Failure));
        }

        let frame = match self.claim_frame(task, page) {
            Claim::Free(frame) => {
                PagingStats::bump(&self.stats.free_frame_hits);
                frame
            }
            Claim::Clean(frame) => frame,
            Claim::Dirty { frame, occupant } => {
                vm_debug!("thread {}: writing back page {} from frame {}", thread, occupant, frame);
                PagingStats::bump(&self.stats.swap_outs);
                self.swap.write(occupant, frame, thread);
                if self.is_killed(thread) {
                    return Ok(self.abandon_fault(thread, task, page, Some(frame), fault_event, FaultStatus::Failure));
                }

                let mut state = self.state.lock();
                if state.evict(frame).is_some() {
                    PagingStats::bump(&self.stats.evictions);
                }
                if let Some(entry) = state.page_mut(page) {
                    entry.set_frame(Some(frame));
                }
                frame
            }
            Claim::Nothing => {
                vm_warn!("thread {}: no frame left for page {}", thread, page);
                PagingStats::bump(&self.stats.not_enough_memory);
                return Ok(self.abandon_fault(thread, task, page, None, fault_event, FaultStatus::NotEnoughMemory));
            }
        };

        vm_debug!("thread {}: reading page {} into frame {}", thread, page, frame);
        PagingStats::bump(&self.stats.swap_ins);
        self.swap.read(page, frame, thread);
        if self.is_killed(thread) {
            return Ok(self.abandon_fault(thread, task, page, Some(frame), fault_event, FaultStatus::Failure));
        }

        if !self.complete_fault(task, access, page, frame) {
            vm_warn!("thread {}: page {} vanished during its fault", thread, page);
            return Ok(self.abandon_fault(thread, task, page, Some(frame), fault_event, FaultStatus::Failure));
        }

        vm_debug!("thread {}: page {} resident in frame {}", thread, page, frame);
        self.notify(Event::Page(page));
        self.notify(fault_event);
        self.threads.dispatch();
        Ok(FaultStatus::Success)
    }

    /// Pick and reserve the frame the page will be read into
    fn claim_frame(&self, task: TaskId, page: PageId) -> Claim {
        let mut state = self.state.lock();

        if let Some(frame) = state.frames.first_free() {
            state.frames[frame].reserve(task);
            if let Some(entry) = state.page_mut(page) {
                entry.set_frame(Some(frame));
            }
            return Claim::Free(frame);
        }

        let (victim, evicted) = state.select_victim();
        PagingStats::add(&self.stats.evictions, evicted as u64);
        let Some(frame) = victim else {
            return Claim::Nothing;
        };
        vm_debug!("clock picked frame {} (hand now at {})", frame, state.clock.hand());

        state.frames[frame].reserve(task);
        if state.frames[frame].is_dirty() {
            if let Some(occupant) = state.frames[frame].page() {
                return Claim::Dirty { frame, occupant };
            }
        }
        if state.evict(frame).is_some() {
            PagingStats::bump(&self.stats.evictions);
        }
        if let Some(entry) = state.page_mut(page) {
            entry.set_frame(Some(frame));
        }
        Claim::Clean(frame)
    }

    /// Bind the page to its frame once the swap-in is done
    fn complete_fault(&self, task: TaskId, access: AccessKind, page: PageId, frame: FrameId) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.page_mut(page) else {
            return false;
        };
        entry.set_valid(true);
        entry.set_frame(Some(frame));
        entry.set_validating_thread(None);

        let slot = &mut state.frames[frame];
        slot.bind(page);
        slot.set_referenced(true);
        slot.set_dirty(access.dirties_frame());
        slot.unreserve(task);
        true
    }

    /// Wait for the fault `validator` has in flight on `page`
    fn await_fault(&self, thread: ThreadId, page: PageId, validator: ThreadId) -> FaultStatus {
        if validator == thread {
            vm_warn!("thread {}: nested fault on page {} it is already bringing in", thread, page);
            self.threads.dispatch();
            return FaultStatus::Failure;
        }

        vm_debug!("thread {}: page {} is being brought in by thread {}", thread, page, validator);
        self.waiters.wait(&*self.threads, thread, Event::Page(page));
        let valid = self.state.lock().page(page).is_some_and(|entry| entry.is_valid());
        self.threads.dispatch();
        if valid && !self.is_killed(thread) {
            FaultStatus::Success
        } else {
            FaultStatus::Failure
        }
    }

    /// Undo a fault in progress
    ///
    /// The page ends invalid, unbound and not under validation, and the
    /// reservation `task` holds on `frame` is released. A victim whose write-back was
    /// interrupted keeps its occupant.
    fn abandon_fault(
        &self,
        thread: ThreadId,
        task: TaskId,
        page: PageId,
        frame: Option<FrameId>,
        fault_event: Event,
        status: FaultStatus,
    ) -> FaultStatus {
        vm_debug!("thread {}: abandoning fault on page {} ({:?})", thread, page, status);
        {
            let mut state = self.state.lock();
            if let Some(frame) = frame {
                state.frames[frame].unreserve(task);
            }
            if let Some(entry) = state.page_mut(page) {
                entry.set_validating_thread(None);
                entry.set_frame(None);
            }
        }
        if status == FaultStatus::Failure {
            PagingStats::bump(&self.stats.failed_faults);
        }
        self.notify(Event::Page(page));
        self.notify(fault_event);
        self.threads.dispatch();
        status
    }
}
