//! The memory manager
//!
//! [`MemoryManager`] owns the frame table, every task's page table and the
//! clock hand, and holds the collaborators it was built with: the
//! scheduler's thread control, the swap device and the fault trap. The
//! reference, fault and pin paths live in their own modules as further
//! `impl MemoryManager` blocks.
//!
//! All paging state sits behind one lock. The lock is taken for short,
//! non-suspending sections only and is always released before calling into
//! a collaborator, because a collaborator may run other threads that
//! re-enter the manager.

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use nos_api::error::{Result, invalid_state, not_found};
use nos_api::sync::{AtomicU64, Mutex, Ordering};
use nos_api::{
    AccessKind, DemandPager, DirectTrap, Event, FaultId, FaultStatus, FaultTrap, FrameId, IoRequest, PageId,
    SwapDevice, TaskId, ThreadControl, ThreadId, VirtAddr,
};

use crate::config::{MmuConfig, ValidatedConfig};
use crate::frame::{FrameSnapshot, FrameTable};
use crate::page::{Page, PageSnapshot};
use crate::page_table::PageTable;
use crate::replacement::ClockReplacer;
use crate::stats::{PagingStats, PagingStatsSnapshot};
use crate::wait_queue::WaitQueues;

/// Paging state guarded by the manager's lock
#[derive(Debug)]
pub(crate) struct PagingState {
    pub(crate) frames: FrameTable,
    pub(crate) tables: HashMap<TaskId, PageTable>,
    pub(crate) clock: ClockReplacer,
}

impl PagingState {
    fn new(config: &MmuConfig) -> Self {
        Self {
            frames: FrameTable::new(config.frame_count),
            tables: HashMap::new(),
            clock: ClockReplacer::new(config.frames_to_free),
        }
    }

    pub(crate) fn page(&self, id: PageId) -> Option<&Page> {
        self.tables.get(&id.task)?.get(id.number)
    }

    pub(crate) fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.tables.get_mut(&id.task)?.get_mut(id.number)
    }

    pub(crate) fn require_page(&self, id: PageId) -> Result<&Page> {
        self.page(id).ok_or_else(|| not_found("page is not in any live page table"))
    }

    pub(crate) fn require_page_mut(&mut self, id: PageId) -> Result<&mut Page> {
        self.page_mut(id).ok_or_else(|| not_found("page is not in any live page table"))
    }

    /// Unbind a frame and invalidate the page it held
    pub(crate) fn evict(&mut self, frame: FrameId) -> Option<PageId> {
        let page = self.frames[frame].unbind()?;
        if let Some(entry) = self.page_mut(page) {
            entry.invalidate();
        }
        Some(page)
    }

    /// Run the clock, invalidating every page it unbinds
    pub(crate) fn select_victim(&mut self) -> (Option<FrameId>, usize) {
        let Self { frames, tables, clock } = self;
        let mut evicted = 0;
        let victim = clock.select_victim(frames, |page| {
            evicted += 1;
            if let Some(entry) = tables.get_mut(&page.task).and_then(|table| table.get_mut(page.number)) {
                entry.invalidate();
            }
        });
        (victim, evicted)
    }
}

/// Demand-paged virtual memory manager
pub struct MemoryManager {
    pub(crate) config: ValidatedConfig,
    pub(crate) state: Mutex<PagingState>,
    pub(crate) waiters: WaitQueues,
    pub(crate) threads: Arc<dyn ThreadControl>,
    pub(crate) swap: Arc<dyn SwapDevice>,
    pub(crate) trap: Arc<dyn FaultTrap>,
    pub(crate) stats: PagingStats,
    next_fault: AtomicU64,
}

impl MemoryManager {
    /// Create a manager with every frame free
    ///
    /// Faults raised by references go straight to the fault resolver; use
    /// [`with_trap`](Self::with_trap) to route them through a host trap.
    pub fn new(config: MmuConfig, threads: Arc<dyn ThreadControl>, swap: Arc<dyn SwapDevice>) -> Result<Self> {
        let config = ValidatedConfig::try_from(config)?;
        vm_info!(
            "paging: {} frames, {} pages per task, {} byte pages",
            config.frame_count,
            config.page_table_size(),
            config.page_size()
        );
        Ok(Self {
            state: Mutex::new(PagingState::new(&config)),
            config,
            waiters: WaitQueues::new(),
            threads,
            swap,
            trap: Arc::new(DirectTrap),
            stats: PagingStats::default(),
            next_fault: AtomicU64::new(0),
        })
    }

    /// Deliver page faults through `trap`
    pub fn with_trap(mut self, trap: Arc<dyn FaultTrap>) -> Self {
        self.trap = trap;
        self
    }

    pub fn config(&self) -> &MmuConfig {
        &self.config
    }

    /// Create the page table of a starting task
    pub fn create_page_table(&self, task: TaskId) -> Result<()> {
        let mut state = self.state.lock();
        if state.tables.contains_key(&task) {
            return Err(invalid_state("task already has a page table"));
        }
        state.tables.insert(task, PageTable::new(task, self.config.page_table_size()));
        vm_debug!("task {}: page table with {} pages", task, self.config.page_table_size());
        Ok(())
    }

    /// Release all memory held by a terminating task
    ///
    /// Frames mapping the task's pages are unbound and frames it reserved are
    /// released; then its page table is dropped.
    pub fn deallocate(&self, task: TaskId) -> Result<()> {
        let mut state = self.state.lock();
        let table = state
            .tables
            .remove(&task)
            .ok_or_else(|| not_found("task has no page table"))?;
        table.release_frames(&mut state.frames);
        Ok(())
    }

    /// True if `task` has a page table
    pub fn has_page_table(&self, task: TaskId) -> bool {
        self.state.lock().tables.contains_key(&task)
    }

    pub fn frame(&self, id: FrameId) -> Option<FrameSnapshot> {
        self.state.lock().frames.get(id).map(|frame| frame.snapshot())
    }

    /// Snapshot of the whole frame table
    pub fn frames(&self) -> Vec<FrameSnapshot> {
        self.state.lock().frames.snapshot()
    }

    pub fn page(&self, id: PageId) -> Option<PageSnapshot> {
        self.state.lock().page(id).map(Page::snapshot)
    }

    pub fn free_frame_count(&self) -> usize {
        self.state.lock().frames.free_count()
    }

    /// Current clock hand position
    pub fn cursor(&self) -> usize {
        self.state.lock().clock.hand()
    }

    /// Move the clock hand
    pub fn set_cursor(&self, hand: usize) {
        self.state.lock().clock.set_hand(hand);
    }

    /// Threads parked on a page waiting for its fault to finish
    pub fn page_waiters(&self, page: PageId) -> Vec<ThreadId> {
        self.waiters.waiters(Event::Page(page))
    }

    pub fn stats(&self) -> PagingStatsSnapshot {
        self.stats.snapshot()
    }

    /// Dump the frame table after the host reported an error
    pub fn at_error(&self) {
        for frame in self.frames() {
            vm_error!("{}", frame);
        }
    }

    /// Dump the frame table after the host reported a warning
    pub fn at_warning(&self) {
        for frame in self.frames() {
            vm_warn!("{}", frame);
        }
    }

    pub(crate) fn task_of(&self, thread: ThreadId) -> Result<TaskId> {
        self.threads
            .task_of(thread)
            .ok_or_else(|| not_found("thread belongs to no task"))
    }

    pub(crate) fn next_fault_event(&self) -> Event {
        let id: FaultId = self.next_fault.fetch_add(1, Ordering::Relaxed);
        Event::Fault(id)
    }

    pub(crate) fn notify(&self, event: Event) -> usize {
        self.waiters.notify_all(&*self.threads, event)
    }

    pub(crate) fn is_killed(&self, thread: ThreadId) -> bool {
        self.threads.is_killed(thread)
    }
}

impl DemandPager for MemoryManager {
    fn create_page_table(&self, task: TaskId) -> Result<()> {
        MemoryManager::create_page_table(self, task)
    }

    fn translate(&self, address: VirtAddr, access: AccessKind, thread: ThreadId) -> Result<PageId> {
        self.refer(address, access, thread)
    }

    fn resolve_fault(&self, thread: ThreadId, access: AccessKind, page: PageId) -> Result<FaultStatus> {
        self.handle_page_fault(thread, access, page)
    }

    fn pin(&self, request: &IoRequest) -> Result<FaultStatus> {
        MemoryManager::pin(self, request)
    }

    fn unpin(&self, page: PageId) -> Result<()> {
        MemoryManager::unpin(self, page)
    }

    fn deallocate(&self, task: TaskId) -> Result<()> {
        MemoryManager::deallocate(self, task)
    }
}
