//! Paging statistics

use nos_api::sync::{AtomicU64, Ordering};

/// Lock-free paging counters
#[derive(Debug, Default)]
pub struct PagingStats {
    pub(crate) references: AtomicU64,
    pub(crate) faults: AtomicU64,
    pub(crate) spurious_faults: AtomicU64,
    pub(crate) free_frame_hits: AtomicU64,
    pub(crate) evictions: AtomicU64,
    pub(crate) swap_ins: AtomicU64,
    pub(crate) swap_outs: AtomicU64,
    pub(crate) failed_faults: AtomicU64,
    pub(crate) not_enough_memory: AtomicU64,
    pub(crate) pins: AtomicU64,
    pub(crate) unpins: AtomicU64,
}

/// Paging statistics at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingStatsSnapshot {
    /// Memory references handled
    pub references: u64,
    /// Faults that started resolving (spurious and exhausted calls excluded)
    pub faults: u64,
    /// Fault calls on an already valid page
    pub spurious_faults: u64,
    /// Faults served from a free frame
    pub free_frame_hits: u64,
    /// Pages evicted to make room
    pub evictions: u64,
    /// Pages read from the swap device
    pub swap_ins: u64,
    /// Pages written to the swap device
    pub swap_outs: u64,
    /// Faults abandoned because the thread died
    pub failed_faults: u64,
    /// Faults refused because every frame was pinned or reserved
    pub not_enough_memory: u64,
    /// Successful pins
    pub pins: u64,
    /// Unpin calls
    pub unpins: u64,
}

impl PagingStats {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    /// Read every counter
    pub fn snapshot(&self) -> PagingStatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        PagingStatsSnapshot {
            references: load(&self.references),
            faults: load(&self.faults),
            spurious_faults: load(&self.spurious_faults),
            free_frame_hits: load(&self.free_frame_hits),
            evictions: load(&self.evictions),
            swap_ins: load(&self.swap_ins),
            swap_outs: load(&self.swap_outs),
            failed_faults: load(&self.failed_faults),
            not_enough_memory: load(&self.not_enough_memory),
            pins: load(&self.pins),
            unpins: load(&self.unpins),
        }
    }
}
