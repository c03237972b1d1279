//! NOS Demand Paging
//!
//! The demand-paged virtual memory core of the NOS simulator. It translates
//! memory references into frame accesses, resolves page faults with a
//! second-chance (clock) replacement policy, and pins pages for device I/O.
//!
//! The scheduler, the swap device and the fault trap are collaborators
//! injected through the traits in `nos_api`; see [`MemoryManager::new`].
//!
//! ```ignore
//! let manager = MemoryManager::new(MmuConfig::default().with_frames(4), threads, swap)?;
//! manager.create_page_table(task)?;
//! let page = manager.refer(0x1234, AccessKind::Write, thread)?;
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(clippy::all)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod config;
pub mod frame;
pub mod manager;
pub mod page;
pub mod page_table;
pub mod replacement;
pub mod stats;
pub mod wait_queue;

mod fault;
mod lock;
mod translate;

pub use config::{MAX_PAGE_ADDRESS_BITS, MAX_VIRTUAL_ADDRESS_BITS, MmuConfig};
pub use frame::{FrameFlags, FrameSnapshot};
pub use manager::MemoryManager;
pub use page::PageSnapshot;
pub use replacement::ClockReplacer;
pub use stats::PagingStatsSnapshot;

pub use nos_api::{
    AccessKind, DemandPager, Error, Event, FaultStatus, FaultTrap, InterruptVector, IoRequest, PageId, Result,
    SwapDevice, ThreadControl, ThreadStatus,
};
