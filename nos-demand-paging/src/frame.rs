//! Physical frame table
//!
//! One [`Frame`] per physical slot, created once when the manager starts and
//! kept for the whole simulation. A frame cycles through free, bound,
//! reserved and pinned states.
//!
//! Invariant: a dirty frame always maps a page.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

use bitflags::bitflags;
use nos_api::{FrameId, PageId, TaskId};

bitflags! {
    /// Usage bits of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameFlags: u8 {
        /// Accessed since the clock hand last passed
        const REFERENCED = 1 << 0;
        /// Written since the last swap-in
        const DIRTY = 1 << 1;
    }
}

/// State of one physical frame
#[derive(Debug, Clone)]
pub struct Frame {
    id: FrameId,
    page: Option<PageId>,
    flags: FrameFlags,
    lock_count: u32,
    reserved_by: Option<TaskId>,
}

impl Frame {
    /// Create a free frame
    pub const fn new(id: FrameId) -> Self {
        Self {
            id,
            page: None,
            flags: FrameFlags::empty(),
            lock_count: 0,
            reserved_by: None,
        }
    }

    /// Frame index
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Page currently occupying the frame
    pub fn page(&self) -> Option<PageId> {
        self.page
    }

    /// Usage bits
    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.contains(FrameFlags::DIRTY)
    }

    pub fn is_referenced(&self) -> bool {
        self.flags.contains(FrameFlags::REFERENCED)
    }

    /// Number of outstanding pins
    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }

    /// Task whose fault currently holds the frame
    pub fn reserved_by(&self) -> Option<TaskId> {
        self.reserved_by
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved_by.is_some()
    }

    /// True if nothing occupies, pins, reserves or marks the frame
    pub fn is_free(&self) -> bool {
        self.reserved_by.is_none()
            && self.page.is_none()
            && self.lock_count == 0
            && self.flags.is_empty()
    }

    /// True if the frame may not be handed to a new fault at all
    pub fn is_unavailable(&self) -> bool {
        self.is_reserved() || self.is_locked()
    }

    /// True if the clock may consider the frame for eviction
    pub(crate) fn is_evictable(&self) -> bool {
        !self.is_referenced() && !self.is_locked() && !self.is_reserved()
    }

    pub fn set_referenced(&mut self, referenced: bool) {
        self.flags.set(FrameFlags::REFERENCED, referenced);
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        debug_assert!(!dirty || self.page.is_some(), "dirty frame {} maps no page", self.id);
        self.flags.set(FrameFlags::DIRTY, dirty);
    }

    /// Record `page` as the frame's occupant
    pub fn bind(&mut self, page: PageId) {
        self.page = Some(page);
    }

    /// Drop the occupant and clear both usage bits
    pub fn unbind(&mut self) -> Option<PageId> {
        self.flags = FrameFlags::empty();
        self.page.take()
    }

    /// Claim the frame for a fault of `task`
    pub fn reserve(&mut self, task: TaskId) {
        self.reserved_by = Some(task);
    }

    /// Release the claim of `task`; a claim by another task is left alone
    pub fn unreserve(&mut self, task: TaskId) -> bool {
        if self.reserved_by == Some(task) {
            self.reserved_by = None;
            true
        } else {
            false
        }
    }

    pub fn increment_lock_count(&mut self) {
        self.lock_count = self.lock_count.saturating_add(1);
    }

    /// Drop one pin; a frame with no pins stays at zero
    pub fn decrement_lock_count(&mut self) {
        self.lock_count = self.lock_count.saturating_sub(1);
    }

    /// Copy of the frame's state
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            id: self.id,
            page: self.page,
            dirty: self.is_dirty(),
            referenced: self.is_referenced(),
            lock_count: self.lock_count,
            reserved_by: self.reserved_by,
        }
    }
}

/// Point-in-time copy of a frame, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Frame index
    pub id: FrameId,
    /// Occupying page
    pub page: Option<PageId>,
    /// Dirty bit
    pub dirty: bool,
    /// Referenced bit
    pub referenced: bool,
    /// Outstanding pins
    pub lock_count: u32,
    /// Reserving task
    pub reserved_by: Option<TaskId>,
}

impl fmt::Display for FrameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {}: page=", self.id)?;
        match self.page {
            Some(page) => write!(f, "{}", page)?,
            None => f.write_str("-")?,
        }
        write!(
            f,
            " dirty={} referenced={} locks={} reserved_by={:?}",
            self.dirty, self.referenced, self.lock_count, self.reserved_by
        )
    }
}

/// All physical frames, indexed by [`FrameId`]
#[derive(Debug, Clone)]
pub struct FrameTable {
    frames: Vec<Frame>,
}

impl FrameTable {
    /// Create `count` free frames
    pub fn new(count: usize) -> Self {
        Self {
            frames: (0..count).map(Frame::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }

    /// Number of free frames; reads no bit it could disturb
    pub fn free_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.is_free()).count()
    }

    /// Lowest-index free frame
    pub fn first_free(&self) -> Option<FrameId> {
        self.frames.iter().position(Frame::is_free)
    }

    /// True if every frame is pinned or reserved
    pub fn all_unavailable(&self) -> bool {
        self.frames.iter().all(Frame::is_unavailable)
    }

    pub fn snapshot(&self) -> Vec<FrameSnapshot> {
        self.frames.iter().map(Frame::snapshot).collect()
    }
}

impl Index<FrameId> for FrameTable {
    type Output = Frame;

    fn index(&self, id: FrameId) -> &Frame {
        &self.frames[id]
    }
}

impl IndexMut<FrameId> for FrameTable {
    fn index_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id]
    }
}
