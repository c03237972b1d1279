//! Per-task page tables

use alloc::vec::Vec;

use nos_api::{PageId, PageNum, TaskId};

use crate::frame::FrameTable;
use crate::page::Page;

/// Page table of one task
///
/// A fixed-size, non-inverted table: one [`Page`] per virtual page number,
/// created when the task starts and dropped at teardown.
#[derive(Debug, Clone)]
pub struct PageTable {
    task: TaskId,
    pages: Vec<Page>,
}

/// What [`PageTable::release_frames`] gave back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleasedFrames {
    /// Frames that mapped a page of the task
    pub unmapped: usize,
    /// Frames whose reservation by the task was dropped
    pub unreserved: usize,
}

impl PageTable {
    /// Create a table of `size` invalid pages owned by `task`
    pub fn new(task: TaskId, size: usize) -> Self {
        Self {
            task,
            pages: (0..size).map(|number| Page::new(PageId::new(task, number))).collect(),
        }
    }

    /// Owning task
    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, number: PageNum) -> Option<&Page> {
        self.pages.get(number)
    }

    pub fn get_mut(&mut self, number: PageNum) -> Option<&mut Page> {
        self.pages.get_mut(number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    /// Number of pages currently valid
    pub fn resident_count(&self) -> usize {
        self.pages.iter().filter(|page| page.is_valid()).count()
    }

    /// Give back every frame the task holds
    ///
    /// A frame mapping one of the task's pages is unbound. A frame reserved
    /// by the task is released. The two are checked independently: a fault
    /// reserves its frame before the mapping exists.
    pub fn release_frames(&self, frames: &mut FrameTable) -> ReleasedFrames {
        let mut released = ReleasedFrames::default();
        for frame in frames.iter_mut() {
            if frame.page().is_some_and(|page| page.task == self.task) {
                frame.unbind();
                released.unmapped += 1;
            }
            if frame.unreserve(self.task) {
                released.unreserved += 1;
            }
        }
        vm_debug!(
            "task {}: released {} mapped and {} reserved frames",
            self.task, released.unmapped, released.unreserved
        );
        released
    }
}
