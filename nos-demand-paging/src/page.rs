//! Virtual page entries

use nos_api::{FrameId, PageId, ThreadId};

/// State of one virtual page of a task
///
/// A page is valid iff it is bound to a frame holding its current contents.
/// While a fault is bringing it in, `validating_thread` names the thread
/// resolving it and `frame` may already point at the reserved target frame.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    valid: bool,
    frame: Option<FrameId>,
    validating_thread: Option<ThreadId>,
}

impl Page {
    /// Create an invalid, unbound page
    pub const fn new(id: PageId) -> Self {
        Self {
            id,
            valid: false,
            frame: None,
            validating_thread: None,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Thread currently resolving a fault on this page
    pub fn validating_thread(&self) -> Option<ThreadId> {
        self.validating_thread
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn set_frame(&mut self, frame: Option<FrameId>) {
        self.frame = frame;
    }

    pub fn set_validating_thread(&mut self, thread: Option<ThreadId>) {
        self.validating_thread = thread;
    }

    /// Mark the page invalid and drop its frame binding
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.frame = None;
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            id: self.id,
            valid: self.valid,
            frame: self.frame,
            validating_thread: self.validating_thread,
        }
    }
}

/// Point-in-time copy of a page, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Page identity
    pub id: PageId,
    /// Valid bit
    pub valid: bool,
    /// Bound frame
    pub frame: Option<FrameId>,
    /// Thread resolving a fault on the page
    pub validating_thread: Option<ThreadId>,
}
