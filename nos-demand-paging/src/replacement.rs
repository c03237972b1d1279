//! Second-chance (clock) page replacement
//!
//! The hand sweeps the frame table in index order, wrapping around, and
//! keeps its position between invocations. A referenced frame loses its bit
//! and survives the pass. An unreferenced clean frame is unbound on the spot.
//! An unreferenced dirty frame needs a write-back first, which is the
//! caller's job, so the sweep only remembers the first one it meets.
//!
//! A sweep stops once enough frames are free or after two full turns, so no
//! frame's referenced bit is cleared more than once per turn.

use nos_api::{FrameId, PageId};

use crate::frame::FrameTable;

/// Clock replacement state
#[derive(Debug, Clone)]
pub struct ClockReplacer {
    hand: usize,
    frames_to_free: usize,
}

impl ClockReplacer {
    /// Create a clock whose hand starts at frame 0
    pub fn new(frames_to_free: usize) -> Self {
        Self {
            hand: 0,
            frames_to_free: frames_to_free.max(1),
        }
    }

    /// Current hand position
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Move the hand, e.g. to replay a recorded simulation
    pub fn set_hand(&mut self, hand: usize) {
        self.hand = hand;
    }

    /// Free frames a sweep tries to produce
    pub fn frames_to_free(&self) -> usize {
        self.frames_to_free
    }

    /// Pick a frame for an incoming page
    ///
    /// Returns a free frame when the sweep produced enough of them, else the
    /// first unpinned, unreserved dirty frame it passed (the caller must
    /// write it back before reuse), else any free frame. Every page whose
    /// frame the sweep unbinds is reported through `evicted`.
    pub fn select_victim<F>(&mut self, frames: &mut FrameTable, mut evicted: F) -> Option<FrameId>
    where
        F: FnMut(PageId),
    {
        let total = frames.len();
        if total == 0 {
            return None;
        }
        self.hand %= total;

        let mut dirty_candidate: Option<FrameId> = None;
        for _ in 0..total * 2 {
            if frames.free_count() >= self.frames_to_free {
                return frames.first_free();
            }

            let hand = self.hand;
            let frame = &mut frames[hand];
            if frame.is_referenced() {
                frame.set_referenced(false);
                vm_trace!("clock: frame {} gets a second chance", hand);
            } else if frame.is_evictable() && !frame.is_dirty() && frame.page().is_some() {
                if let Some(page) = frame.unbind() {
                    vm_trace!("clock: evicted clean page {} from frame {}", page, hand);
                    evicted(page);
                }
            } else if dirty_candidate.is_none() && frame.is_evictable() && frame.is_dirty() {
                dirty_candidate = Some(hand);
            }

            self.hand = (hand + 1) % total;
        }

        if frames.free_count() >= self.frames_to_free {
            return frames.first_free();
        }
        dirty_candidate.or_else(|| frames.first_free())
    }
}

impl Default for ClockReplacer {
    fn default() -> Self {
        Self::new(1)
    }
}
