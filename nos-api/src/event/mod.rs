//! Wait events
//!
//! Threads park on an [`Event`] and are resumed when the event is notified.
//! A page is an event (threads referencing a page that is being faulted in
//! wait on it), and every fault has a private completion event the faulting
//! thread waits on while its transfers are in flight.

use core::fmt;

use crate::core::types::FaultId;
use crate::memory::types::PageId;

/// Something a thread can be suspended on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Completion of the fault currently validating a page
    Page(PageId),
    /// Private completion event of one fault
    Fault(FaultId),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Page(page) => write!(f, "page {}", page),
            Event::Fault(id) => write!(f, "fault #{}", id),
        }
    }
}
