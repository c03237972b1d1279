//! Synchronization primitives for the paging subsystem
//!
//! This module provides the thread-safe synchronization primitives
//! used in a no_std environment.

pub use spin::Mutex;
pub use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
