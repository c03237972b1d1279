//! NOS API - Core interfaces and types for the NOS paging subsystem
//!
//! This crate provides the types and abstractions shared between the demand
//! pager and the kernel components it collaborates with. The pager consumes
//! the scheduler, the swap device and fault delivery only through the traits
//! defined here, so each can be replaced by a simulation in tests.
//!
//! # Architecture
//!
//! - **Core**: identifiers and thread status
//! - **Error**: common error type for caller misuse
//! - **Event**: events threads park on
//! - **Memory**: page identities, access kinds, fault outcomes and the
//!   [`DemandPager`], [`SwapDevice`] and [`FaultTrap`] interfaces
//! - **Process**: the [`ThreadControl`] scheduler interface
//!
//! # Usage
//!
//! ```rust
//! use nos_api::{AccessKind, FaultStatus, PageId};
//!
//! let page = PageId::new(1, 4);
//! assert_eq!(page.number, 4);
//! assert!(AccessKind::Write.dirties_frame());
//! assert!(FaultStatus::Success.is_success());
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod core;
pub mod error;
pub mod event;
pub mod memory;
pub mod process;
pub mod sync;

// Re-export commonly used types
pub use crate::core::types::*;
pub use crate::error::{Error, Result};
pub use crate::event::Event;
pub use crate::memory::interface::{DemandPager, DirectTrap, FaultTrap, SwapDevice};
pub use crate::memory::types::{AccessKind, FaultStatus, InterruptVector, IoRequest, PageId};
pub use crate::process::interface::ThreadControl;
