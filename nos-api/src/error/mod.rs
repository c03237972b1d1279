//! Error handling module for the paging subsystem
//!
//! Protocol outcomes of faults and pins are reported as
//! [`FaultStatus`](crate::memory::FaultStatus) codes. The [`Error`] type here
//! covers caller misuse: unknown tasks, out-of-range addresses, bad
//! configuration.

use alloc::string::{String, ToString};
use core::fmt;

/// Common error type used throughout the paging subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid argument
    InvalidArgument(String),
    /// Invalid state
    InvalidState(String),
    /// Resource not found
    NotFound(String),
    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new invalid argument error
pub fn invalid_argument(msg: &str) -> Error {
    Error::InvalidArgument(msg.to_string())
}

/// Creates a new invalid state error
pub fn invalid_state(msg: &str) -> Error {
    Error::InvalidState(msg.to_string())
}

/// Creates a new not found error
pub fn not_found(msg: &str) -> Error {
    Error::NotFound(msg.to_string())
}

/// Creates a new config error
pub fn config_error(msg: &str) -> Error {
    Error::ConfigError(msg.to_string())
}
