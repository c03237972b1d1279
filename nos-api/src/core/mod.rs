//! Core module containing fundamental types

pub mod types;

// Re-export commonly used items
pub use types::*;
