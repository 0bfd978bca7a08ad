//! Error handling
//!
//! Defines error types for the guarded file system.

pub mod types;

pub use types::*;
