//! Guarded file system
//!
//! A decorator over a directory-scoped file system used by a file-serving
//! protocol server. Writes to pre-existing files keep their original
//! timestamps, and content types can be pinned to the file extension so
//! clients never sniff file bytes.

pub mod config;
pub mod error;
pub mod storage;
pub mod utils;

pub use crate::config::GuardConfig;
pub use error::{GuardError, StorageError};
pub use storage::{
    FileHandle, FileInfo, FileSystem, GuardedDirectory, GuardedFile, HostTimestampStore,
    LocalDir, MimeTable, OpenFlags, TimestampStore,
};
