//! File system contract
//!
//! The abstraction the protocol server talks to. Both the host-backed
//! [`LocalDir`](crate::storage::LocalDir) and the guarding decorators implement
//! it, so one can stand in for the other.

use std::fmt;
use std::io::{self, Read, Seek, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::storage::flags::OpenFlags;

/// Metadata describing a single file or directory entry.
pub trait FileInfo: fmt::Debug + Send {
    /// Base name of the entry.
    fn name(&self) -> &str;

    /// Size in bytes; zero for directories.
    fn size(&self) -> u64;

    fn is_dir(&self) -> bool;

    fn modified(&self) -> Option<SystemTime>;

    /// Declared content type, if the file system knows one.
    ///
    /// `None` means nothing is declared and the protocol server is free to
    /// sniff the file's bytes.
    fn content_type(&self) -> Option<String> {
        None
    }
}

/// An open file or directory.
///
/// Reads, writes and seeks go through the `std::io` traits untouched.
pub trait FileHandle: Read + Write + Seek + Send {
    fn stat(&self) -> io::Result<Box<dyn FileInfo>>;

    /// Reads up to `max_entries` directory entries, continuing from the last
    /// call. Zero reads every remaining entry.
    fn read_dir(&mut self, max_entries: usize) -> io::Result<Vec<Box<dyn FileInfo>>>;

    /// Releases the handle. Further I/O on it fails.
    fn close(&mut self) -> io::Result<()>;
}

/// A directory-scoped file system root.
pub trait FileSystem {
    type File: FileHandle;

    /// Resolves a client-supplied name to a full host path under the root.
    fn resolve(&self, name: &str) -> io::Result<PathBuf>;

    fn open_file(&self, name: &str, flags: OpenFlags, perm: u32) -> io::Result<Self::File>;

    fn stat(&self, name: &str) -> io::Result<Box<dyn FileInfo>>;
}
