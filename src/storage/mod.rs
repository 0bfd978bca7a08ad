//! File system storage
//!
//! The file system contract, its host-backed implementation and the
//! decorators that guard timestamps and content types.

pub mod content_type;
pub mod filesystem;
pub mod flags;
pub mod guarded_dir;
pub mod guarded_file;
pub mod local;
pub mod timestamps;
pub mod validation;

pub use content_type::{FALLBACK_CONTENT_TYPE, MimeTable, NoSniffInfo};
pub use filesystem::{FileHandle, FileInfo, FileSystem};
pub use flags::OpenFlags;
pub use guarded_dir::GuardedDirectory;
pub use guarded_file::{CapturedState, GuardedFile};
pub use local::{LocalDir, LocalFile, LocalFileInfo};
pub use timestamps::{FileTimestamps, HostTimestampStore, TimestampStore};
