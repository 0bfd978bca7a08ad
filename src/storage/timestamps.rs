//! File timestamps
//!
//! Captures and restores the creation/access/modification triple of a file
//! through the host operating system. Every failure here is absorbed: callers
//! only ever learn whether the operation happened.

use filetime::FileTime;
use log::{debug, warn};
use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::path::Path;

/// The timestamp triple of a file.
///
/// Creation time is optional because not every host reports a birth time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamps {
    pub created: Option<FileTime>,
    pub accessed: FileTime,
    pub modified: FileTime,
}

impl FileTimestamps {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            created: FileTime::from_creation_time(metadata),
            accessed: FileTime::from_last_access_time(metadata),
            modified: FileTime::from_last_modification_time(metadata),
        }
    }
}

/// Reads and writes timestamp triples by path.
///
/// Implementations must never fail loudly: `capture` returns `None` and
/// `restore` returns `false` when the host refuses.
pub trait TimestampStore: Send + Sync {
    fn capture(&self, path: &Path) -> Option<FileTimestamps>;

    fn restore(&self, path: &Path, times: &FileTimestamps) -> bool;
}

/// Timestamp store backed by the host file system.
///
/// On unix the birth time cannot be set, so restoring applies the access and
/// modification times; on Windows the full triple is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTimestampStore;

impl TimestampStore for HostTimestampStore {
    fn capture(&self, path: &Path) -> Option<FileTimestamps> {
        let file = match open_for_metadata(OpenOptions::new().read(true), path) {
            Ok(file) => file,
            Err(e) => {
                debug!("No timestamps captured for {}: {}", path.display(), e);
                return None;
            }
        };

        match file.metadata() {
            Ok(metadata) => Some(FileTimestamps::from_metadata(&metadata)),
            Err(e) => {
                debug!("Metadata query failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn restore(&self, path: &Path, times: &FileTimestamps) -> bool {
        let result = open_for_metadata(OpenOptions::new().write(true), path)
            .and_then(|file| apply_times(&file, times));

        match result {
            Ok(()) => {
                debug!("Restored timestamps on {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to restore timestamps on {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Opens an existing path without creating, truncating or locking it.
fn open_for_metadata(options: &mut OpenOptions, path: &Path) -> io::Result<File> {
    options.create(false).truncate(false);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;

        // FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE
        options.share_mode(0x1 | 0x2 | 0x4);
    }

    options.open(path)
}

#[cfg(unix)]
fn apply_times(file: &File, times: &FileTimestamps) -> io::Result<()> {
    filetime::set_file_handle_times(file, Some(times.accessed), Some(times.modified))
}

#[cfg(windows)]
fn apply_times(file: &File, times: &FileTimestamps) -> io::Result<()> {
    use std::fs::FileTimes;
    use std::os::windows::fs::FileTimesExt;

    let mut file_times = FileTimes::new()
        .set_accessed(to_system_time(times.accessed))
        .set_modified(to_system_time(times.modified));
    if let Some(created) = times.created {
        file_times = file_times.set_created(to_system_time(created));
    }
    file.set_times(file_times)
}

#[cfg(not(any(unix, windows)))]
fn apply_times(file: &File, times: &FileTimestamps) -> io::Result<()> {
    filetime::set_file_handle_times(file, Some(times.accessed), Some(times.modified))
}

#[cfg(windows)]
fn to_system_time(time: FileTime) -> std::time::SystemTime {
    use std::time::{Duration, UNIX_EPOCH};

    let seconds = time.unix_seconds();
    let base = if seconds >= 0 {
        UNIX_EPOCH + Duration::from_secs(seconds as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(seconds.unsigned_abs())
    };
    base + Duration::from_nanos(u64::from(time.nanoseconds()))
}
