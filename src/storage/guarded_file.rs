//! Guarded file handle
//!
//! Wraps an open file so that writing to a pre-existing file leaves its
//! timestamps as they were before the open.
//!
//! The original timestamps are captured before the underlying file system
//! opens the file, since opening with write or truncate already touches them.
//! They are written back after the underlying handle has been closed, and only
//! if the capture worked and the open carried write intent.

use log::debug;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::storage::content_type::{MimeTable, NoSniffInfo};
use crate::storage::filesystem::{FileHandle, FileInfo, FileSystem};
use crate::storage::flags::OpenFlags;
use crate::storage::guarded_dir::GuardedDirectory;
use crate::storage::timestamps::{FileTimestamps, TimestampStore};

/// What was known about the file when it was opened.
#[derive(Debug, Clone)]
pub struct CapturedState {
    full_path: PathBuf,
    original: Option<FileTimestamps>,
    write_intent: bool,
}

impl CapturedState {
    /// Captures the timestamps of `full_path` as they are right now.
    pub fn capture(store: &dyn TimestampStore, full_path: PathBuf, flags: OpenFlags) -> Self {
        let original = store.capture(&full_path);
        match original {
            Some(_) => debug!("Captured timestamps of {}", full_path.display()),
            None => debug!("No prior timestamps for {}", full_path.display()),
        }
        Self {
            full_path,
            original,
            write_intent: flags.is_write_intent(),
        }
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    pub fn original(&self) -> Option<&FileTimestamps> {
        self.original.as_ref()
    }

    pub fn capture_succeeded(&self) -> bool {
        self.original.is_some()
    }

    pub fn is_write_intent(&self) -> bool {
        self.write_intent
    }

    /// Restoration is only meaningful for a write to a file that existed.
    pub fn should_restore(&self) -> bool {
        self.write_intent && self.original.is_some()
    }

    /// Writes the captured timestamps back if the policy asks for it.
    ///
    /// Returns whether a restoration was attempted.
    fn restore(self, store: &dyn TimestampStore) -> bool {
        if !self.should_restore() {
            return false;
        }
        if let Some(times) = &self.original {
            store.restore(&self.full_path, times);
        }
        true
    }
}

enum HandleState {
    Open(Option<CapturedState>),
    Closed,
}

/// A file handle that restores the original timestamps on close.
pub struct GuardedFile<H: FileHandle> {
    inner: H,
    state: HandleState,
    store: Arc<dyn TimestampStore>,
    content_types: Arc<MimeTable>,
}

impl<H: FileHandle> GuardedFile<H> {
    /// Opens `name` below `root`, capturing its timestamps first.
    ///
    /// An error from the underlying open is returned as is and nothing is
    /// restored. A name that cannot be resolved is simply not captured.
    pub fn open<F>(
        root: &GuardedDirectory<F>,
        name: &str,
        flags: OpenFlags,
        perm: u32,
    ) -> io::Result<Self>
    where
        F: FileSystem<File = H>,
    {
        let store = Arc::clone(root.store());
        let captured = match root.inner().resolve(name) {
            Ok(full_path) => Some(CapturedState::capture(store.as_ref(), full_path, flags)),
            Err(e) => {
                debug!("Cannot resolve {}: {}", name, e);
                None
            }
        };

        let inner = root.inner().open_file(name, flags, perm)?;

        Ok(Self {
            inner,
            state: HandleState::Open(captured),
            store,
            content_types: Arc::clone(root.content_types()),
        })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    /// State captured at open time; `None` once closed or if the name could
    /// not be resolved.
    pub fn captured(&self) -> Option<&CapturedState> {
        match &self.state {
            HandleState::Open(captured) => captured.as_ref(),
            HandleState::Closed => None,
        }
    }

    pub fn get_ref(&self) -> &H {
        &self.inner
    }

    fn no_sniff(&self, info: Box<dyn FileInfo>) -> Box<dyn FileInfo> {
        Box::new(NoSniffInfo::new(info, Arc::clone(&self.content_types)))
    }
}

impl<H: FileHandle> FileHandle for GuardedFile<H> {
    /// Content types of an open handle always come from the extension table.
    fn stat(&self) -> io::Result<Box<dyn FileInfo>> {
        let info = self.inner.stat()?;
        Ok(self.no_sniff(info))
    }

    fn read_dir(&mut self, max_entries: usize) -> io::Result<Vec<Box<dyn FileInfo>>> {
        let infos = self.inner.read_dir(max_entries)?;
        Ok(infos.into_iter().map(|info| self.no_sniff(info)).collect())
    }

    /// Closes the underlying handle, then restores timestamps if needed.
    ///
    /// Only the underlying close decides the result. Restoration happens at
    /// most once per handle, however often this is called.
    fn close(&mut self) -> io::Result<()> {
        let result = self.inner.close();

        if let HandleState::Open(Some(captured)) = mem::replace(&mut self.state, HandleState::Closed)
        {
            captured.restore(self.store.as_ref());
        }

        result
    }
}

impl<H: FileHandle> Read for GuardedFile<H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<H: FileHandle> Write for GuardedFile<H> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<H: FileHandle> Seek for GuardedFile<H> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<H: FileHandle> Drop for GuardedFile<H> {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::sync::Mutex;
    use std::time::SystemTime;

    type Events = Arc<Mutex<Vec<&'static str>>>;

    fn fixed_times() -> FileTimestamps {
        let t = FileTime::from_unix_time(1_600_000_000, 0);
        FileTimestamps {
            created: Some(t),
            accessed: t,
            modified: t,
        }
    }

    struct StubStore {
        events: Events,
        capture_ok: bool,
    }

    impl TimestampStore for StubStore {
        fn capture(&self, _path: &Path) -> Option<FileTimestamps> {
            self.events.lock().unwrap().push("capture");
            self.capture_ok.then(fixed_times)
        }

        fn restore(&self, _path: &Path, _times: &FileTimestamps) -> bool {
            self.events.lock().unwrap().push("restore");
            true
        }
    }

    #[derive(Debug)]
    struct StubInfo;

    impl FileInfo for StubInfo {
        fn name(&self) -> &str {
            "report.docx"
        }

        fn size(&self) -> u64 {
            0
        }

        fn is_dir(&self) -> bool {
            false
        }

        fn modified(&self) -> Option<SystemTime> {
            None
        }
    }

    struct StubFile {
        events: Events,
        fail_close: bool,
    }

    impl Read for StubFile {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for StubFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for StubFile {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    impl FileHandle for StubFile {
        fn stat(&self) -> io::Result<Box<dyn FileInfo>> {
            Ok(Box::new(StubInfo))
        }

        fn read_dir(&mut self, _max_entries: usize) -> io::Result<Vec<Box<dyn FileInfo>>> {
            Ok(vec![Box::new(StubInfo), Box::new(StubInfo)])
        }

        fn close(&mut self) -> io::Result<()> {
            self.events.lock().unwrap().push("close");
            if self.fail_close {
                Err(io::Error::other("close failed"))
            } else {
                Ok(())
            }
        }
    }

    struct StubFs {
        events: Events,
        fail_open: bool,
        fail_close: bool,
    }

    impl FileSystem for StubFs {
        type File = StubFile;

        fn resolve(&self, name: &str) -> io::Result<PathBuf> {
            Ok(PathBuf::from("/stub").join(name))
        }

        fn open_file(&self, _name: &str, _flags: OpenFlags, _perm: u32) -> io::Result<StubFile> {
            self.events.lock().unwrap().push("open");
            if self.fail_open {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(StubFile {
                events: Arc::clone(&self.events),
                fail_close: self.fail_close,
            })
        }

        fn stat(&self, _name: &str) -> io::Result<Box<dyn FileInfo>> {
            Ok(Box::new(StubInfo))
        }
    }

    struct Fixture {
        events: Events,
        dir: GuardedDirectory<StubFs>,
    }

    fn fixture(capture_ok: bool, fail_open: bool, fail_close: bool) -> Fixture {
        let events: Events = Arc::default();
        let fs = StubFs {
            events: Arc::clone(&events),
            fail_open,
            fail_close,
        };
        let store = StubStore {
            events: Arc::clone(&events),
            capture_ok,
        };
        Fixture {
            dir: GuardedDirectory::new(fs).with_store(Arc::new(store)),
            events,
        }
    }

    impl Fixture {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    #[test]
    fn capture_precedes_open_and_close_precedes_restore() {
        let fx = fixture(true, false, false);
        let mut file = GuardedFile::open(&fx.dir, "a.txt", OpenFlags::overwrite(), 0o644)
            .expect("open");
        file.close().expect("close");

        assert_eq!(fx.events(), vec!["capture", "open", "close", "restore"]);
    }

    #[test]
    fn read_only_open_never_restores() {
        let fx = fixture(true, false, false);
        let mut file =
            GuardedFile::open(&fx.dir, "a.txt", OpenFlags::read_only(), 0).expect("open");
        assert!(file.captured().expect("captured").capture_succeeded());
        file.close().expect("close");

        assert_eq!(fx.events(), vec!["capture", "open", "close"]);
    }

    #[test]
    fn failed_capture_disables_restore() {
        let fx = fixture(false, false, false);
        let mut file = GuardedFile::open(&fx.dir, "new.txt", OpenFlags::overwrite(), 0o644)
            .expect("open");
        assert!(!file.captured().expect("captured").should_restore());
        file.close().expect("close");

        assert_eq!(fx.events(), vec!["capture", "open", "close"]);
    }

    #[test]
    fn open_failure_is_propagated_without_restore() {
        let fx = fixture(true, true, false);
        let err = GuardedFile::open(&fx.dir, "a.txt", OpenFlags::overwrite(), 0o644)
            .err()
            .expect("open should fail");

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(fx.events(), vec!["capture", "open"]);
    }

    #[test]
    fn close_error_is_returned_and_restore_still_runs() {
        let fx = fixture(true, false, true);
        let mut file = GuardedFile::open(&fx.dir, "a.txt", OpenFlags::read_write(), 0)
            .expect("open");
        let err = file.close().expect_err("close should fail");

        assert_eq!(err.to_string(), "close failed");
        assert_eq!(fx.events(), vec!["capture", "open", "close", "restore"]);
    }

    #[test]
    fn second_close_does_not_restore_again() {
        let fx = fixture(true, false, false);
        let mut file = GuardedFile::open(&fx.dir, "a.txt", OpenFlags::overwrite(), 0o644)
            .expect("open");
        file.close().expect("close");
        let _ = file.close();
        drop(file);

        let restores = fx.events().iter().filter(|e| **e == "restore").count();
        assert_eq!(restores, 1);
    }

    #[test]
    fn drop_without_close_restores() {
        let fx = fixture(true, false, false);
        let file = GuardedFile::open(&fx.dir, "a.txt", OpenFlags::overwrite(), 0o644)
            .expect("open");
        drop(file);

        assert_eq!(fx.events(), vec!["capture", "open", "close", "restore"]);
    }

    #[test]
    fn handle_stat_and_read_dir_always_use_extension_type() {
        let expected = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
        let fx = fixture(true, false, false);
        assert!(!fx.dir.suppresses_content_sniffing());

        let mut file =
            GuardedFile::open(&fx.dir, "a.txt", OpenFlags::read_only(), 0).expect("open");
        assert_eq!(
            file.stat().expect("stat").content_type().as_deref(),
            Some(expected)
        );
        for info in file.read_dir(0).expect("read_dir") {
            assert_eq!(info.content_type().as_deref(), Some(expected));
        }
        file.close().expect("close");

        let dir = fx.dir.suppress_content_sniffing(MimeTable::new());
        let file = GuardedFile::open(&dir, "a.txt", OpenFlags::read_only(), 0).expect("open");
        assert_eq!(
            file.stat().expect("stat").content_type().as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn restore_is_skipped_unless_policy_allows() {
        let fx = fixture(true, false, false);
        let store = StubStore {
            events: Arc::clone(&fx.events),
            capture_ok: true,
        };

        let read = CapturedState::capture(&store, PathBuf::from("/a"), OpenFlags::read_only());
        assert!(!read.should_restore());
        assert!(!read.restore(&store));

        let write = CapturedState::capture(&store, PathBuf::from("/a"), OpenFlags::overwrite());
        assert!(write.should_restore());
        assert!(write.restore(&store));

        assert_eq!(fx.events(), vec!["capture", "capture", "restore"]);
    }
}
