//! Local file system
//!
//! A [`FileSystem`] rooted at a host directory, built on `std::fs`.

use log::info;
use std::fs::{self, File, Metadata, ReadDir};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::StorageError;
use crate::storage::filesystem::{FileHandle, FileInfo, FileSystem};
use crate::storage::flags::OpenFlags;
use crate::storage::validation::resolve_under_root;

/// Metadata of a host file or directory.
#[derive(Debug)]
pub struct LocalFileInfo {
    name: String,
    metadata: Metadata,
}

impl LocalFileInfo {
    pub fn new(name: String, metadata: Metadata) -> Self {
        Self { name, metadata }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl FileInfo for LocalFileInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        if self.metadata.is_dir() {
            0
        } else {
            self.metadata.len()
        }
    }

    fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    fn modified(&self) -> Option<SystemTime> {
        self.metadata.modified().ok()
    }
}

/// Directory on the host that serves as a file system root.
#[derive(Debug, Clone)]
pub struct LocalDir {
    root: PathBuf,
}

impl LocalDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Canonicalizes `root` and checks that it is an existing directory.
    pub fn open_root(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|_| StorageError::RootNotFound(root.display().to_string()))?;
        if !canonical.is_dir() {
            return Err(StorageError::NotADirectory(canonical.display().to_string()));
        }

        info!("Serving files from {}", canonical.display());
        Ok(Self::new(canonical))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for LocalDir {
    type File = LocalFile;

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        Ok(resolve_under_root(&self.root, name)?)
    }

    fn open_file(&self, name: &str, flags: OpenFlags, perm: u32) -> io::Result<LocalFile> {
        let path = self.resolve(name)?;
        let mut options = flags.to_open_options();

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(perm);
        }
        #[cfg(not(unix))]
        let _ = perm;

        let file = options.open(&path)?;
        Ok(LocalFile::new(file, path))
    }

    fn stat(&self, name: &str) -> io::Result<Box<dyn FileInfo>> {
        let path = self.resolve(name)?;
        let metadata = fs::metadata(&path)?;
        Ok(Box::new(LocalFileInfo::new(entry_name(&path), metadata)))
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string())
}

fn closed_error() -> io::Error {
    io::Error::other("file already closed")
}

/// Open handle on a host file or directory.
#[derive(Debug)]
pub struct LocalFile {
    file: Option<File>,
    path: PathBuf,
    entries: Option<ReadDir>,
}

impl LocalFile {
    fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Some(file),
            path,
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> io::Result<&File> {
        self.file.as_ref().ok_or_else(closed_error)
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file_mut()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file_mut()?.flush()
    }
}

impl Seek for LocalFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file_mut()?.seek(pos)
    }
}

impl FileHandle for LocalFile {
    fn stat(&self) -> io::Result<Box<dyn FileInfo>> {
        let metadata = self.file()?.metadata()?;
        Ok(Box::new(LocalFileInfo::new(entry_name(&self.path), metadata)))
    }

    fn read_dir(&mut self, max_entries: usize) -> io::Result<Vec<Box<dyn FileInfo>>> {
        self.file()?;
        if self.entries.is_none() {
            self.entries = Some(fs::read_dir(&self.path)?);
        }
        let Some(entries) = self.entries.as_mut() else {
            return Ok(Vec::new());
        };

        let mut infos: Vec<Box<dyn FileInfo>> = Vec::new();
        for entry in entries.by_ref() {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks the same way `LocalDir::stat` does
            let metadata = fs::metadata(entry.path())?;
            infos.push(Box::new(LocalFileInfo::new(name, metadata)));
            if max_entries > 0 && infos.len() == max_entries {
                break;
            }
        }
        Ok(infos)
    }

    fn close(&mut self) -> io::Result<()> {
        self.entries = None;
        match self.file.take() {
            Some(file) => {
                drop(file);
                Ok(())
            }
            None => Err(closed_error()),
        }
    }
}
