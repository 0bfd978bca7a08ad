//! Guarded directory
//!
//! Decorates a [`FileSystem`] root so that every opened file is a
//! [`GuardedFile`]. Open handles always report extension-derived content
//! types; directory stats do so only when sniffing is suppressed.

use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::storage::content_type::{MimeTable, wrap_info};
use crate::storage::filesystem::{FileInfo, FileSystem};
use crate::storage::flags::OpenFlags;
use crate::storage::guarded_file::GuardedFile;
use crate::storage::local::LocalDir;
use crate::storage::timestamps::{HostTimestampStore, TimestampStore};

pub struct GuardedDirectory<F> {
    inner: F,
    store: Arc<dyn TimestampStore>,
    content_types: Arc<MimeTable>,
    no_sniff: bool,
}

impl<F: FileSystem> GuardedDirectory<F> {
    /// Guards `inner` with the host timestamp store and the default MIME
    /// table. Directory stats keep their native content types.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            store: Arc::new(HostTimestampStore),
            content_types: Arc::new(MimeTable::new()),
            no_sniff: false,
        }
    }

    /// Replaces the timestamp store.
    pub fn with_store(mut self, store: Arc<dyn TimestampStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the MIME table used for content types.
    pub fn with_mime_table(mut self, table: MimeTable) -> Self {
        self.content_types = Arc::new(table);
        self
    }

    /// Makes directory stats report content types from `table` too, instead
    /// of letting them be sniffed.
    pub fn suppress_content_sniffing(mut self, table: MimeTable) -> Self {
        self.no_sniff = true;
        self.with_mime_table(table)
    }

    pub fn suppresses_content_sniffing(&self) -> bool {
        self.no_sniff
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub(crate) fn store(&self) -> &Arc<dyn TimestampStore> {
        &self.store
    }

    pub(crate) fn content_types(&self) -> &Arc<MimeTable> {
        &self.content_types
    }
}

impl GuardedDirectory<LocalDir> {
    /// Builds a guarded host directory from configuration.
    pub fn from_config(config: &GuardConfig) -> Result<Self, GuardError> {
        let local = LocalDir::open_root(&config.root)?;
        let mut dir = Self::new(local).with_mime_table(config.mime_table());
        dir.no_sniff = config.suppress_content_sniffing;

        info!(
            "Guarding {} (content sniffing suppressed: {})",
            dir.inner().root().display(),
            dir.suppresses_content_sniffing()
        );
        Ok(dir)
    }
}

impl<F: FileSystem> FileSystem for GuardedDirectory<F> {
    type File = GuardedFile<F::File>;

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        self.inner.resolve(name)
    }

    fn open_file(&self, name: &str, flags: OpenFlags, perm: u32) -> io::Result<Self::File> {
        GuardedFile::open(self, name, flags, perm)
    }

    fn stat(&self, name: &str) -> io::Result<Box<dyn FileInfo>> {
        let info = self.inner.stat(name)?;
        Ok(wrap_info(info, self.no_sniff.then_some(&self.content_types)))
    }
}
