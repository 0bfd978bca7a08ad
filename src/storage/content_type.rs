//! Content type override
//!
//! Replaces whatever content type a file system would report (or leave to
//! sniffing) with one derived purely from the file's extension.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use crate::storage::filesystem::FileInfo;

/// Reported for names whose extension is missing or unknown.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension to MIME type table.
///
/// Built-in entries come from the `mime_guess` registry. Lookups are
/// case-insensitive and entries added with [`MimeTable::insert`] take
/// precedence.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    custom: HashMap<String, String>,
}

impl MimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `mime` for `extension`. A leading dot is ignored.
    pub fn insert(&mut self, extension: &str, mime: &str) {
        self.custom
            .insert(normalize_extension(extension), mime.to_string());
    }

    /// Returns the registered type for an extension, if any.
    pub fn by_extension(&self, extension: &str) -> Option<&str> {
        let extension = normalize_extension(extension);
        if let Some(mime) = self.custom.get(&extension) {
            return Some(mime.as_str());
        }
        builtin_type(&extension)
    }

    /// Returns the content type for a file name, falling back to
    /// [`FALLBACK_CONTENT_TYPE`].
    pub fn content_type_for(&self, name: &str) -> &str {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension(ext))
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

fn builtin_type(extension: &str) -> Option<&'static str> {
    mime_guess::from_ext(extension).first_raw()
}

/// File info whose content type comes from the extension table, never from
/// the wrapped entry or the file's bytes.
#[derive(Debug)]
pub struct NoSniffInfo {
    inner: Box<dyn FileInfo>,
    table: Arc<MimeTable>,
}

impl NoSniffInfo {
    pub fn new(inner: Box<dyn FileInfo>, table: Arc<MimeTable>) -> Self {
        Self { inner, table }
    }
}

impl FileInfo for NoSniffInfo {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn is_dir(&self) -> bool {
        self.inner.is_dir()
    }

    fn modified(&self) -> Option<SystemTime> {
        self.inner.modified()
    }

    fn content_type(&self) -> Option<String> {
        Some(self.table.content_type_for(self.inner.name()).to_string())
    }
}

/// Wraps `info` when a table is present, otherwise hands it back untouched.
pub fn wrap_info(info: Box<dyn FileInfo>, table: Option<&Arc<MimeTable>>) -> Box<dyn FileInfo> {
    match table {
        Some(table) => Box::new(NoSniffInfo::new(info, Arc::clone(table))),
        None => info,
    }
}
