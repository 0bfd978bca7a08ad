//! Open flags
//!
//! Describes how a file is being opened and whether that open may mutate it.

use std::fs::OpenOptions;

/// The set of flags supplied when a file is opened.
///
/// Mirrors the access and creation modes of `std::fs::OpenOptions` so that the
/// protocol layer can pass them through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
}

impl OpenFlags {
    /// Plain read-only open.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Read-write open of an existing file.
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Self::default()
        }
    }

    /// Write-only open that creates the file if missing and truncates it otherwise.
    pub fn overwrite() -> Self {
        Self {
            write: true,
            create: true,
            truncate: true,
            ..Self::default()
        }
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    /// Returns true if the open may change the file's content or metadata.
    ///
    /// Write, read-write, create, truncate and append all count; a plain read
    /// never does.
    pub fn is_write_intent(&self) -> bool {
        self.write || self.append || self.truncate || self.create || self.create_new
    }

    /// Builds the `std::fs::OpenOptions` equivalent of these flags.
    ///
    /// An open without any access mode defaults to read, the same as `O_RDONLY`.
    pub fn to_open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        let has_access_mode = self.read || self.write || self.append;
        options
            .read(self.read || !has_access_mode)
            .write(self.write)
            .append(self.append)
            .truncate(self.truncate)
            .create(self.create)
            .create_new(self.create_new);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_is_not_write_intent() {
        assert!(!OpenFlags::read_only().is_write_intent());
        assert!(!OpenFlags::default().is_write_intent());
    }

    #[test]
    fn every_mutating_flag_is_write_intent() {
        let base = OpenFlags::read_only();
        assert!(base.write(true).is_write_intent());
        assert!(base.append(true).is_write_intent());
        assert!(base.truncate(true).is_write_intent());
        assert!(base.create(true).is_write_intent());
        assert!(base.create_new(true).is_write_intent());
        assert!(OpenFlags::read_write().is_write_intent());
        assert!(OpenFlags::overwrite().is_write_intent());
    }
}
