//! Error types
//!
//! Domain errors for storage setup and path handling. File operations on the
//! guarded file system itself speak `std::io::Error`, so storage errors can be
//! folded into one.

use std::io;

/// Storage module errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Root directory not found: {0}")]
    RootNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<StorageError> for io::Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(e) => e,
            StorageError::InvalidPath(_) => io::Error::new(io::ErrorKind::InvalidInput, error),
            StorageError::RootNotFound(_) => io::Error::new(io::ErrorKind::NotFound, error),
            StorageError::NotADirectory(_) => io::Error::other(error),
        }
    }
}

/// Errors raised while building a guarded file system from configuration
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
