//! Error types for wordindex.
//!
//! Every fallible library operation returns [`IndexResult`]. Most failures in
//! the pipelines are *local*: an unreadable file or sub-directory is logged
//! and skipped by the builder, so only the errors that stop a whole operation
//! ever surface here.
//!
//! ```rust,ignore
//! match builder.build(root) {
//!     Ok(()) => // index is complete,
//!     Err(IndexError::FileNotFound(path)) => // root is missing,
//!     Err(IndexError::PermissionDenied(path)) => // root is unreadable,
//!     Err(e) => // anything else
//! }
//! ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while building, searching or dumping an index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a directory or text file: {0}")]
    NotADirectory(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError { path: PathBuf, source: io::Error },
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(io::Error),
}

impl IndexError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Attaches `path` to an I/O error when its kind says which file was at fault.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            io::ErrorKind::InvalidData => Self::encoding_error(path, err),
            _ => Self::IoError(err),
        }
    }
}
