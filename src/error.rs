//! Error taxonomy shared by the sorting and undo engines.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while sorting, undoing, or configuring.
#[derive(Debug, Error)]
pub enum SortError {
    /// The target directory is missing or cannot be accessed.
    #[error("Invalid target directory {}: {source}", path.display())]
    InvalidTargetDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a category or quarantine directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", source_path.display(), destination.display())]
    FileMoveFailure {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },

    /// The path cannot be written to the action log, so the file is left in place.
    #[error("Path {} is not valid UTF-8 and cannot be recorded for undo", path.display())]
    NonUtf8Path { path: PathBuf },

    /// The file could not be read for hashing.
    #[error("Failed to hash {}: {source}", path.display())]
    DigestFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file exists but could not be read.
    #[error("Failed to read configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid.
    #[error("Invalid configuration {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    /// Configuration file could not be written.
    #[error("Failed to write configuration {}: {source}", path.display())]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An exclusion glob could not be compiled.
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Failed to append to or delete the action log.
    #[error("Failed to write action log {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open or read the action log.
    #[error("Failed to read action log {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A single action log line could not be parsed.
    #[error("Corrupt action log line {line}: {reason}")]
    LogCorruption { line: usize, reason: String },
}

/// Result type for engine operations.
pub type SortResult<T> = Result<T, SortError>;
