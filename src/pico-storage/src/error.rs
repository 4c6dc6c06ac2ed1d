//! Error types for pico-storage.

use std::path::PathBuf;
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The active config is not a JSON document.
    #[error("Config is not valid JSON: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The shared-group identity cannot name a directory.
    #[error("Invalid shared group identity: {0:?}")]
    InvalidGroup(String),

    /// The platform did not provide a base directory for shared containers.
    #[error("Could not determine the shared container base directory")]
    ContainerUnavailable,

    /// The shared root exists on paper but cannot be created or used.
    #[error("Shared root {path} is unavailable: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic replace of a file failed.
    #[error("Atomic write failed for {path}: {reason}")]
    AtomicWriteFailed { path: PathBuf, reason: String },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
