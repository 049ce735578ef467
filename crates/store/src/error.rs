use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Corrupted registry at '{path}': {source}")]
    CorruptedRegistry {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unable to write registry '{path}': {source}")]
    RegistryWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Registry '{0}' was modified by another process")]
    ConcurrentModification(PathBuf),

    #[error("Invalid package: {reason}")]
    InvalidPackage { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO operation '{operation}' failed on path '{path}': {source}")]
    IoOperation {
        operation: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    pub fn io_operation(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        InstallerError::IoOperation {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Failures of the registry write step. These fall under the write policy
    /// instead of aborting the package operation outright.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            InstallerError::RegistryWrite { .. } | InstallerError::ConcurrentModification(_)
        )
    }
}
