mod context;

pub use context::ErrorContext;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SemaphoreError {
    #[error("Invalid resource identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Cannot open lock file {}: {source}", .path.display())]
    LockFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Concurrent request blocked for resource '{resource}'")]
    ConcurrentRequestBlocked { resource: String },

    #[error("Concurrent request for resource '{resource}' timed out after {waited_secs:.3}s")]
    ConcurrentRequestTimeout { resource: String, waited_secs: f64 },

    #[error("Could not unlock resource lock for '{resource}': {details}")]
    UnlockFailed { resource: String, details: String },

    #[error("Lock directory is not writable: {0}")]
    DirectoryNotWritable(String),

    #[error("Lock directory is not readable: {0}")]
    DirectoryNotReadable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SemaphoreError {
    /// True for failures caused by another holder of the same resource.
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            SemaphoreError::ConcurrentRequestBlocked { .. }
                | SemaphoreError::ConcurrentRequestTimeout { .. }
        )
    }

    /// True for failures that retrying will not fix without changing setup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SemaphoreError::InvalidIdentifier(_)
                | SemaphoreError::DirectoryNotWritable(_)
                | SemaphoreError::DirectoryNotReadable(_)
                | SemaphoreError::ConfigError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SemaphoreError>;
