use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Main application error type that encompasses all possible failure modes
///
/// The validation passes themselves never produce one of these: malformed
/// markup and missing media are reported as diagnostics. These errors cover
/// the surrounding work of reading files, walking directories and loading
/// configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document location has no parent directory: {path}")]
    InvalidLocation { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },

    #[error("Validation timeout: {path} after {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
