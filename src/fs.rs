//! Read-only filesystem access used to resolve media references.

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Existence checks against a filesystem.
///
/// The validator only ever asks whether a path exists; it never reads,
/// creates or modifies files. Tests inject their own implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists. An `Err` means the answer could not be determined.
    async fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// The real filesystem, queried through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }
}
