use crate::config::ConfigError;
use crate::error::{Error, Result};
use globset::{GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Async discovery of content files under a file or directory
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["cnxml"])
    extensions: Vec<String>,
    /// Include patterns set
    include_set: Option<GlobSet>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
    /// Maximum depth for directory traversal (None = unlimited)
    max_depth: Option<usize>,
    /// Follow symbolic links
    follow_symlinks: bool,
}

impl FileDiscovery {
    /// Create a new FileDiscovery instance
    pub fn new() -> Self {
        Self {
            extensions: vec!["cnxml".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        self
    }

    /// Add include patterns
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns)?;
        Ok(self)
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns)?;
        Ok(self)
    }

    /// Set maximum traversal depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Discover files asynchronously in the given path (file or directory).
    ///
    /// The result is sorted so repeated runs report files in the same order.
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await?;

        if metadata.is_file() {
            if self.should_process(path) {
                return Ok(vec![path.to_path_buf()]);
            } else {
                return Ok(Vec::new());
            }
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(path).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let entry_path = entry.path();

            if entry_path.is_symlink() && !self.follow_symlinks {
                continue;
            }

            if let Err(e) = self
                .discover_files_recursive(&entry_path, 0, &mut files)
                .await
            {
                // Keep going with the remaining entries
                warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
            }
        }

        files.sort();
        Ok(files)
    }

    /// Recursive helper for discovering files
    fn discover_files_recursive<'a>(
        &'a self,
        path: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(max_depth) = self.max_depth
                && depth > max_depth
            {
                return Ok(());
            }

            let metadata = fs::metadata(path)
                .await
                .map_err(|e| Error::FileSystemTraversal {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;

            if metadata.is_file() {
                if self.should_process(path) {
                    files.push(path.to_path_buf());
                }
            } else if metadata.is_dir() {
                // Only recurse into directories if we can still go deeper
                if let Some(max_depth) = self.max_depth
                    && depth >= max_depth
                {
                    return Ok(());
                }

                let mut read_dir =
                    fs::read_dir(path)
                        .await
                        .map_err(|e| Error::FileSystemTraversal {
                            path: path.to_path_buf(),
                            reason: e.to_string(),
                        })?;

                while let Some(entry) = read_dir.next_entry().await? {
                    let entry_path = entry.path();

                    if entry_path.is_symlink() && !self.follow_symlinks {
                        continue;
                    }

                    if let Err(e) = self
                        .discover_files_recursive(&entry_path, depth + 1, files)
                        .await
                    {
                        warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                    }
                }
            }

            Ok(())
        })
    }

    /// Check if a file should be processed based on extensions and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        // Check exclude patterns first
        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        // Check include patterns (if any are specified, at least one must match)
        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                ConfigError::Validation(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("Failed to build glob set: {}", e)))?;
    Ok(Some(set))
}
