use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use content_lint::FileSystem;

/// In-memory filesystem that records every existence query
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<Mutex<HashSet<PathBuf>>>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
    queries: Arc<Mutex<Vec<PathBuf>>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fs = Self::new();
        for path in paths {
            fs.add_file(path);
        }
        fs
    }

    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.files.lock().unwrap().insert(path.into());
    }

    pub fn remove_file(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    /// Make existence checks for `path` fail with an I/O error
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(path.into());
    }

    pub fn queries(&self) -> Vec<PathBuf> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        self.queries.lock().unwrap().push(path.to_path_buf());

        if self.failing.lock().unwrap().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }

        Ok(self.files.lock().unwrap().contains(path))
    }
}
