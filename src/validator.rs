//! Async Validation Engine
//!
//! Runs the validation passes over content files:
//! - **Per document**: parse once, then report malformed markup and missing media
//! - **Concurrent orchestration**: tokio::spawn creates one task per file
//! - **Bounded concurrency**: a Semaphore caps how many files are in flight
//! - **Result aggregation**: futures::try_join_all collects results in input order
//!
//! Each pass is a pure function of the document text, its location and the
//! filesystem at call time. The engine holds no per-document state, so
//! overlapping passes over the same file are independent.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diagnostics::Diagnostic;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::file_discovery::FileDiscovery;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::gate::{GateDecision, PublishGate};
use crate::image_paths::validate_image_paths;
use crate::markup::syntax_error_diagnostic;
use crate::parser::try_parse;

/// Validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Number of files validated concurrently
    pub max_concurrent_validations: usize,
    /// Timeout for validating a single file
    pub validation_timeout: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_validations: num_cpus::get(),
            validation_timeout: Duration::from_secs(30),
        }
    }
}

/// Status of a single file validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValidationStatus {
    /// No diagnostics
    Clean,
    /// At least one diagnostic was reported
    Problems { count: usize },
    /// The file could not be validated at all
    Error { message: String },
}

impl ValidationStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, ValidationStatus::Clean)
    }

    pub fn has_problems(&self) -> bool {
        matches!(self, ValidationStatus::Problems { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationStatus::Error { .. })
    }
}

/// Result of validating a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationResult {
    /// Path to the validated file
    pub path: PathBuf,
    pub status: ValidationStatus,
    /// Diagnostics in document order
    pub diagnostics: Vec<Diagnostic>,
    pub duration: Duration,
}

impl FileValidationResult {
    /// Create a result from the diagnostics of a completed pass
    pub fn from_diagnostics(path: PathBuf, diagnostics: Vec<Diagnostic>, duration: Duration) -> Self {
        let status = if diagnostics.is_empty() {
            ValidationStatus::Clean
        } else {
            ValidationStatus::Problems {
                count: diagnostics.len(),
            }
        };

        Self {
            path,
            status,
            diagnostics,
            duration,
        }
    }

    /// Create a result for a file that could not be validated
    pub fn error(path: PathBuf, error: Error, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Error {
                message: error.to_string(),
            },
            diagnostics: Vec::new(),
            duration,
        }
    }
}

/// Aggregated results of validating multiple files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub total_files: usize,
    pub clean_files: usize,
    pub problem_files: usize,
    pub error_files: usize,
    /// Number of diagnostics across all files
    pub total_diagnostics: usize,
    /// Publish decision over every diagnostic reported
    pub gate: GateDecision,
    pub total_duration: Duration,
    pub file_results: Vec<FileValidationResult>,
}

impl ValidationResults {
    /// Aggregate individual file results into summary
    pub fn aggregate(file_results: Vec<FileValidationResult>, total_duration: Duration) -> Self {
        let mut clean_files = 0;
        let mut problem_files = 0;
        let mut error_files = 0;

        for result in &file_results {
            match result.status {
                ValidationStatus::Clean => clean_files += 1,
                ValidationStatus::Problems { .. } => problem_files += 1,
                ValidationStatus::Error { .. } => error_files += 1,
            }
        }

        let diagnostics: Vec<Diagnostic> = file_results
            .iter()
            .flat_map(|result| result.diagnostics.iter().cloned())
            .collect();

        Self {
            total_files: file_results.len(),
            clean_files,
            problem_files,
            error_files,
            total_diagnostics: diagnostics.len(),
            gate: PublishGate::new().evaluate(&diagnostics),
            total_duration,
            file_results,
        }
    }

    /// Check if every file validated without diagnostics
    pub fn all_clean(&self) -> bool {
        self.clean_files == self.total_files && self.total_files > 0
    }

    /// Check if any file had diagnostics or failed to validate
    pub fn has_problems(&self) -> bool {
        self.problem_files > 0 || self.error_files > 0
    }
}

/// Validation engine for content documents
pub struct ValidationEngine {
    fs: Arc<dyn FileSystem>,
    config: ValidationConfig,
}

impl ValidationEngine {
    pub fn new(fs: Arc<dyn FileSystem>, config: ValidationConfig) -> Self {
        Self { fs, config }
    }

    /// Engine backed by the real filesystem
    pub fn with_config(config: ValidationConfig) -> Self {
        Self::new(Arc::new(TokioFileSystem), config)
    }

    /// Run every validation pass over one document.
    ///
    /// Markup diagnostics come first (at most one), then image-path
    /// diagnostics. A document that does not parse gets no image checks.
    pub async fn validate_document(&self, document: &Document) -> Vec<Diagnostic> {
        Self::validate_document_with(self.fs.as_ref(), document).await
    }

    async fn validate_document_with(fs: &dyn FileSystem, document: &Document) -> Vec<Diagnostic> {
        match try_parse(document.text()) {
            Ok(tree) => validate_image_paths(document, Some(&tree), fs).await,
            Err(err) => {
                debug!(
                    document = %document.location().display(),
                    error = %err,
                    "skipping image checks for malformed document"
                );
                vec![syntax_error_diagnostic(document, &err)]
            }
        }
    }

    /// Validate XML files at a path (directory or file)
    pub async fn validate_path(
        &self,
        path: &Path,
        file_discovery: &FileDiscovery,
    ) -> Result<ValidationResults> {
        let start = Instant::now();

        let files = file_discovery.discover_files(path).await?;
        info!(path = %path.display(), files = files.len(), "discovered content files");

        let results = self.validate_files(files).await?;
        Ok(ValidationResults::aggregate(results, start.elapsed()))
    }

    /// Validate a list of files using concurrent async operations
    pub async fn validate_files(&self, files: Vec<PathBuf>) -> Result<Vec<FileValidationResult>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        // Create a semaphore to limit concurrent validations
        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_validations,
        ));

        let validation_tasks: Vec<_> = files
            .into_iter()
            .map(|file_path| {
                let fs = Arc::clone(&self.fs);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.config.validation_timeout;

                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| Error::Concurrency {
                        details: "Failed to acquire validation semaphore".to_string(),
                    })?;

                    let result = tokio::time::timeout(
                        timeout,
                        Self::validate_single_file_internal(file_path.clone(), fs),
                    )
                    .await;

                    let validation_result = match result {
                        Ok(validation_result) => validation_result,
                        Err(_) => FileValidationResult::error(
                            file_path.clone(),
                            Error::Timeout {
                                path: file_path,
                                timeout,
                            },
                            timeout,
                        ),
                    };

                    Ok::<FileValidationResult, Error>(validation_result)
                })
            })
            .collect();

        let task_results = try_join_all(validation_tasks)
            .await
            .map_err(|e| Error::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        task_results.into_iter().collect()
    }

    async fn validate_single_file_internal(
        file_path: PathBuf,
        fs: Arc<dyn FileSystem>,
    ) -> FileValidationResult {
        let start_time = Instant::now();

        let document = match Document::load(&file_path).await {
            Ok(document) => document,
            Err(e) => return FileValidationResult::error(file_path, e, start_time.elapsed()),
        };

        let diagnostics = Self::validate_document_with(fs.as_ref(), &document).await;
        debug!(
            path = %file_path.display(),
            diagnostics = diagnostics.len(),
            "validated file"
        );

        FileValidationResult::from_diagnostics(file_path, diagnostics, start_time.elapsed())
    }

    /// Validate a single file (public interface)
    pub async fn validate_single_file(&self, file_path: &Path) -> Result<FileValidationResult> {
        let result =
            Self::validate_single_file_internal(file_path.to_path_buf(), Arc::clone(&self.fs))
                .await;

        Ok(result)
    }

    /// Get the validation configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}
