//! # content-lint Library
//!
//! Validation passes for structured content documents. A tolerant XML parser
//! turns document text into a tree (or nothing, when the markup is broken),
//! and the image-path pass reports every `<image src>` that points at a file
//! missing from disk, positioned on the offending path text.
//!
//! Each pass is a function of the document text, its location and the
//! filesystem at call time. The [`ValidationEngine`] runs the passes over many
//! files concurrently and the [`PublishGate`] turns the diagnostics into a
//! publish decision.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod file_discovery;
pub mod fs;
pub mod gate;
pub mod image_paths;
pub mod markup;
pub mod output;
pub mod parser;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use diagnostics::{Diagnostic, DiagnosticSource, Position, Range, Severity};
pub use document::{Document, LineIndex};
pub use error::{Error, Result};
pub use file_discovery::FileDiscovery;
pub use fs::{FileSystem, TokioFileSystem};
pub use gate::{GateDecision, PublishGate};
pub use image_paths::{CandidateReference, collect_candidates, validate_image_paths};
pub use markup::validate_markup;
pub use output::Output;
pub use parser::{Attribute, Element, Node, SyntaxError, XmlDocument, parse, try_parse};
pub use validator::{
    FileValidationResult, ValidationConfig, ValidationEngine, ValidationResults, ValidationStatus,
};
