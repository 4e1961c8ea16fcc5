use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default tracing filter directive when RUST_LOG is unset
    pub fn log_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "info",
            VerbosityLevel::Debug => "debug",
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per diagnostic followed by a summary
    Human,
    /// Full results as JSON
    Json,
    /// Summary counts only
    Summary,
}

/// Lint content documents for malformed markup and missing media
#[derive(Parser, Debug, Clone)]
#[command(name = "content-lint")]
#[command(about = "Check content documents for malformed XML and missing image files")]
#[command(version)]
pub struct Cli {
    /// Path to scan for content files (directory or file)
    #[arg(help = "Directory or file to validate")]
    pub path: PathBuf,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process (e.g., 'cnxml,xml') [default: cnxml]"
    )]
    pub extensions: Option<String>,

    /// Number of files validated concurrently
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of files validated concurrently"
    )]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Per-file validation timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Vec<String> {
        match &self.extensions {
            Some(extensions) => extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec!["cnxml".to_string()],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.path.exists() {
            return Err(format!("Path does not exist: {}", self.path.display()));
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        if self.timeout == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}
