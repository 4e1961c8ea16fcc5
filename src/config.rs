use crate::cli::{Cli, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Prefix shared by every environment override
const ENV_PREFIX: &str = "CONTENT_LINT_";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    pub files: FileConfig,
}

/// Validation-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Number of files validated concurrently
    pub threads: Option<usize>,
    /// Per-file validation timeout in seconds
    pub timeout_seconds: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

/// File processing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// File extensions to process
    pub extensions: Vec<String>,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    Human,
    Json,
    Summary,
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
            OutputFormatConfig::Summary => OutputFormat::Summary,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threads: None,
            timeout_seconds: 30,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormatConfig::Human,
            verbose: false,
            quiet: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["cnxml".to_string()],
            include_patterns: vec![],
            exclude_patterns: vec![],
            max_depth: None,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        config = Self::apply_environment_overrides(config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut search_dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join("content-lint"));
        }

        for dir in &search_dirs {
            if let Some(config) = Self::find_config_in(dir).await? {
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// Load the first known configuration file found in `dir`
    pub async fn find_config_in(dir: &Path) -> Result<Option<Config>> {
        let config_names = [
            "content-lint.toml",
            "content-lint.json",
            ".content-lint.toml",
            ".content-lint.json",
        ];

        for name in &config_names {
            let path = dir.join(name);
            if tokio::fs::try_exists(&path).await? {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(threads) = env_parse(env, "THREADS")? {
            config.validation.threads = Some(threads);
        }

        if let Some(timeout) = env_parse(env, "TIMEOUT")? {
            config.validation.timeout_seconds = timeout;
        }

        if let Some(verbose) = env_parse(env, "VERBOSE")? {
            config.output.verbose = verbose;
        }

        if let Some(quiet) = env_parse(env, "QUIET")? {
            config.output.quiet = quiet;
        }

        if let Some(format) = env.get(&format!("{}FORMAT", ENV_PREFIX)) {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormatConfig::Human,
                "json" => OutputFormatConfig::Json,
                "summary" => OutputFormatConfig::Summary,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid {}FORMAT value: {}",
                        ENV_PREFIX, format
                    )));
                }
            };
        }

        if let Some(extensions) = env.get(&format!("{}EXTENSIONS", ENV_PREFIX)) {
            config.files.extensions = split_list(&extensions);
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.threads.is_some() {
            config.validation.threads = cli.threads;
        }
        if let Some(timeout) = cli.timeout {
            config.validation.timeout_seconds = timeout;
        }

        if let Some(format) = cli.output_format {
            config.output.format = format.into();
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        if let Some(extensions) = &cli.extensions {
            config.files.extensions = split_list(extensions);
        }
        if !cli.include_patterns.is_empty() {
            config.files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.files.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.max_depth.is_some() {
            config.files.max_depth = cli.max_depth;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.validation.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.validation.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.files.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one file extension must be specified".to_string(),
            ));
        }

        for ext in &config.files.extensions {
            if ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid file extension: {}",
                    ext
                )));
            }
        }

        Ok(())
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &Config) -> usize {
        config.validation.threads.unwrap_or_else(num_cpus::get)
    }

    /// Convert configuration to Duration for the per-file timeout
    pub fn get_timeout_duration(config: &Config) -> Duration {
        Duration::from_secs(config.validation.timeout_seconds)
    }
}

/// Read `CONTENT_LINT_<name>` and parse it, if set
fn env_parse<T: std::str::FromStr>(env: &impl EnvProvider, name: &str) -> Result<Option<T>> {
    let key = format!("{}{}", ENV_PREFIX, name);
    match env.get(&key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value))),
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
