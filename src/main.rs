use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use content_lint::cli::{Cli, OutputFormat, VerbosityLevel};
use content_lint::config::{Config, ConfigManager};
use content_lint::file_discovery::FileDiscovery;
use content_lint::output::Output;
use content_lint::validator::{ValidationConfig, ValidationEngine, ValidationResults};

const EXIT_BLOCKED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());

    match run(cli).await {
        Ok(results) => exit_code(&results),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_logging(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<ValidationResults> {
    cli.validate().map_err(anyhow::Error::msg)?;

    let config = ConfigManager::load_config(&cli)
        .await
        .context("failed to load configuration")?;
    debug!(?config, "effective configuration");

    let discovery = build_discovery(&config)?;
    let engine = ValidationEngine::with_config(ValidationConfig {
        max_concurrent_validations: ConfigManager::get_thread_count(&config),
        validation_timeout: ConfigManager::get_timeout_duration(&config),
    });

    let results = engine
        .validate_path(&cli.path, &discovery)
        .await
        .with_context(|| format!("failed to validate {}", cli.path.display()))?;

    let verbosity = VerbosityLevel::from_flags(config.output.verbose, config.output.quiet);
    let output = Output::new(OutputFormat::from(config.output.format), verbosity);
    print!("{}", output.format_results(&results)?);

    Ok(results)
}

fn build_discovery(config: &Config) -> Result<FileDiscovery> {
    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?
        .with_max_depth(config.files.max_depth);
    Ok(discovery)
}

fn exit_code(results: &ValidationResults) -> ExitCode {
    if results.gate.is_blocked() {
        ExitCode::from(EXIT_BLOCKED)
    } else if results.error_files > 0 {
        ExitCode::from(EXIT_FAILURE)
    } else {
        ExitCode::SUCCESS
    }
}
