//! Output and Reporting
//!
//! Renders validation results as compiler-style lines, JSON, or a bare summary.

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::diagnostics::Diagnostic;
use crate::gate::GateDecision;
use crate::validator::{FileValidationResult, ValidationResults, ValidationStatus};

/// Output formatter for validation results
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Force colors on or off regardless of the terminal
    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, results: &ValidationResults) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Json => {
                let mut output = serde_json::to_string_pretty(results)?;
                output.push('\n');
                Ok(output)
            }
            OutputFormat::Summary => Ok(self.format_summary(results)),
            OutputFormat::Human => Ok(self.format_human(results)),
        }
    }

    fn format_human(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        for file_result in &results.file_results {
            output.push_str(&self.format_file_result(file_result));
        }

        if self.verbosity > VerbosityLevel::Quiet {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&self.format_summary(results));
        }

        output
    }

    /// Lines for one file; empty for a clean file unless verbose
    pub fn format_file_result(&self, result: &FileValidationResult) -> String {
        let path_display = result.path.display();
        let mut output = String::new();

        match &result.status {
            ValidationStatus::Clean => {
                if self.verbosity >= VerbosityLevel::Verbose {
                    output.push_str(&format!(
                        "{}  {} ({})\n",
                        self.colorize("✓ CLEAN", "32"),
                        path_display,
                        format_duration(result.duration)
                    ));
                }
            }
            ValidationStatus::Problems { .. } => {
                for diagnostic in &result.diagnostics {
                    output.push_str(&format!(
                        "{}: {}\n",
                        path_display,
                        self.format_diagnostic(diagnostic)
                    ));
                }
            }
            ValidationStatus::Error { message } => {
                output.push_str(&format!(
                    "{}: {} {}\n",
                    path_display,
                    self.colorize("failed:", "33"),
                    message
                ));
            }
        }

        output
    }

    /// `line:column: severity[source] message`, with 1-based line and column
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let start = diagnostic.range.start;
        let label = format!("{}[{}]", diagnostic.severity, diagnostic.source);
        format!(
            "{}:{}: {} {}",
            start.line + 1,
            start.column + 1,
            self.colorize(&label, "31"),
            diagnostic.message
        )
    }

    fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Clean:", "32"),
            results.clean_files
        ));

        if results.problem_files > 0 {
            output.push_str(&format!(
                "  {} {} ({} diagnostic{})\n",
                self.colorize("With problems:", "31"),
                results.problem_files,
                results.total_diagnostics,
                if results.total_diagnostics == 1 { "" } else { "s" }
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.error_files
            ));
        }

        output.push_str(&format!("  Publish: {}\n", self.format_gate(results.gate)));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.total_duration)
        ));

        output
    }

    fn format_gate(&self, gate: GateDecision) -> String {
        match gate {
            GateDecision::Clear => self.colorize("clear", "32"),
            GateDecision::Confirm => self.colorize("needs confirmation", "33"),
            GateDecision::Blocked => self.colorize("blocked", "31"),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
