//! CLI module for throwgen
//!
//! ## Commands
//!
//! - `rewrite <file|dir>` - Stub every marked declaration (prints by default, `--write` to save, `--check` for CI)
//! - `list <file|dir>` - Show marked declarations without rewriting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::{EmitMode, RewriteConfig};
use crate::version::THROWGEN_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Stub marked Rust declarations with a diverging error call
#[derive(Parser, Debug)]
#[command(name = "throwgen")]
#[command(version = THROWGEN_VERSION)]
#[command(about = "Stub marked Rust declarations with a diverging error call", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite marked declarations
    Rewrite {
        /// File or directory to rewrite
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Write the result back instead of printing it
        #[arg(long, conflicts_with = "check")]
        write: bool,
        /// Exit with an error if any file would be rewritten
        #[arg(long)]
        check: bool,
        /// Re-render rewritten files with prettyplease instead of editing them in place
        #[arg(long)]
        pretty: bool,
        /// Leave the marker attribute on rewritten declarations
        #[arg(long)]
        keep_markers: bool,
        #[command(flatten)]
        names: NameArgs,
    },

    /// List marked declarations
    List {
        /// File or directory to scan
        #[arg(value_name = "PATH", default_value = ".")]
        path: PathBuf,
        /// Marker attribute name
        #[arg(long, value_name = "NAME")]
        marker: Option<String>,
    },
}

/// Overrides for the names the rewriter uses.
#[derive(Args, Debug, Default)]
pub struct NameArgs {
    /// Marker attribute name
    #[arg(long, value_name = "NAME")]
    pub marker: Option<String>,
    /// Path of the helper type that raises errors
    #[arg(long, value_name = "PATH")]
    pub helper: Option<String>,
    /// Name of the helper's diverging operation
    #[arg(long = "helper-op", value_name = "NAME")]
    pub helper_op: Option<String>,
    /// Associated item used for class-literal arguments
    #[arg(long = "class-marker", value_name = "NAME")]
    pub class_marker: Option<String>,
    /// Error type used when a marker names none
    #[arg(long = "error", value_name = "PATH")]
    pub default_error: Option<String>,
}

impl NameArgs {
    /// Layer the overrides on top of `config`.
    pub fn apply(self, mut config: RewriteConfig) -> RewriteConfig {
        if let Some(marker) = self.marker {
            config = config.with_marker(marker);
        }
        if self.helper.is_some() || self.helper_op.is_some() {
            let module = self.helper.unwrap_or(config.helper_module.clone());
            let operation = self.helper_op.unwrap_or(config.helper_operation.clone());
            config = config.with_helper(module, operation);
        }
        if let Some(class_marker) = self.class_marker {
            config = config.with_class_marker(class_marker);
        }
        if let Some(error) = self.default_error {
            config = config.with_default_error(error);
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Rewrite {
            path,
            write,
            check,
            pretty,
            keep_markers,
            names,
        } => {
            let config = names
                .apply(RewriteConfig::new())
                .with_strip_markers(!keep_markers)
                .with_emit(if pretty { EmitMode::Pretty } else { EmitMode::Splice });
            let mode = if check {
                commands::OutputMode::Check
            } else if write {
                commands::OutputMode::Write
            } else {
                commands::OutputMode::Print
            };
            commands::rewrite_files(&path, &config, mode)
        }
        Command::List { path, marker } => {
            let mut config = RewriteConfig::new();
            if let Some(marker) = marker {
                config = config.with_marker(marker);
            }
            commands::list_markers(&path, &config)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
