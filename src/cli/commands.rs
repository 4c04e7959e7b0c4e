//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RewriteConfig;
use crate::discovery;
use crate::driver::{self, Transformed};
use crate::errors::RewriteError;

use super::{CliError, CliResult, ExitCode};

/// Maximum source file size (100 MB)
///
/// Files larger than this are rejected to prevent out-of-memory conditions
/// while parsing.
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// What `rewrite` does with a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Print the rewritten source to stdout
    Print,
    /// Save the rewritten source over the original
    Write,
    /// Only report which files would change
    Check,
}

/// Read source file contents.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_SOURCE_SIZE` (100 MB)
pub fn read_source(file_path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(file_path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", file_path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            file_path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(file_path)
        .map_err(|e| CliError::failure(format!("Error reading file '{}': {}", file_path.display(), e)))
}

/// Rewrite marked declarations in every `.rs` file under `path`.
pub fn rewrite_files(path: &Path, config: &RewriteConfig, mode: OutputMode) -> CliResult<ExitCode> {
    let files = collect_rs_files(path);
    if files.is_empty() {
        return Err(CliError::failure("No .rs files found"));
    }

    let mut changed_files = 0;
    let mut rewritten = 0;
    let mut skipped = 0;
    let mut error_count = 0;

    for file_path in &files {
        let source = match read_source(file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}", e);
                error_count += 1;
                continue;
            }
        };

        let result = match driver::transform_source(&source, config) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error rewriting {}: {}", file_path.display(), e);
                error_count += 1;
                continue;
            }
        };

        report_problems(file_path, &result);
        skipped += result.outcome.skipped.len();
        if !result.changed() {
            continue;
        }
        changed_files += 1;
        rewritten += result.outcome.applied.len();

        match mode {
            OutputMode::Check => println!("Would rewrite: {}", file_path.display()),
            OutputMode::Print => {
                if files.len() > 1 {
                    println!("--- {}", file_path.display());
                }
                print!("{}", result.output);
            }
            OutputMode::Write => {
                if let Err(e) = fs::write(file_path, &result.output) {
                    eprintln!("Error writing {}: {}", file_path.display(), e);
                    error_count += 1;
                } else {
                    println!(
                        "Rewrote: {} ({} declaration(s))",
                        file_path.display(),
                        result.outcome.applied.len()
                    );
                }
            }
        }
    }

    tracing::info!(
        files = files.len(),
        changed_files,
        rewritten,
        skipped,
        errors = error_count,
        "rewrite finished"
    );

    match mode {
        OutputMode::Check if changed_files > 0 => {
            return Err(CliError::failure(format!("\n{} file(s) would be rewritten", changed_files)));
        }
        OutputMode::Check => println!("✓ {} file(s) have no marked declarations left", files.len()),
        OutputMode::Write => println!(
            "\n✓ {} declaration(s) rewritten in {} file(s), {} skipped, {} error(s)",
            rewritten, changed_files, skipped, error_count
        ),
        OutputMode::Print => {}
    }

    if error_count > 0 || skipped > 0 {
        return Err(CliError::new("", ExitCode::FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Print every marked declaration under `path`.
pub fn list_markers(path: &Path, config: &RewriteConfig) -> CliResult<ExitCode> {
    let files = collect_rs_files(path);
    if files.is_empty() {
        return Err(CliError::failure("No .rs files found"));
    }

    let listing = scan_markers(&files, config);
    for entry in &listing.entries {
        println!("{}", entry);
    }

    println!("\n{} marked declaration(s) in {} file(s)", listing.entries.len(), files.len());
    if listing.error_count > 0 {
        return Err(CliError::new("", ExitCode::FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}

/// What `list` found, one entry per marked declaration.
#[derive(Debug, Default)]
struct MarkerListing {
    entries: Vec<String>,
    error_count: usize,
}

/// Discover markers in `files`. Unreadable or unparsable files are reported and counted, and the scan goes on.
fn scan_markers(files: &[PathBuf], config: &RewriteConfig) -> MarkerListing {
    let mut listing = MarkerListing::default();
    for file_path in files {
        let source = match read_source(file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}", e);
                listing.error_count += 1;
                continue;
            }
        };
        let file = match syn::parse_file(&source) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error parsing {}: {}", file_path.display(), e);
                listing.error_count += 1;
                continue;
            }
        };

        let found = discovery::discover(&file, config);
        for m in &found.matches {
            listing.entries.push(format!("{}: {}", file_path.display(), m));
        }
        for problem in &found.problems {
            report(file_path, problem);
        }
        listing.error_count += found.problems.len();
    }
    listing
}

fn report_problems(file_path: &Path, result: &Transformed) {
    for problem in &result.problems {
        report(file_path, problem);
    }
    for skipped in &result.outcome.skipped {
        report(file_path, &skipped.error);
    }
}

/// Render a rewrite diagnostic with its code and help text.
fn report(file_path: &Path, error: &RewriteError) {
    let report = miette::Report::new(error.clone()).wrap_err(file_path.display().to_string());
    eprintln!("{:?}", report);
}

/// All `.rs` files at or below `path`, skipping hidden directories and build output.
pub fn collect_rs_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                let entry_path = entry.path();
                if entry_path.is_dir() {
                    let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if !name.starts_with('.') && name != "target" {
                        files.extend(collect_rs_files(&entry_path));
                    }
                } else if entry_path.extension().is_some_and(|ext| ext == "rs") {
                    files.push(entry_path);
                }
            }
        }
    }

    files.sort();
    files
}
