//! One-file pipeline: parse, discover, dispatch, strip markers, emit.

use syn::File;
use thiserror::Error;

use crate::config::{EmitMode, RewriteConfig};
use crate::context::RewriteContext;
use crate::discovery;
use crate::dispatch::{self, Outcome};
use crate::errors::RewriteError;
use crate::splice::{self, SpliceError};

/// Why a source file could not be transformed at all.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to parse source: {0}")]
    Parse(#[from] syn::Error),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("failed to splice output: {0}")]
    Splice(#[from] SpliceError),
}

/// Result of transforming one source file.
#[derive(Debug)]
pub struct Transformed {
    /// The new source text. Equal to the input when nothing was rewritten.
    pub output: String,
    /// The rewritten tree.
    pub file: File,
    pub outcome: Outcome,
    /// Markers discovery could not understand.
    pub problems: Vec<RewriteError>,
}

impl Transformed {
    pub fn changed(&self) -> bool {
        self.outcome.changed()
    }
}

/// Transform one file's source text.
///
/// A leading byte order mark or `#!` line is kept as is and not parsed. Files without rewritable markers come back
/// unchanged in both emit modes.
///
/// ## Errors
///
/// Returns [`TransformError::Parse`] for invalid Rust, [`TransformError::Rewrite`] for an invalid configuration or a
/// fatal slot failure, and [`TransformError::Splice`] if the output could not be assembled.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn transform_source(source: &str, config: &RewriteConfig) -> Result<Transformed, TransformError> {
    let mut ctx = RewriteContext::new(config.clone())?;
    let (preamble, body) = split_preamble(source);

    let original = syn::parse_file(body)?;
    let found = discovery::discover(&original, config);

    let mut file = original.clone();
    let outcome = dispatch::apply_all(&mut ctx, &mut file, &found.matches)?;

    if config.strip_markers {
        for done in &outcome.applied {
            let attrs = done.current.attrs_mut(&mut file)?;
            attrs.retain(|attr| !discovery::is_marker(attr, &config.marker));
        }
    }

    let output = if !outcome.changed() {
        source.to_string()
    } else {
        let emitted = match config.emit {
            EmitMode::Splice => splice::splice(body, &original, &outcome, config)?,
            EmitMode::Pretty => prettyplease::unparse(&file),
        };
        format!("{preamble}{emitted}")
    };

    Ok(Transformed {
        output,
        file,
        outcome,
        problems: found.problems,
    })
}

/// Split off a byte order mark and a `#!` interpreter line.
///
/// `#![...]` is an inner attribute, not a shebang.
fn split_preamble(source: &str) -> (&str, &str) {
    let mut split = 0;
    if source.starts_with('\u{feff}') {
        split = '\u{feff}'.len_utf8();
    }
    let rest = &source[split..];
    if rest.starts_with("#!") && !rest[2..].trim_start().starts_with('[') {
        split += rest.find('\n').map_or(rest.len(), |idx| idx + 1);
    }
    source.split_at(split)
}
