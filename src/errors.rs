//! Rewrite error taxonomy.
//!
//! Errors are split by how the batch dispatcher treats them:
//!
//! - **Per-match** (`MalformedDescriptor`, `MissingBody`, `ImportConflict`, `InvalidMarker`): the declaration is skipped and the error is
//!   reported; other matches in the same file continue.
//! - **Fatal** (`InvalidConfig`, `InvalidSlot`): the host handed us something that cannot be processed at all. The
//!   whole compilation unit is aborted.
//!
//! Nothing is retried: every operation is a deterministic tree construction.

use miette::Diagnostic;
use thiserror::Error;

/// Error raised by the rewriting core.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RewriteError {
    #[error("malformed error descriptor: {reason}")]
    #[diagnostic(
        code(throwgen::malformed_descriptor),
        help("error types and identifiers must be paths like `my_crate::errors::MyError`")
    )]
    MalformedDescriptor { reason: String },

    #[error("`{name}` has no body to rewrite")]
    #[diagnostic(
        code(throwgen::missing_body),
        help("trait methods without a default body and foreign functions cannot be stubbed")
    )]
    MissingBody { name: String },

    #[error("importing `{name}` would clash with the existing import of `{existing}`")]
    #[diagnostic(
        code(throwgen::import_conflict),
        help("name a different error type in the marker, or rename the existing import with `as`")
    )]
    ImportConflict { name: String, existing: String },

    #[error("invalid marker on `{name}`: {reason}")]
    #[diagnostic(
        code(throwgen::invalid_marker),
        help("supported arguments are `error = path::Type`, `message = \"...\"` and `pass_owner`")
    )]
    InvalidMarker { name: String, reason: String },

    #[error("invalid configuration: {reason}")]
    #[diagnostic(code(throwgen::invalid_config))]
    InvalidConfig { reason: String },

    #[error("declaration slot {slot} does not resolve to a function")]
    #[diagnostic(code(throwgen::invalid_slot))]
    InvalidSlot { slot: String },
}

impl RewriteError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor { reason: reason.into() }
    }

    pub fn missing_body(name: impl Into<String>) -> Self {
        Self::MissingBody { name: name.into() }
    }

    pub fn import_conflict(name: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::ImportConflict {
            name: name.into(),
            existing: existing.into(),
        }
    }

    pub fn invalid_marker(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMarker {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }

    /// Prefix a malformed-descriptor reason with where it came from. Other errors pass through.
    pub fn in_context(self, context: &str) -> Self {
        match self {
            Self::MalformedDescriptor { reason } => Self::MalformedDescriptor {
                reason: format!("{context}: {reason}"),
            },
            other => other,
        }
    }

    /// The bare reason for descriptor and config errors, the full message otherwise.
    pub fn detail(&self) -> String {
        match self {
            Self::MalformedDescriptor { reason } | Self::InvalidConfig { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error aborts the whole compilation unit rather than a single match.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::InvalidSlot { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        assert!(!RewriteError::malformed("x").is_fatal());
        assert!(!RewriteError::missing_body("f").is_fatal());
        assert!(!RewriteError::invalid_marker("f", "x").is_fatal());
        assert!(!RewriteError::import_conflict("a::E", "b::E").is_fatal());
        assert!(RewriteError::invalid_config("x").is_fatal());
        assert!(RewriteError::InvalidSlot { slot: "0".into() }.is_fatal());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            RewriteError::malformed("type name is empty").to_string(),
            "malformed error descriptor: type name is empty"
        );
        assert_eq!(
            RewriteError::missing_body("Shape::area").to_string(),
            "`Shape::area` has no body to rewrite"
        );
    }

    #[test]
    fn test_in_context_prefixes_reason() {
        let err = RewriteError::malformed("type name is empty").in_context("class literal argument");
        assert_eq!(err.detail(), "class literal argument: type name is empty");
        let untouched = RewriteError::missing_body("f").in_context("ignored");
        assert_eq!(untouched, RewriteError::missing_body("f"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = RewriteError::missing_body("f");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("throwgen::missing_body"));
    }
}
