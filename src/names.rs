//! Identifier interning and qualified names.
//!
//! Every identifier the rewriter constructs goes through [`Names`], so constructed nodes share one span and one
//! escaping policy: Rust keywords become raw identifiers (`r#type`), path roots (`crate`, `self`, `super`, `Self`) stay
//! plain, everything else is validated before it reaches `proc_macro2`.
//!
//! ## Notes
//!
//! - [`QualifiedName`] accepts both the Rust spelling (`pkg::errors::MyError`) and the dotted spelling
//!   (`pkg.errors.MyError`). It always displays with `::`.
//! - Validation never panics: `proc_macro2::Ident::new` panics on bad input, so names are checked first.

use std::collections::HashMap;
use std::fmt;

use proc_macro2::{Ident, Span};
use syn::punctuated::Punctuated;

use crate::errors::RewriteError;
use crate::keywords;

/// A validated path such as `my_crate::errors::MyError`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    leading_colon: bool,
    segments: Vec<String>,
}

impl QualifiedName {
    /// Parse a `::`- or `.`-separated path.
    ///
    /// ## Errors
    ///
    /// Returns [`RewriteError::MalformedDescriptor`] if the name is empty, mixes separators, has an empty segment, or
    /// has a segment that is not an identifier. Path roots are only accepted as the first segment.
    pub fn parse(raw: &str) -> Result<Self, RewriteError> {
        if raw.trim().is_empty() {
            return Err(RewriteError::malformed("type name is empty"));
        }

        let (leading_colon, body) = match raw.strip_prefix("::") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let parts: Vec<&str> = if body.contains("::") {
            if body.contains('.') {
                return Err(RewriteError::malformed(format!("`{raw}` mixes `::` and `.` separators")));
            }
            body.split("::").collect()
        } else {
            body.split('.').collect()
        };

        let mut segments = Vec::with_capacity(parts.len());
        for (idx, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(RewriteError::malformed(format!("`{raw}` has an empty path segment")));
            }
            if keywords::is_path_root(part) && (idx > 0 || leading_colon) {
                return Err(RewriteError::malformed(format!(
                    "`{part}` may only start a path, found it inside `{raw}`"
                )));
            }
            if !is_valid_identifier(part) {
                return Err(RewriteError::malformed(format!("`{part}` in `{raw}` is not a valid identifier")));
            }
            segments.push((*part).to_string());
        }

        Ok(Self { leading_colon, segments })
    }

    /// The last segment (`MyError` for `pkg::MyError`).
    pub fn simple_name(&self) -> &str {
        // `parse` guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_leading_colon(&self) -> bool {
        self.leading_colon
    }

    /// Whether the path has a module prefix. Single-segment names need no import.
    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_colon {
            f.write_str("::")?;
        }
        f.write_str(&self.segments.join("::"))
    }
}

/// Check whether `name` can be turned into an identifier.
///
/// Keywords count as valid (they are emitted raw), and so do path roots; callers that care about position check that
/// separately.
pub fn is_valid_identifier(name: &str) -> bool {
    if keywords::is_path_root(name) || keywords::is_keyword(name) {
        return true;
    }
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c == '_' || c.is_alphabetic());
    if !starts_ok || !chars.all(|c| c == '_' || c.is_alphanumeric()) {
        return false;
    }
    // `syn` applies the real XID rules and rejects `_`.
    syn::parse_str::<Ident>(name).is_ok()
}

/// Identifier interner for one compilation unit.
///
/// Interning keeps every reference to the same name pointing at an identical `Ident` (same text, same span), which is
/// what the rest of the tree sees when the host compares or re-emits nodes.
#[derive(Debug)]
pub struct Names {
    span: Span,
    interned: HashMap<String, Ident>,
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

impl Names {
    /// Create an interner whose identifiers use `Span::call_site()`.
    pub fn new() -> Self {
        Self::with_span(Span::call_site())
    }

    /// Create an interner whose identifiers all carry `span`.
    pub fn with_span(span: Span) -> Self {
        Self {
            span,
            interned: HashMap::new(),
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Intern `name`, escaping keywords.
    ///
    /// ## Errors
    ///
    /// Returns [`RewriteError::MalformedDescriptor`] if `name` is not an identifier.
    pub fn ident(&mut self, name: &str) -> Result<Ident, RewriteError> {
        if let Some(ident) = self.interned.get(name) {
            return Ok(ident.clone());
        }
        if !is_valid_identifier(name) {
            return Err(RewriteError::malformed(format!("`{name}` is not a valid identifier")));
        }

        let ident = if keywords::is_keyword(name) {
            Ident::new_raw(name, self.span)
        } else {
            Ident::new(name, self.span)
        };
        tracing::trace!(name, "interned identifier");
        self.interned.insert(name.to_string(), ident.clone());
        Ok(ident)
    }

    /// Build a `syn::Path` for a qualified name.
    pub fn path(&mut self, name: &QualifiedName) -> Result<syn::Path, RewriteError> {
        let span = self.span;
        let mut segments = Punctuated::new();
        for segment in name.segments() {
            segments.push(syn::PathSegment::from(self.ident(segment)?));
        }
        Ok(syn::Path {
            leading_colon: name.has_leading_colon().then(|| syn::Token![::](span)),
            segments,
        })
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.interned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interned.is_empty()
    }
}
