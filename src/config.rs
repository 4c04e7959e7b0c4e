//! Rewrite configuration
//!
//! Defaults describe the conventional setup: functions marked `#[unsupported_operation]` are stubbed with
//! `ErrorUtil::raise(UnsupportedOperation::CLASS)`, where both names live in the host crate's `errors` module.

/// How the driver turns a rewritten tree back into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Edit the original text in place; untouched code stays byte-identical.
    Splice,
    /// Re-render the whole file with `prettyplease`.
    Pretty,
}

/// Rewrite configuration
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Attribute name that marks a declaration for stubbing
    pub marker: String,
    /// Fully-qualified path of the helper type or module that performs the raise
    pub helper_module: String,
    /// Name of the diverging helper operation
    pub helper_operation: String,
    /// Associated item used for class-literal arguments (`MyError::CLASS`)
    pub class_marker: String,
    /// Error type used when a marker does not name one
    pub default_error: String,
    /// Whether to remove the marker attribute once a declaration is rewritten
    pub strip_markers: bool,
    /// Output rendering
    pub emit: EmitMode,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            marker: "unsupported_operation".to_string(),
            helper_module: "crate::errors::ErrorUtil".to_string(),
            helper_operation: "raise".to_string(),
            class_marker: "CLASS".to_string(),
            default_error: "crate::errors::UnsupportedOperation".to_string(),
            strip_markers: true,
            emit: EmitMode::Splice,
        }
    }
}

impl RewriteConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the marker attribute name
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the helper path and operation (`my_crate::fail::Fail`, `now`)
    pub fn with_helper(mut self, module: impl Into<String>, operation: impl Into<String>) -> Self {
        self.helper_module = module.into();
        self.helper_operation = operation.into();
        self
    }

    /// Set the associated item used for class literals
    pub fn with_class_marker(mut self, class_marker: impl Into<String>) -> Self {
        self.class_marker = class_marker.into();
        self
    }

    /// Set the fallback error type
    pub fn with_default_error(mut self, error: impl Into<String>) -> Self {
        self.default_error = error.into();
        self
    }

    /// Keep or strip markers after rewriting
    pub fn with_strip_markers(mut self, strip: bool) -> Self {
        self.strip_markers = strip;
        self
    }

    /// Set the output rendering
    pub fn with_emit(mut self, emit: EmitMode) -> Self {
        self.emit = emit;
        self
    }
}
