//! Per-unit rewrite context.
//!
//! [`RewriteContext`] bundles what every component needs for one compilation unit: the configuration, the identifier
//! interner and the parsed helper target. It is created once per unit and passed by `&mut` into each call; nothing is
//! stored globally.

use crate::config::RewriteConfig;
use crate::errors::RewriteError;
use crate::keywords;
use crate::names::{self, Names, QualifiedName};

/// Explicit context for one compilation unit.
#[derive(Debug)]
pub struct RewriteContext {
    config: RewriteConfig,
    names: Names,
    helper: QualifiedName,
    default_error: QualifiedName,
}

impl RewriteContext {
    /// Validate `config` and build a context.
    ///
    /// ## Errors
    ///
    /// Returns [`RewriteError::InvalidConfig`] when the helper path, operation, class marker, marker or default error
    /// is not a usable Rust name.
    pub fn new(config: RewriteConfig) -> Result<Self, RewriteError> {
        let helper = QualifiedName::parse(&config.helper_module)
            .map_err(|e| RewriteError::invalid_config(format!("helper module: {}", e.detail())))?;
        let default_error = QualifiedName::parse(&config.default_error)
            .map_err(|e| RewriteError::invalid_config(format!("default error: {}", e.detail())))?;

        for (what, value) in [
            ("helper operation", &config.helper_operation),
            ("class marker", &config.class_marker),
            ("marker", &config.marker),
        ] {
            if !names::is_valid_identifier(value) || keywords::is_path_root(value) {
                return Err(RewriteError::invalid_config(format!(
                    "{what} `{value}` is not a valid identifier"
                )));
            }
        }

        Ok(Self {
            config,
            names: Names::new(),
            helper,
            default_error,
        })
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn names(&mut self) -> &mut Names {
        &mut self.names
    }

    /// The helper type/module whose simple name prefixes every synthesized call.
    pub fn helper(&self) -> &QualifiedName {
        &self.helper
    }

    pub fn default_error(&self) -> &QualifiedName {
        &self.default_error
    }
}
