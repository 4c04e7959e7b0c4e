#![forbid(unsafe_code)]
//! throwgen: stub marked Rust declarations with a diverging error call.
//!
//! A declaration carrying the marker attribute gets one statement appended to its body:
//!
//! ```text
//! #[unsupported_operation(error = crate::errors::NotSupported)]
//! fn flush(&mut self) -> io::Result<()> {}
//!
//! // becomes
//!
//! fn flush(&mut self) -> io::Result<()> {
//!     ErrorUtil::raise(NotSupported::CLASS);
//! }
//! ```
//!
//! and the enclosing module gains the `use` items the new statement needs. The helper (`ErrorUtil::raise` by default)
//! is supplied by the host crate and must diverge.
//!
//! ## Layout
//!
//! - Core: [`names`], [`imports`], [`synth`], [`rewrite`], [`dispatch`]
//! - Host tree access: [`slot`], [`discovery`]
//! - Output: [`splice`], [`driver`], [`cli`]
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod discovery;
pub mod dispatch;
pub mod driver;
pub mod errors;
pub mod imports;
pub mod keywords;
pub mod names;
pub mod rewrite;
pub mod slot;
pub mod splice;
pub mod synth;
pub mod version;

pub use config::{EmitMode, RewriteConfig};
pub use context::RewriteContext;
pub use descriptor::{ArgumentDescriptor, ErrorDescriptor, MethodMatch};
pub use dispatch::{Outcome, apply, apply_all};
pub use driver::{TransformError, Transformed, transform_source};
pub use errors::RewriteError;
pub use imports::{conflicting_import, ensure_import, has_import};
pub use names::{Names, QualifiedName};
pub use rewrite::{append_statement, rewrite_body};
pub use slot::{DeclRef, DeclSlot};
pub use synth::build_raise_statement;
