//! Symbolic descriptions of what a rewrite should raise.
//!
//! A [`MethodMatch`] pairs a declaration (addressed by a [`DeclSlot`]) with the [`ErrorDescriptor`] its marker asked
//! for. Descriptors are plain data: nothing here touches a syntax tree, so they can be built by discovery, by tests, or
//! by any other host integration.

use std::fmt;

use crate::errors::RewriteError;
use crate::names::QualifiedName;
use crate::slot::DeclSlot;

/// One argument passed to the raise helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentDescriptor {
    /// A class-literal of a type: `MyError::CLASS`. Only the simple name of the type is emitted.
    ClassLiteral(String),
    /// A bare identifier: `value`.
    Identifier(String),
    /// A string literal, emitted with its exact value.
    StringLiteral(String),
}

impl ArgumentDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            ArgumentDescriptor::ClassLiteral(_) => "class literal",
            ArgumentDescriptor::Identifier(_) => "identifier",
            ArgumentDescriptor::StringLiteral(_) => "string literal",
        }
    }
}

/// The error type to raise and the arguments to raise it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    type_name: String,
    arguments: Vec<ArgumentDescriptor>,
}

impl ErrorDescriptor {
    /// Describe an error type with no arguments.
    ///
    /// The name is kept as written; [`ErrorDescriptor::qualified_name`] validates it when the statement is built.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            arguments: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn with_argument(mut self, argument: ArgumentDescriptor) -> Self {
        self.arguments.push(argument);
        self
    }

    /// The canonical argument list a marker produces.
    ///
    /// `[ClassLiteral(type)]`, then the message as a string literal if present, then the owning type's class literal if
    /// present. Passing the error type as a class literal keeps the helper call unambiguous when the error type is
    /// generic.
    pub fn standard(type_name: impl Into<String>, message: Option<String>, owner: Option<String>) -> Self {
        let type_name = type_name.into();
        let mut descriptor = Self::new(type_name.clone()).with_argument(ArgumentDescriptor::ClassLiteral(type_name));
        if let Some(message) = message {
            descriptor = descriptor.with_argument(ArgumentDescriptor::StringLiteral(message));
        }
        if let Some(owner) = owner {
            descriptor = descriptor.with_argument(ArgumentDescriptor::ClassLiteral(owner));
        }
        descriptor
    }

    /// The type name as written.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The substring after the last `::` or `.` separator.
    pub fn simple_name(&self) -> &str {
        let after_colons = self.type_name.rsplit("::").next().unwrap_or(&self.type_name);
        after_colons.rsplit('.').next().unwrap_or(after_colons)
    }

    pub fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    /// Validate and parse the fully-qualified type name.
    pub fn qualified_name(&self) -> Result<QualifiedName, RewriteError> {
        QualifiedName::parse(&self.type_name)
    }
}

/// A declaration selected by discovery, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch {
    /// Where the declaration lives in the host tree.
    pub slot: DeclSlot,
    /// What its body should raise.
    pub descriptor: ErrorDescriptor,
    /// Human-readable name for diagnostics (`Shape::area`, `helpers::parse`).
    pub name: String,
}

impl MethodMatch {
    pub fn new(slot: DeclSlot, descriptor: ErrorDescriptor, name: impl Into<String>) -> Self {
        Self {
            slot,
            descriptor,
            name: name.into(),
        }
    }
}

impl fmt::Display for MethodMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.descriptor.type_name())
    }
}
