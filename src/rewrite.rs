//! Block rewriting: copy a body and append one statement.
//!
//! Nothing here mutates the host tree. [`rewrite_body`] reads a resolved declaration and returns a fresh block; the
//! dispatcher installs it through the declaration's slot.

use syn::spanned::Spanned;
use syn::{Block, Stmt};

use crate::errors::RewriteError;
use crate::slot::DeclRef;

/// Return a copy of `decl`'s body with `stmt` appended.
///
/// ## Errors
///
/// Returns [`RewriteError::MissingBody`] for trait methods without a default body and for foreign functions.
pub fn rewrite_body(decl: DeclRef<'_>, stmt: Stmt) -> Result<Block, RewriteError> {
    let body = decl
        .body()
        .ok_or_else(|| RewriteError::missing_body(decl.ident().to_string()))?;
    Ok(append_statement(body, stmt))
}

/// Copy `block` and append `stmt`.
///
/// Only the top-level statement list is touched; nested blocks are cloned as they are. A tail expression gets a
/// semicolon so it stays a statement once something follows it. Calling this twice appends twice.
pub fn append_statement(block: &Block, stmt: Stmt) -> Block {
    let mut stmts = Vec::with_capacity(block.stmts.len() + 1);
    stmts.extend(block.stmts.iter().cloned());

    if let Some(tail) = stmts.last_mut().filter(|s| needs_terminator(s)) {
        tracing::trace!("terminating tail expression before appended statement");
        let semi = syn::Token![;](tail.span());
        match tail {
            Stmt::Expr(_, slot) => *slot = Some(semi),
            Stmt::Macro(m) => m.semi_token = Some(semi),
            Stmt::Local(_) | Stmt::Item(_) => {}
        }
    }
    stmts.push(stmt);

    Block {
        brace_token: block.brace_token,
        stmts,
    }
}

/// Whether `stmt`, as the last statement of a block, needs a `;` before anything can follow it.
///
/// True for a tail expression and for a `mac!(..)` / `mac![..]` tail. Brace-delimited macros are statements already.
pub fn needs_terminator(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(_, semi) => semi.is_none(),
        Stmt::Macro(m) => m.semi_token.is_none() && !matches!(m.mac.delimiter, syn::MacroDelimiter::Brace(_)),
        Stmt::Local(_) | Stmt::Item(_) => false,
    }
}
