//! Build the "raise" statement appended to stubbed bodies.
//!
//! The statement is a call through a helper rather than a constructor call on the error type:
//!
//! ```text
//! ErrorUtil::raise(MyError::CLASS, "message", Owner::CLASS);
//! ```
//!
//! Routing through one diverging helper keeps the synthesized node independent of how the error type is constructed;
//! the helper decides. The callee is always the two-segment path `<helper simple name>::<operation>`, and the helper's
//! full path is imported by the dispatcher.
//!
//! ## Notes
//!
//! - A class literal is the associated item `<simple name>::<class marker>`. Only the simple name is emitted; the full
//!   path is the import's job.
//! - Every identifier goes through the context's interner (keywords are escaped there).

use proc_macro2::Ident;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprCall, ExprLit, ExprPath, Lit, LitStr, PathSegment, Stmt};

use crate::context::RewriteContext;
use crate::descriptor::{ArgumentDescriptor, ErrorDescriptor};
use crate::errors::RewriteError;
use crate::names::QualifiedName;

/// Build `Helper::operation(args...);` for `descriptor`.
///
/// ## Errors
///
/// Returns [`RewriteError::MalformedDescriptor`] if the error type name is empty or invalid, or if any argument is
/// invalid (a class literal whose type name does not parse, an identifier that is not an identifier).
pub fn build_raise_statement(ctx: &mut RewriteContext, descriptor: &ErrorDescriptor) -> Result<Stmt, RewriteError> {
    let error = descriptor.qualified_name()?;

    let args = descriptor
        .arguments()
        .iter()
        .map(|arg| build_argument(ctx, arg))
        .collect::<Result<Punctuated<Expr, syn::Token![,]>, _>>()?;

    let helper = ctx.helper().simple_name().to_string();
    let operation = ctx.config().helper_operation.clone();
    let names = ctx.names();
    let callee = path_expr([names.ident(&helper)?, names.ident(&operation)?]);
    let span = names.span();

    tracing::debug!(error = %error, args = args.len(), "synthesized raise statement");

    let call = ExprCall {
        attrs: Vec::new(),
        func: Box::new(callee),
        paren_token: syn::token::Paren(span),
        args,
    };
    Ok(Stmt::Expr(Expr::Call(call), Some(syn::Token![;](span))))
}

/// Translate one argument descriptor into an expression.
pub fn build_argument(ctx: &mut RewriteContext, arg: &ArgumentDescriptor) -> Result<Expr, RewriteError> {
    match arg {
        ArgumentDescriptor::ClassLiteral(type_name) => {
            let ty = QualifiedName::parse(type_name)
                .map_err(|e| e.in_context("class literal argument"))?;
            let marker = ctx.config().class_marker.clone();
            let names = ctx.names();
            Ok(path_expr([names.ident(ty.simple_name())?, names.ident(&marker)?]))
        }
        ArgumentDescriptor::Identifier(name) => {
            let ident = ctx
                .names()
                .ident(name)
                .map_err(|e| e.in_context("identifier argument"))?;
            Ok(path_expr([ident]))
        }
        ArgumentDescriptor::StringLiteral(value) => {
            let span = ctx.names().span();
            Ok(Expr::Lit(ExprLit {
                attrs: Vec::new(),
                lit: Lit::Str(LitStr::new(value, span)),
            }))
        }
    }
}

/// A plain path expression (`a::b`).
fn path_expr(segments: impl IntoIterator<Item = Ident>) -> Expr {
    Expr::Path(ExprPath {
        attrs: Vec::new(),
        qself: None,
        path: syn::Path {
            leading_colon: None,
            segments: segments.into_iter().map(PathSegment::from).collect(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use quote::ToTokens;

    fn ctx() -> RewriteContext {
        RewriteContext::new(RewriteConfig::default()).unwrap()
    }

    fn render(stmt: &Stmt) -> String {
        stmt.to_token_stream().to_string()
    }

    fn call_of(stmt: &Stmt) -> &ExprCall {
        match stmt {
            Stmt::Expr(Expr::Call(call), Some(_)) => call,
            other => panic!("expected call statement, got {}", other.to_token_stream()),
        }
    }

    #[test]
    fn test_class_literal_argument() {
        let descriptor = ErrorDescriptor::new("pkg.MyError")
            .with_argument(ArgumentDescriptor::ClassLiteral("MyError".to_string()));
        let stmt = build_raise_statement(&mut ctx(), &descriptor).unwrap();
        assert_eq!(render(&stmt), "ErrorUtil :: raise (MyError :: CLASS) ;");
    }

    #[test]
    fn test_class_literal_uses_simple_name() {
        let descriptor = ErrorDescriptor::standard("pkg::errors::MyError", None, None);
        let stmt = build_raise_statement(&mut ctx(), &descriptor).unwrap();
        assert_eq!(render(&stmt), "ErrorUtil :: raise (MyError :: CLASS) ;");
    }

    #[test]
    fn test_all_argument_kinds() {
        let descriptor = ErrorDescriptor::new("pkg::MyError")
            .with_argument(ArgumentDescriptor::ClassLiteral("pkg::MyError".to_string()))
            .with_argument(ArgumentDescriptor::Identifier("value".to_string()))
            .with_argument(ArgumentDescriptor::StringLiteral("not \"yet\"".to_string()));
        let stmt = build_raise_statement(&mut ctx(), &descriptor).unwrap();
        let call = call_of(&stmt);
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.func.to_token_stream().to_string(), "ErrorUtil :: raise");
        match &call.args[2] {
            Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => assert_eq!(s.value(), "not \"yet\""),
            other => panic!("expected string literal, got {}", other.to_token_stream()),
        }
    }

    #[test]
    fn test_no_arguments() {
        let stmt = build_raise_statement(&mut ctx(), &ErrorDescriptor::new("pkg::MyError")).unwrap();
        assert!(call_of(&stmt).args.is_empty());
    }

    #[test]
    fn test_keyword_identifier_is_raw() {
        let descriptor =
            ErrorDescriptor::new("pkg::MyError").with_argument(ArgumentDescriptor::Identifier("type".to_string()));
        let stmt = build_raise_statement(&mut ctx(), &descriptor).unwrap();
        assert_eq!(render(&stmt), "ErrorUtil :: raise (r#type) ;");
    }

    #[test]
    fn test_custom_helper_and_marker() {
        let config = RewriteConfig::new()
            .with_helper("fail::Fail", "now")
            .with_class_marker("TYPE");
        let mut ctx = RewriteContext::new(config).unwrap();
        let stmt = build_raise_statement(&mut ctx, &ErrorDescriptor::standard("a::B", None, None)).unwrap();
        assert_eq!(render(&stmt), "Fail :: now (B :: TYPE) ;");
    }

    #[test]
    fn test_empty_type_name_is_malformed() {
        let result = build_raise_statement(&mut ctx(), &ErrorDescriptor::new(""));
        assert!(matches!(result, Err(RewriteError::MalformedDescriptor { .. })));
    }

    #[test]
    fn test_bad_arguments_are_malformed() {
        let bad_class =
            ErrorDescriptor::new("pkg::MyError").with_argument(ArgumentDescriptor::ClassLiteral("".to_string()));
        assert!(matches!(
            build_raise_statement(&mut ctx(), &bad_class),
            Err(RewriteError::MalformedDescriptor { .. })
        ));

        let bad_ident =
            ErrorDescriptor::new("pkg::MyError").with_argument(ArgumentDescriptor::Identifier("a b".to_string()));
        assert!(matches!(
            build_raise_statement(&mut ctx(), &bad_ident),
            Err(RewriteError::MalformedDescriptor { .. })
        ));
    }
}
