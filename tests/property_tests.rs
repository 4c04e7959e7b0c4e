//! Property-based tests for throwgen
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use proptest::prelude::*;
use syn::{Block, Expr, Item, Stmt, parse_quote};
use throwgen::keywords::{is_keyword, is_path_root};
use throwgen::{
    ArgumentDescriptor, ErrorDescriptor, Names, QualifiedName, RewriteConfig, RewriteContext, append_statement,
    build_raise_statement, conflicting_import, ensure_import, has_import,
};

// =============================================================================
// Strategies
// =============================================================================

/// Lower-case identifiers that are neither keywords nor path roots.
fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("keywords and path roots are not plain identifiers", |s| {
        !is_keyword(s) && !is_path_root(s)
    })
}

/// A two- to four-segment path such as `abc::d_1::x`.
fn qualified_strategy() -> impl Strategy<Value = QualifiedName> {
    prop::collection::vec(ident_strategy(), 2..=4)
        .prop_map(|segments| QualifiedName::parse(&segments.join("::")).expect("generated path is valid"))
}

fn argument_strategy() -> impl Strategy<Value = ArgumentDescriptor> {
    prop_oneof![
        ident_strategy().prop_map(ArgumentDescriptor::ClassLiteral),
        ident_strategy().prop_map(ArgumentDescriptor::Identifier),
        "[ -~]{0,20}".prop_map(ArgumentDescriptor::StringLiteral),
    ]
}

fn ctx() -> RewriteContext {
    RewriteContext::new(RewriteConfig::default()).expect("default config is valid")
}

// =============================================================================
// Import Properties
// =============================================================================

proptest! {
    /// Property: a second `ensure_import` for the same name inserts nothing
    #[test]
    fn ensure_import_is_idempotent(
        name in qualified_strategy(),
        others in prop::collection::vec(qualified_strategy(), 0..4),
    ) {
        let mut items: Vec<Item> = vec![parse_quote!(struct Anchor;)];
        let mut names = Names::new();
        for other in &others {
            // a clash with an earlier name leaves `items` untouched
            let _ = ensure_import(&mut items, other, &mut names);
        }
        prop_assume!(conflicting_import(&items, &name).is_none());

        ensure_import(&mut items, &name, &mut names).expect("first import");
        let after_first = items.clone();
        let second = ensure_import(&mut items, &name, &mut names).expect("second import");

        prop_assert_eq!(second, None);
        prop_assert_eq!(&items, &after_first);
        prop_assert!(has_import(&items, &name));
    }

    /// Property: every inserted import sits before the first non-`use` item
    #[test]
    fn imports_stay_ahead_of_other_items(names_in in prop::collection::vec(qualified_strategy(), 1..6)) {
        let mut items: Vec<Item> = vec![parse_quote!(struct Anchor;), parse_quote!(fn helper() {})];
        let mut names = Names::new();
        for name in &names_in {
            let _ = ensure_import(&mut items, name, &mut names);
        }

        let first_other = items.iter().position(|item| !matches!(item, Item::Use(_))).unwrap_or(items.len());
        prop_assert!(items[first_other..].iter().all(|item| !matches!(item, Item::Use(_))));
    }
}

// =============================================================================
// Rewrite Properties
// =============================================================================

proptest! {
    /// Property: appending keeps every existing statement and adds exactly one
    #[test]
    fn append_adds_one_statement_at_the_end(vars in prop::collection::vec(ident_strategy(), 0..6)) {
        let stmts: Vec<Stmt> = vars
            .iter()
            .map(|v| {
                let ident = syn::Ident::new(v, proc_macro2::Span::call_site());
                parse_quote!(let #ident = 1;)
            })
            .collect();
        let block = Block { brace_token: Default::default(), stmts };
        let stmt = build_raise_statement(&mut ctx(), &ErrorDescriptor::standard("pkg::Oops", None, None))
            .expect("valid descriptor");

        let rewritten = append_statement(&block, stmt.clone());

        prop_assert_eq!(rewritten.stmts.len(), block.stmts.len() + 1);
        prop_assert_eq!(&rewritten.stmts[..block.stmts.len()], &block.stmts[..]);
        prop_assert_eq!(rewritten.stmts.last(), Some(&stmt));
    }

    /// Property: the helper call has one argument per descriptor argument
    #[test]
    fn raise_call_matches_descriptor_arity(
        error in qualified_strategy(),
        args in prop::collection::vec(argument_strategy(), 0..5),
    ) {
        let mut descriptor = ErrorDescriptor::new(error.to_string());
        for arg in args.iter().cloned() {
            descriptor = descriptor.with_argument(arg);
        }

        let stmt = build_raise_statement(&mut ctx(), &descriptor).expect("generated descriptor is valid");

        let Stmt::Expr(Expr::Call(call), Some(_)) = stmt else {
            return Err(TestCaseError::fail("expected a terminated call statement"));
        };
        prop_assert_eq!(call.args.len(), args.len());
        let Expr::Path(callee) = call.func.as_ref() else {
            return Err(TestCaseError::fail("expected a path callee"));
        };
        let callee: Vec<String> = callee.path.segments.iter().map(|s| s.ident.to_string()).collect();
        prop_assert_eq!(callee, ["ErrorUtil", "raise"]);
    }
}
