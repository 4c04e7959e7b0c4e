//! Match dispatch: the only component that mutates the host tree.
//!
//! For each match the dispatcher runs one linear pass:
//!
//! 1. resolve the slot,
//! 2. synthesize the raise statement,
//! 3. build the rewritten body,
//! 4. install the body,
//! 5. ensure imports in the enclosing module.
//!
//! Steps 1-3 only read, so a match that fails validation leaves both the body and the import set untouched. Imports
//! come last because inserting them shifts item indices; by then the body is already in place.

use syn::{File, Stmt};

use crate::context::RewriteContext;
use crate::descriptor::{ArgumentDescriptor, MethodMatch};
use crate::errors::RewriteError;
use crate::imports;
use crate::names::QualifiedName;
use crate::rewrite;
use crate::slot::{self, DeclSlot};
use crate::synth;

/// An import inserted by [`apply`], addressed in the tree as it was at insertion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedImport {
    pub module: Vec<usize>,
    pub index: usize,
    pub name: QualifiedName,
}

/// Result of applying one match.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The statement appended to the body.
    pub statement: Stmt,
    /// Imports that were missing and got inserted, in insertion order.
    pub imports: Vec<InsertedImport>,
}

/// A match that was rewritten as part of a batch.
#[derive(Debug, Clone)]
pub struct AppliedMatch {
    pub name: String,
    /// Slot in the tree as it was before the batch started.
    pub original: DeclSlot,
    /// Slot in the tree after the batch finished.
    pub current: DeclSlot,
    pub statement: Stmt,
    /// Names newly imported into the declaration's enclosing module.
    pub imports: Vec<QualifiedName>,
}

/// A match that could not be rewritten. The tree is unchanged for it.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub name: String,
    pub slot: DeclSlot,
    pub error: RewriteError,
}

/// Everything a batch did.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub applied: Vec<AppliedMatch>,
    pub skipped: Vec<Skipped>,
}

impl Outcome {
    /// Whether the tree was modified at all.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Rewrite one matched declaration and import what the new statement references.
///
/// ## Errors
///
/// - [`RewriteError::InvalidSlot`] if the slot does not resolve to a function (fatal).
/// - [`RewriteError::MalformedDescriptor`] if the descriptor is invalid.
/// - [`RewriteError::MissingBody`] if the declaration has no body.
/// - [`RewriteError::ImportConflict`] if a name the statement needs is already bound by another import.
///
/// On error nothing has been modified.
pub fn apply(ctx: &mut RewriteContext, file: &mut File, m: &MethodMatch) -> Result<Applied, RewriteError> {
    let decl = m.slot.resolve(file)?;
    let statement = synth::build_raise_statement(ctx, &m.descriptor)?;
    let block = rewrite::rewrite_body(decl, statement.clone()).map_err(|e| match e {
        RewriteError::MissingBody { .. } => RewriteError::missing_body(&m.name),
        other => other,
    })?;
    let wanted = required_imports(ctx, m)?;
    let items = slot::module_items(file, &m.slot.module).ok_or_else(|| RewriteError::InvalidSlot {
        slot: m.slot.to_string(),
    })?;
    check_conflicts(items, &wanted)?;

    m.slot.install_body(file, block)?;

    let items = m.slot.enclosing_items_mut(file)?;
    let mut inserted = Vec::new();
    for name in wanted {
        if let Some(index) = imports::ensure_import(items, &name, ctx.names())? {
            inserted.push(InsertedImport {
                module: m.slot.module.clone(),
                index,
                name,
            });
        }
    }

    tracing::debug!(decl = %m.name, slot = %m.slot, imports = inserted.len(), "applied match");
    Ok(Applied {
        statement,
        imports: inserted,
    })
}

/// Apply every match, isolating per-match failures.
///
/// Matches are independent: a malformed descriptor or a missing body skips that declaration and the batch goes on.
/// Slots are re-addressed after every import insertion, so `matches` must all be addressed against `file` as it is
/// when the batch starts.
///
/// ## Errors
///
/// Fatal errors ([`RewriteError::is_fatal`]) abort the batch. Matches applied before the failure stay applied.
#[tracing::instrument(skip_all, fields(match_count = matches.len()))]
pub fn apply_all(
    ctx: &mut RewriteContext,
    file: &mut File,
    matches: &[MethodMatch],
) -> Result<Outcome, RewriteError> {
    let mut pending = matches.to_vec();
    let mut outcome = Outcome::default();

    for idx in 0..pending.len() {
        let current = pending[idx].clone();
        let original = matches[idx].slot.clone();

        match apply(ctx, file, &current) {
            Ok(applied) => {
                outcome.applied.push(AppliedMatch {
                    name: current.name.clone(),
                    original,
                    current: current.slot.clone(),
                    statement: applied.statement,
                    imports: applied.imports.iter().map(|i| i.name.clone()).collect(),
                });
                for import in &applied.imports {
                    for later in &mut pending[idx + 1..] {
                        later.slot.shift_for_insert(&import.module, import.index);
                    }
                    for done in &mut outcome.applied {
                        done.current.shift_for_insert(&import.module, import.index);
                    }
                }
            }
            Err(error) if error.is_fatal() => {
                tracing::error!(decl = %current.name, %error, "aborting rewrite of compilation unit");
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(decl = %current.name, %error, "skipping declaration");
                outcome.skipped.push(Skipped {
                    name: current.name,
                    slot: original,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        applied = outcome.applied.len(),
        skipped = outcome.skipped.len(),
        "rewrite batch finished"
    );
    Ok(outcome)
}

/// Error type, then qualified class-literal types, then the helper. Duplicates are dropped.
fn required_imports(ctx: &RewriteContext, m: &MethodMatch) -> Result<Vec<QualifiedName>, RewriteError> {
    let mut wanted = vec![m.descriptor.qualified_name()?];
    for arg in m.descriptor.arguments() {
        if let ArgumentDescriptor::ClassLiteral(type_name) = arg {
            let name = QualifiedName::parse(type_name)?;
            if !wanted.contains(&name) {
                wanted.push(name);
            }
        }
    }
    if !wanted.contains(ctx.helper()) {
        wanted.push(ctx.helper().clone());
    }
    Ok(wanted)
}

/// Reject a match whose imports would bind a simple name twice, against the module or among themselves.
fn check_conflicts(items: &[syn::Item], wanted: &[QualifiedName]) -> Result<(), RewriteError> {
    for (idx, name) in wanted.iter().enumerate() {
        if !imports::needs_import(name) {
            continue;
        }
        let clash = imports::conflicting_import(items, name).or_else(|| {
            wanted[..idx]
                .iter()
                .find(|other| {
                    imports::needs_import(other)
                        && other.simple_name() == name.simple_name()
                        && other.segments() != name.segments()
                })
                .map(ToString::to_string)
        });
        if let Some(existing) = clash {
            return Err(RewriteError::import_conflict(name.to_string(), existing));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteConfig;
    use crate::descriptor::ErrorDescriptor;
    use quote::ToTokens;
    use syn::{Item, parse_quote};

    fn ctx() -> RewriteContext {
        RewriteContext::new(RewriteConfig::default()).unwrap()
    }

    fn body_of(file: &File, slot: &DeclSlot) -> Vec<String> {
        slot.resolve(file)
            .unwrap()
            .body()
            .unwrap()
            .stmts
            .iter()
            .map(|s| s.to_token_stream().to_string())
            .collect()
    }

    fn use_lines(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .filter(|item| matches!(item, Item::Use(_)))
            .map(|item| item.to_token_stream().to_string())
            .collect()
    }

    fn widget() -> File {
        parse_quote! {
            use std::fmt;

            struct Widget;

            impl Widget {
                fn get_value(&self) -> i32 {}
                fn other(&self) -> i32 { return 1; }
            }
        }
    }

    // ========================================
    // Single match
    // ========================================

    #[test]
    fn test_empty_body_gets_raise_and_imports() {
        let mut file = widget();
        let descriptor =
            ErrorDescriptor::new("pkg.MyError").with_argument(ArgumentDescriptor::ClassLiteral("MyError".into()));
        let m = MethodMatch::new(DeclSlot::member(vec![], 2, 0), descriptor, "Widget::get_value");

        let applied = apply(&mut ctx(), &mut file, &m).unwrap();

        assert_eq!(applied.imports.len(), 2);
        assert_eq!(
            use_lines(&file.items),
            [
                "use std :: fmt ;",
                "use pkg :: MyError ;",
                "use crate :: errors :: ErrorUtil ;"
            ]
        );
        // the impl moved down by two items
        let slot = DeclSlot::member(vec![], 4, 0);
        assert_eq!(body_of(&file, &slot), ["ErrorUtil :: raise (MyError :: CLASS) ;"]);
    }

    #[test]
    fn test_existing_statements_are_kept() {
        let mut file = widget();
        let m = MethodMatch::new(
            DeclSlot::member(vec![], 2, 1),
            ErrorDescriptor::standard("pkg::MyError", None, None),
            "Widget::other",
        );
        apply(&mut ctx(), &mut file, &m).unwrap();
        assert_eq!(
            body_of(&file, &DeclSlot::member(vec![], 4, 1)),
            ["return 1 ;", "ErrorUtil :: raise (MyError :: CLASS) ;"]
        );
    }

    #[test]
    fn test_malformed_descriptor_changes_nothing() {
        let mut file = widget();
        let before = file.clone();
        let m = MethodMatch::new(DeclSlot::member(vec![], 2, 0), ErrorDescriptor::new(""), "Widget::get_value");

        let err = apply(&mut ctx(), &mut file, &m).unwrap_err();

        assert!(matches!(err, RewriteError::MalformedDescriptor { .. }));
        assert_eq!(file, before);
    }

    #[test]
    fn test_missing_body_reports_match_name() {
        let mut file: File = parse_quote! {
            trait Shape {
                fn area(&self) -> f64;
            }
        };
        let before = file.clone();
        let m = MethodMatch::new(
            DeclSlot::member(vec![], 0, 0),
            ErrorDescriptor::standard("pkg::MyError", None, None),
            "Shape::area",
        );
        let err = apply(&mut ctx(), &mut file, &m).unwrap_err();
        assert_eq!(err, RewriteError::missing_body("Shape::area"));
        assert_eq!(file, before);
    }

    #[test]
    fn test_applying_twice_appends_twice() {
        let mut file = widget();
        let mut ctx = ctx();
        let m = MethodMatch::new(
            DeclSlot::member(vec![], 2, 1),
            ErrorDescriptor::standard("pkg::MyError", None, None),
            "Widget::other",
        );
        let first = apply(&mut ctx, &mut file, &m).unwrap();
        let moved = MethodMatch::new(DeclSlot::member(vec![], 4, 1), m.descriptor.clone(), "Widget::other");
        let second = apply(&mut ctx, &mut file, &moved).unwrap();

        assert_eq!(first.imports.len(), 2);
        assert!(second.imports.is_empty());
        assert_eq!(body_of(&file, &moved.slot).len(), 3);
    }

    #[test]
    fn test_imports_go_to_enclosing_module() {
        let mut file: File = parse_quote! {
            mod inner {
                pub fn stub() {}
            }
        };
        let m = MethodMatch::new(
            DeclSlot::item(vec![0], 0),
            ErrorDescriptor::standard("crate::errors::Unsupported", None, None),
            "inner::stub",
        );
        let applied = apply(&mut ctx(), &mut file, &m).unwrap();
        assert!(applied.imports.iter().all(|i| i.module == [0]));
        assert!(use_lines(&file.items).is_empty());
        let inner = crate::slot::module_items(&file, &[0]).unwrap();
        assert_eq!(use_lines(inner).len(), 2);
    }

    #[test]
    fn test_invalid_slot_is_fatal() {
        let mut file = widget();
        let m = MethodMatch::new(DeclSlot::item(vec![], 1), ErrorDescriptor::new("pkg::E"), "Widget");
        let err = apply(&mut ctx(), &mut file, &m).unwrap_err();
        assert!(err.is_fatal());
    }

    // ========================================
    // Batches
    // ========================================

    #[test]
    fn test_batch_shifts_later_slots() {
        let mut file = widget();
        let descriptor = ErrorDescriptor::standard("pkg::MyError", None, None);
        let matches = [
            MethodMatch::new(DeclSlot::member(vec![], 2, 0), descriptor.clone(), "Widget::get_value"),
            MethodMatch::new(DeclSlot::member(vec![], 2, 1), descriptor, "Widget::other"),
        ];

        let outcome = apply_all(&mut ctx(), &mut file, &matches).unwrap();

        assert_eq!(outcome.applied.len(), 2);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.applied[0].imports.len(), 2);
        assert!(outcome.applied[1].imports.is_empty());
        for done in &outcome.applied {
            assert_eq!(done.current.item, 4);
            assert_eq!(done.original.item, 2);
            assert_eq!(body_of(&file, &done.current).last().unwrap(), "ErrorUtil :: raise (MyError :: CLASS) ;");
        }
    }

    #[test]
    fn test_batch_skips_bad_matches() {
        let mut file = widget();
        let matches = [
            MethodMatch::new(DeclSlot::member(vec![], 2, 0), ErrorDescriptor::new(""), "Widget::get_value"),
            MethodMatch::new(
                DeclSlot::member(vec![], 2, 1),
                ErrorDescriptor::standard("pkg::MyError", None, None),
                "Widget::other",
            ),
        ];

        let outcome = apply_all(&mut ctx(), &mut file, &matches).unwrap();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "Widget::get_value");
        assert!(body_of(&file, &DeclSlot::member(vec![], 4, 0)).is_empty());
    }

    #[test]
    fn test_batch_aborts_on_fatal() {
        let mut file = widget();
        let matches = [MethodMatch::new(DeclSlot::item(vec![], 9), ErrorDescriptor::new("pkg::E"), "gone")];
        assert!(apply_all(&mut ctx(), &mut file, &matches).is_err());
    }

    #[test]
    fn test_qualified_class_literal_is_imported() {
        let mut file = widget();
        let descriptor = ErrorDescriptor::new("pkg::MyError")
            .with_argument(ArgumentDescriptor::ClassLiteral("pkg::MyError".into()))
            .with_argument(ArgumentDescriptor::ClassLiteral("shapes::Circle".into()));
        let m = MethodMatch::new(DeclSlot::member(vec![], 2, 0), descriptor, "Widget::get_value");
        let applied = apply(&mut ctx(), &mut file, &m).unwrap();
        let names: Vec<String> = applied.imports.iter().map(|i| i.name.to_string()).collect();
        assert_eq!(names, ["pkg::MyError", "shapes::Circle", "crate::errors::ErrorUtil"]);
    }

    // ========================================
    // Import conflicts
    // ========================================

    #[test]
    fn test_import_conflict_changes_nothing() {
        let mut file: File = parse_quote! {
            use other::MyError;

            fn stub() {}
        };
        let before = file.clone();
        let m = MethodMatch::new(
            DeclSlot::item(vec![], 1),
            ErrorDescriptor::standard("pkg::MyError", None, None),
            "stub",
        );

        let err = apply(&mut ctx(), &mut file, &m).unwrap_err();

        assert_eq!(err, RewriteError::import_conflict("pkg::MyError", "other::MyError"));
        assert!(!err.is_fatal());
        assert_eq!(file, before);
    }

    #[test]
    fn test_conflict_between_wanted_imports() {
        let mut file = widget();
        let before = file.clone();
        let descriptor =
            ErrorDescriptor::new("pkg::Error").with_argument(ArgumentDescriptor::ClassLiteral("io::Error".into()));
        let m = MethodMatch::new(DeclSlot::member(vec![], 2, 0), descriptor, "Widget::get_value");

        let err = apply(&mut ctx(), &mut file, &m).unwrap_err();

        assert_eq!(err, RewriteError::import_conflict("io::Error", "pkg::Error"));
        assert_eq!(file, before);
    }

    #[test]
    fn test_batch_skips_match_clashing_with_earlier_import() {
        let mut file = widget();
        let matches = [
            MethodMatch::new(
                DeclSlot::member(vec![], 2, 0),
                ErrorDescriptor::standard("pkg::MyError", None, None),
                "Widget::get_value",
            ),
            MethodMatch::new(
                DeclSlot::member(vec![], 2, 1),
                ErrorDescriptor::standard("other::MyError", None, None),
                "Widget::other",
            ),
        ];

        let outcome = apply_all(&mut ctx(), &mut file, &matches).unwrap();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(
            outcome.skipped[0].error,
            RewriteError::import_conflict("other::MyError", "pkg::MyError")
        );
        assert_eq!(body_of(&file, &DeclSlot::member(vec![], 4, 1)), ["return 1 ;"]);
    }
}
