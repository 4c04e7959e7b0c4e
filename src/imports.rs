//! Idempotent `use` insertion.
//!
//! The import set of a module is just its `Item::Use` items. This module only ever inserts into it; existing entries
//! are never removed, reordered or rewritten.
//!
//! ## Matching rules
//!
//! A name counts as imported when some `use` tree in the module brings in exactly that path:
//!
//! - `use a::b::C;` and `use a::b::{C, D};` and `use a::{b::C};` all import `a::b::C`.
//! - `use a::b::{self};` imports `a::b`.
//! - A leading `::` is ignored on both sides.
//! - `use a::b::C as D;` and `use a::b::*;` do not count; the plain name `C` is still not in scope under that path.
//! - A `use` behind `#[cfg(...)]` does not count either, since it is missing from some builds.
//!
//! A name whose last segment is already bound by a different path cannot be imported; adding it would not compile.

use syn::ext::IdentExt;
use syn::{Item, ItemUse, UseName, UsePath, UseTree, Visibility};

use crate::errors::RewriteError;
use crate::names::{Names, QualifiedName};

/// Make sure `items` contains a `use` for `name`.
///
/// Returns the index of the inserted item, or `None` when nothing was inserted (already present, or `name` needs no
/// import).
///
/// ## Errors
///
/// Returns [`RewriteError::MalformedDescriptor`] if a segment of `name` cannot be turned into an identifier, and
/// [`RewriteError::ImportConflict`] if another path already binds the same simple name.
pub fn ensure_import(
    items: &mut Vec<Item>,
    name: &QualifiedName,
    names: &mut Names,
) -> Result<Option<usize>, RewriteError> {
    if !needs_import(name) {
        tracing::trace!(%name, "name needs no import");
        return Ok(None);
    }
    if has_import(items, name) {
        tracing::trace!(%name, "import already present");
        return Ok(None);
    }
    if let Some(existing) = conflicting_import(items, name) {
        return Err(RewriteError::import_conflict(name.to_string(), existing));
    }

    let item = use_item(name, names)?;
    let at = insert_position(items);
    items.insert(at, item);
    tracing::debug!(%name, at, "inserted import");
    Ok(Some(at))
}

/// Whether `name` is something `ensure_import` would add a `use` for.
///
/// Single-segment names are already in scope or never will be, and `Self::` paths cannot be imported.
pub fn needs_import(name: &QualifiedName) -> bool {
    name.is_qualified() && name.segments().first().is_none_or(|s| s != "Self")
}

/// Whether some unconditional `use` item in `items` imports exactly `name`.
pub fn has_import(items: &[Item], name: &QualifiedName) -> bool {
    imported_paths(items, false)
        .iter()
        .any(|path| path.as_slice() == name.segments())
}

/// The path of a `use` in `items` that binds `name`'s simple name to something else, if any.
///
/// Gated imports are included: they clash in the builds that enable them.
pub fn conflicting_import(items: &[Item], name: &QualifiedName) -> Option<String> {
    if !needs_import(name) {
        return None;
    }
    imported_paths(items, true)
        .into_iter()
        .find(|path| path.last().map(String::as_str) == Some(name.simple_name()) && path.as_slice() != name.segments())
        .map(|path| path.join("::"))
}

/// Every plain path brought in by the `use` items of a module, flattened.
fn imported_paths(items: &[Item], include_gated: bool) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for item in items {
        if let Item::Use(item_use) = item {
            if !include_gated && is_gated(item_use) {
                continue;
            }
            let mut prefix = Vec::new();
            flatten(&item_use.tree, &mut prefix, &mut out);
        }
    }
    out
}

fn is_gated(item_use: &ItemUse) -> bool {
    item_use.attrs.iter().any(|attr| attr.path().is_ident("cfg"))
}

fn flatten(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.unraw().to_string());
            flatten(&path.tree, prefix, out);
            prefix.pop();
        }
        // `a::{self}` imports `a` itself
        UseTree::Name(leaf) if leaf.ident == "self" => out.push(prefix.clone()),
        UseTree::Name(leaf) => {
            let mut full = prefix.clone();
            full.push(leaf.ident.unraw().to_string());
            out.push(full);
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                flatten(tree, prefix, out);
            }
        }
        UseTree::Rename(_) | UseTree::Glob(_) => {}
    }
}

/// After the last `use`; otherwise after leading `extern crate` items; otherwise first.
fn insert_position(items: &[Item]) -> usize {
    if let Some(last_use) = items.iter().rposition(|item| matches!(item, Item::Use(_))) {
        return last_use + 1;
    }
    items
        .iter()
        .take_while(|item| matches!(item, Item::ExternCrate(_)))
        .count()
}

pub(crate) fn use_item(name: &QualifiedName, names: &mut Names) -> Result<Item, RewriteError> {
    let span = names.span();
    let mut idents = name
        .segments()
        .iter()
        .map(|segment| names.ident(segment))
        .collect::<Result<Vec<_>, _>>()?;
    let last = idents
        .pop()
        .ok_or_else(|| RewriteError::malformed("import path is empty"))?;

    let mut tree = UseTree::Name(UseName { ident: last });
    for ident in idents.into_iter().rev() {
        tree = UseTree::Path(UsePath {
            ident,
            colon2_token: syn::Token![::](span),
            tree: Box::new(tree),
        });
    }

    Ok(Item::Use(ItemUse {
        attrs: Vec::new(),
        vis: Visibility::Inherited,
        use_token: syn::Token![use](span),
        leading_colon: name.has_leading_colon().then(|| syn::Token![::](span)),
        tree,
        semi_token: syn::Token![;](span),
    }))
}
