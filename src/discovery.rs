//! Marker discovery: find the declarations to stub.
//!
//! A declaration is selected when one of its outer attributes is the configured marker. The marker is recognized by
//! the last segment of the attribute path, so `#[unsupported_operation]` and `#[throwgen::unsupported_operation]`
//! are the same marker.
//!
//! ## Marker arguments
//!
//! ```text
//! #[unsupported_operation]
//! #[unsupported_operation(error = my_crate::errors::NotSupported)]
//! #[unsupported_operation(error = "my_crate::errors::NotSupported", message = "no streaming yet", pass_owner)]
//! ```
//!
//! - `error`: the error type, as a path or a string. Defaults to the configured default error.
//! - `message`: passed to the helper as a string literal.
//! - `pass_owner` / `pass_owner = true`: pass the owning type (impl self type or trait) as a class literal.
//!
//! The error name is not validated here; a bad name surfaces as a malformed descriptor when the match is applied.

use syn::ext::IdentExt;
use syn::{Attribute, File, ForeignItem, ImplItem, Item, ItemImpl, LitBool, LitStr, Meta, TraitItem, Type};

use crate::config::RewriteConfig;
use crate::descriptor::{ErrorDescriptor, MethodMatch};
use crate::errors::RewriteError;
use crate::slot::DeclSlot;

/// Result of scanning one file.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub matches: Vec<MethodMatch>,
    /// Markers that could not be understood. Their declarations are not matched.
    pub problems: Vec<RewriteError>,
}

/// Whether `attr` is the marker named `marker`.
pub fn is_marker(attr: &Attribute, marker: &str) -> bool {
    attr.path().segments.last().is_some_and(|segment| segment.ident == marker)
}

/// Scan `file` for marked declarations.
#[tracing::instrument(skip_all, fields(item_count = file.items.len()))]
pub fn discover(file: &File, config: &RewriteConfig) -> Discovery {
    let mut walker = Walker {
        config,
        module: Vec::new(),
        path: Vec::new(),
        found: Discovery::default(),
    };
    walker.items(&file.items);
    tracing::debug!(
        matches = walker.found.matches.len(),
        problems = walker.found.problems.len(),
        "discovery finished"
    );
    walker.found
}

struct Walker<'c> {
    config: &'c RewriteConfig,
    /// Indices of the inline modules we are inside.
    module: Vec<usize>,
    /// Names of those modules, for diagnostics.
    path: Vec<String>,
    found: Discovery,
}

impl Walker<'_> {
    fn items(&mut self, items: &[Item]) {
        for (idx, item) in items.iter().enumerate() {
            match item {
                Item::Fn(f) => {
                    let slot = DeclSlot::item(self.module.clone(), idx);
                    self.visit(&f.attrs, &f.sig.ident, slot, Owner::None);
                }
                Item::Impl(block) => {
                    let owner = impl_owner(block);
                    for (member, impl_item) in block.items.iter().enumerate() {
                        if let ImplItem::Fn(f) = impl_item {
                            let slot = DeclSlot::member(self.module.clone(), idx, member);
                            self.visit(&f.attrs, &f.sig.ident, slot, owner.clone());
                        }
                    }
                }
                Item::Trait(t) => {
                    let owner = Owner::Named(t.ident.unraw().to_string());
                    for (member, trait_item) in t.items.iter().enumerate() {
                        if let TraitItem::Fn(f) = trait_item {
                            let slot = DeclSlot::member(self.module.clone(), idx, member);
                            self.visit(&f.attrs, &f.sig.ident, slot, owner.clone());
                        }
                    }
                }
                Item::ForeignMod(block) => {
                    for (member, foreign_item) in block.items.iter().enumerate() {
                        if let ForeignItem::Fn(f) = foreign_item {
                            let slot = DeclSlot::member(self.module.clone(), idx, member);
                            self.visit(&f.attrs, &f.sig.ident, slot, Owner::None);
                        }
                    }
                }
                Item::Mod(m) => {
                    if let Some((_, inner)) = &m.content {
                        self.module.push(idx);
                        self.path.push(m.ident.unraw().to_string());
                        self.items(inner);
                        self.path.pop();
                        self.module.pop();
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, attrs: &[Attribute], ident: &syn::Ident, slot: DeclSlot, owner: Owner) {
        let mut markers = attrs.iter().filter(|attr| is_marker(attr, &self.config.marker));
        let Some(marker) = markers.next() else {
            return;
        };

        let name = self.display_name(ident, &owner);
        if markers.next().is_some() {
            tracing::warn!(decl = %name, "declaration carries the marker more than once; using the first");
        }

        match parse_marker(marker) {
            Ok(args) => {
                let owner_name = if args.pass_owner {
                    match &owner {
                        Owner::Named(owner) => Some(owner.clone()),
                        Owner::Unnamed => {
                            tracing::warn!(decl = %name, "impl self type has no simple name; `pass_owner` ignored");
                            None
                        }
                        Owner::None => {
                            tracing::warn!(decl = %name, "`pass_owner` on a declaration without an owning type");
                            None
                        }
                    }
                } else {
                    None
                };
                let error = args.error.unwrap_or_else(|| self.config.default_error.clone());
                let descriptor = ErrorDescriptor::standard(error, args.message, owner_name);
                tracing::trace!(decl = %name, %slot, "found marked declaration");
                self.found.matches.push(MethodMatch::new(slot, descriptor, name));
            }
            Err(err) => {
                let problem = RewriteError::invalid_marker(&name, err.to_string());
                tracing::warn!(decl = %name, error = %problem, "ignoring malformed marker");
                self.found.problems.push(problem);
            }
        }
    }

    fn display_name(&self, ident: &syn::Ident, owner: &Owner) -> String {
        let mut parts = self.path.clone();
        if let Owner::Named(owner) = owner {
            parts.push(owner.clone());
        }
        parts.push(ident.unraw().to_string());
        parts.join("::")
    }
}

#[derive(Debug, Clone)]
enum Owner {
    /// Free or foreign function.
    None,
    /// Impl block whose self type is not a plain path (`impl Trait for &T`, tuples, ...).
    Unnamed,
    Named(String),
}

fn impl_owner(block: &ItemImpl) -> Owner {
    match &*block.self_ty {
        Type::Path(ty) => ty
            .path
            .segments
            .last()
            .map_or(Owner::Unnamed, |segment| Owner::Named(segment.ident.unraw().to_string())),
        _ => Owner::Unnamed,
    }
}

#[derive(Debug, Default)]
struct MarkerArgs {
    error: Option<String>,
    message: Option<String>,
    pass_owner: bool,
}

fn parse_marker(attr: &Attribute) -> syn::Result<MarkerArgs> {
    let mut args = MarkerArgs::default();
    match &attr.meta {
        Meta::Path(_) => return Ok(args),
        Meta::NameValue(nv) => {
            return Err(syn::Error::new_spanned(nv, "expected `#[marker]` or `#[marker(...)]`"));
        }
        Meta::List(_) => {}
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("error") {
            if args.error.is_some() {
                return Err(meta.error("duplicate `error` argument"));
            }
            let value = meta.value()?;
            let error = if value.peek(LitStr) {
                value.parse::<LitStr>()?.value()
            } else {
                plain_path(&value.parse::<syn::Path>()?)?
            };
            args.error = Some(error);
            Ok(())
        } else if meta.path.is_ident("message") {
            if args.message.is_some() {
                return Err(meta.error("duplicate `message` argument"));
            }
            args.message = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else if meta.path.is_ident("pass_owner") {
            args.pass_owner = if meta.input.peek(syn::Token![=]) {
                meta.value()?.parse::<LitBool>()?.value
            } else {
                true
            };
            Ok(())
        } else {
            Err(meta.error("unknown marker argument"))
        }
    })?;
    Ok(args)
}

fn plain_path(path: &syn::Path) -> syn::Result<String> {
    let mut out = String::new();
    if path.leading_colon.is_some() {
        out.push_str("::");
    }
    for (idx, segment) in path.segments.iter().enumerate() {
        if !segment.arguments.is_none() {
            return Err(syn::Error::new_spanned(segment, "error type must be a plain path without generics"));
        }
        if idx > 0 {
            out.push_str("::");
        }
        out.push_str(&segment.ident.unraw().to_string());
    }
    Ok(out)
}
