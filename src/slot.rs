//! Declaration slots: the host tree's replacement facility.
//!
//! The core never holds references into the tree across a mutation. Instead a declaration is addressed by a
//! [`DeclSlot`] (a path of indices), resolved to a borrowed [`DeclRef`] when it needs to be read, and written back with
//! [`DeclSlot::install_body`] once a replacement block has been built.
//!
//! ## Notes
//!
//! - Index paths go stale when items are inserted in front of them. Whoever inserts (the import manager, via the
//!   dispatcher) reports the insertion and [`DeclSlot::shift_for_insert`] re-addresses the slot.
//! - Only inline modules (`mod m { ... }`) are walked; out-of-line modules are separate files and separate passes.

use std::fmt;

use syn::{Attribute, Block, File, ForeignItem, ForeignItemFn, ImplItem, ImplItemFn, Item, ItemFn, TraitItem, TraitItemFn};

use crate::errors::RewriteError;

/// Index path to one function-like declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclSlot {
    /// Indices of the enclosing inline modules, outermost first.
    pub module: Vec<usize>,
    /// Index of the item inside the innermost module.
    pub item: usize,
    /// Index of the member inside an impl block, trait or extern block.
    pub member: Option<usize>,
}

/// A resolved declaration, tagged by kind.
#[derive(Debug, Clone, Copy)]
pub enum DeclRef<'a> {
    Fn(&'a ItemFn),
    ImplFn(&'a ImplItemFn),
    TraitFn(&'a TraitItemFn),
    ForeignFn(&'a ForeignItemFn),
}

enum DeclMut<'a> {
    Fn(&'a mut ItemFn),
    ImplFn(&'a mut ImplItemFn),
    TraitFn(&'a mut TraitItemFn),
    ForeignFn(&'a mut ForeignItemFn),
}

impl<'a> DeclRef<'a> {
    pub fn ident(&self) -> &'a syn::Ident {
        match *self {
            DeclRef::Fn(f) => &f.sig.ident,
            DeclRef::ImplFn(f) => &f.sig.ident,
            DeclRef::TraitFn(f) => &f.sig.ident,
            DeclRef::ForeignFn(f) => &f.sig.ident,
        }
    }

    pub fn attrs(&self) -> &'a [Attribute] {
        match *self {
            DeclRef::Fn(f) => &f.attrs,
            DeclRef::ImplFn(f) => &f.attrs,
            DeclRef::TraitFn(f) => &f.attrs,
            DeclRef::ForeignFn(f) => &f.attrs,
        }
    }

    /// The body block, if the declaration has one.
    pub fn body(&self) -> Option<&'a Block> {
        match *self {
            DeclRef::Fn(f) => Some(&f.block),
            DeclRef::ImplFn(f) => Some(&f.block),
            DeclRef::TraitFn(f) => f.default.as_ref(),
            DeclRef::ForeignFn(_) => None,
        }
    }
}

impl DeclSlot {
    /// A free function at `module`/`item`.
    pub fn item(module: Vec<usize>, item: usize) -> Self {
        Self {
            module,
            item,
            member: None,
        }
    }

    /// A member of an impl block, trait or extern block at `module`/`item`.
    pub fn member(module: Vec<usize>, item: usize, member: usize) -> Self {
        Self {
            module,
            item,
            member: Some(member),
        }
    }

    fn invalid(&self) -> RewriteError {
        RewriteError::InvalidSlot { slot: self.to_string() }
    }

    /// Borrow the declaration this slot points at.
    pub fn resolve<'a>(&self, file: &'a File) -> Result<DeclRef<'a>, RewriteError> {
        let items = module_items(file, &self.module).ok_or_else(|| self.invalid())?;
        let item = items.get(self.item).ok_or_else(|| self.invalid())?;
        let decl = match (item, self.member) {
            (Item::Fn(f), None) => DeclRef::Fn(f),
            (Item::Impl(block), Some(m)) => match block.items.get(m) {
                Some(ImplItem::Fn(f)) => DeclRef::ImplFn(f),
                _ => return Err(self.invalid()),
            },
            (Item::Trait(t), Some(m)) => match t.items.get(m) {
                Some(TraitItem::Fn(f)) => DeclRef::TraitFn(f),
                _ => return Err(self.invalid()),
            },
            (Item::ForeignMod(fm), Some(m)) => match fm.items.get(m) {
                Some(ForeignItem::Fn(f)) => DeclRef::ForeignFn(f),
                _ => return Err(self.invalid()),
            },
            _ => return Err(self.invalid()),
        };
        Ok(decl)
    }

    fn resolve_mut<'a>(&self, file: &'a mut File) -> Result<DeclMut<'a>, RewriteError> {
        let invalid = self.invalid();
        let items = module_items_mut(file, &self.module).ok_or_else(|| invalid.clone())?;
        let item = items.get_mut(self.item).ok_or_else(|| invalid.clone())?;
        let decl = match (item, self.member) {
            (Item::Fn(f), None) => DeclMut::Fn(f),
            (Item::Impl(block), Some(m)) => match block.items.get_mut(m) {
                Some(ImplItem::Fn(f)) => DeclMut::ImplFn(f),
                _ => return Err(invalid),
            },
            (Item::Trait(t), Some(m)) => match t.items.get_mut(m) {
                Some(TraitItem::Fn(f)) => DeclMut::TraitFn(f),
                _ => return Err(invalid),
            },
            (Item::ForeignMod(fm), Some(m)) => match fm.items.get_mut(m) {
                Some(ForeignItem::Fn(f)) => DeclMut::ForeignFn(f),
                _ => return Err(invalid),
            },
            _ => return Err(invalid),
        };
        Ok(decl)
    }

    /// Replace the declaration's body with `block`.
    ///
    /// Foreign functions have nowhere to put a body; installing into one is a slot error.
    pub fn install_body(&self, file: &mut File, block: Block) -> Result<(), RewriteError> {
        match self.resolve_mut(file)? {
            DeclMut::Fn(f) => *f.block = block,
            DeclMut::ImplFn(f) => f.block = block,
            DeclMut::TraitFn(f) => f.default = Some(block),
            DeclMut::ForeignFn(_) => return Err(self.invalid()),
        }
        Ok(())
    }

    /// Mutable access to the declaration's outer attributes.
    pub fn attrs_mut<'a>(&self, file: &'a mut File) -> Result<&'a mut Vec<Attribute>, RewriteError> {
        Ok(match self.resolve_mut(file)? {
            DeclMut::Fn(f) => &mut f.attrs,
            DeclMut::ImplFn(f) => &mut f.attrs,
            DeclMut::TraitFn(f) => &mut f.attrs,
            DeclMut::ForeignFn(f) => &mut f.attrs,
        })
    }

    /// The item list of the module that encloses this declaration.
    pub fn enclosing_items_mut<'a>(&self, file: &'a mut File) -> Result<&'a mut Vec<Item>, RewriteError> {
        let invalid = self.invalid();
        module_items_mut(file, &self.module).ok_or(invalid)
    }

    /// Re-address this slot after an item was inserted at index `at` of module `module`.
    pub fn shift_for_insert(&mut self, module: &[usize], at: usize) {
        let depth = module.len();
        if self.module.len() > depth && self.module[..depth] == *module {
            // The insertion happened in an ancestor module, in front of (or at) our enclosing `mod` item.
            if self.module[depth] >= at {
                self.module[depth] += 1;
            }
        } else if self.module == module && self.item >= at {
            self.item += 1;
        }
    }
}

impl fmt::Display for DeclSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for idx in &self.module {
            write!(f, "mod#{idx}/")?;
        }
        write!(f, "item#{}", self.item)?;
        if let Some(member) = self.member {
            write!(f, "/member#{member}")?;
        }
        Ok(())
    }
}

/// Walk `module` (indices of inline `mod` items) down from the file root.
pub fn module_items<'a>(file: &'a File, module: &[usize]) -> Option<&'a [Item]> {
    let mut items: &'a [Item] = &file.items;
    for &idx in module {
        items = match items.get(idx) {
            Some(Item::Mod(syn::ItemMod {
                content: Some((_, inner)), ..
            })) => inner.as_slice(),
            _ => return None,
        };
    }
    Some(items)
}

/// Mutable counterpart of [`module_items`].
pub fn module_items_mut<'a>(file: &'a mut File, module: &[usize]) -> Option<&'a mut Vec<Item>> {
    let mut items = &mut file.items;
    for &idx in module {
        items = match items.get_mut(idx) {
            Some(Item::Mod(syn::ItemMod {
                content: Some((_, inner)), ..
            })) => inner,
            _ => return None,
        };
    }
    Some(items)
}
