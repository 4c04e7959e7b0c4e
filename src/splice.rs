//! Format-preserving output.
//!
//! Re-rendering a whole file with `prettyplease` loses comments and the author's layout. Splicing instead turns a
//! batch [`Outcome`] into a handful of text edits against the original source:
//!
//! - the synthesized statement is inserted before the closing brace of each rewritten body,
//! - a tail expression that is no longer last gets a `;`,
//! - inserted imports become `use` lines next to the module's existing imports,
//! - stripped markers are cut out (with their line, when they sit alone on it).
//!
//! Everything else is copied byte for byte. Positions come from `proc-macro2` span locations, so the original tree
//! must have been parsed from exactly the text handed to [`splice`].
//!
//! Only the new statement and `use` lines are rendered, each through `prettyplease`.

use std::collections::HashSet;

use proc_macro2::{LineColumn, Span};
use quote::{ToTokens, quote};
use syn::{Attribute, Block, File, Item, Stmt};
use thiserror::Error;

use crate::config::RewriteConfig;
use crate::discovery;
use crate::dispatch::Outcome;
use crate::errors::RewriteError;
use crate::imports;
use crate::names::{Names, QualifiedName};
use crate::rewrite;
use crate::slot::{self, DeclSlot};

const INDENT: &str = "    ";

/// Why an outcome could not be spliced into the original text.
#[derive(Debug, Error)]
pub enum SpliceError {
    #[error(transparent)]
    Slot(#[from] RewriteError),
    #[error("span {line}:{column} is outside the source text")]
    Position { line: usize, column: usize },
    #[error("overlapping edits at byte {offset}")]
    Overlap { offset: usize },
    #[error("failed to render generated code: {0}")]
    Render(#[from] syn::Error),
}

/// One replacement of `source[start..end]`. Insertions have `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Apply `outcome` to `source`, which `original` was parsed from.
///
/// ## Errors
///
/// Fails if a slot in `outcome` does not resolve against `original`, if a span points outside `source`, or if two
/// edits overlap (which means `original` does not belong to `source`).
#[tracing::instrument(skip_all, fields(source_len = source.len(), applied = outcome.applied.len()))]
pub fn splice(source: &str, original: &File, outcome: &Outcome, config: &RewriteConfig) -> Result<String, SpliceError> {
    let text = SourceText::new(source);
    let mut edits = Vec::new();

    for done in &outcome.applied {
        let decl = done.original.resolve(original)?;
        let body = decl
            .body()
            .ok_or_else(|| RewriteError::missing_body(&done.name))?;
        body_edits(&text, body, &done.statement, &mut edits)?;

        if config.strip_markers {
            for attr in decl.attrs().iter().filter(|a| discovery::is_marker(a, &config.marker)) {
                edits.push(marker_removal(&text, attr)?);
            }
        }
    }

    import_edits(&text, original, outcome, &mut edits)?;
    apply_edits(source, edits)
}

fn body_edits(text: &SourceText<'_>, body: &Block, stmt: &Stmt, edits: &mut Vec<Edit>) -> Result<(), SpliceError> {
    let open = text.offset(body.brace_token.span.open().end())?;
    let close = text.offset(body.brace_token.span.close().start())?;
    let indent = text.indent_at(close);
    let inner = format!("{indent}{INDENT}");
    let lines = render_stmt(stmt)?;

    if let Some(tail) = body.stmts.last().filter(|s| rewrite::needs_terminator(s)) {
        let end = last_span(tail).map(|s| text.offset(s.end())).transpose()?;
        if let Some(end) = end {
            edits.push(Edit::insert(end, ";"));
        }
    }

    let edit = if text.slice(open, close).trim().is_empty() {
        // `{}` or `{ }`: open it up onto its own lines
        let mut block = String::from(text.eol);
        for line in &lines {
            block.push_str(&format!("{inner}{line}{}", text.eol));
        }
        block.push_str(indent);
        Edit {
            start: open,
            end: close,
            text: block,
        }
    } else if text.blank_before(close) {
        let mut block = String::new();
        for line in &lines {
            block.push_str(&format!("{inner}{line}{}", text.eol));
        }
        Edit::insert(text.line_start(close), block)
    } else {
        // single-line body: `{ return 1; }`
        let pad = if text.slice(0, close).ends_with(char::is_whitespace) { "" } else { " " };
        Edit::insert(close, format!("{pad}{} ", lines.join(" ")))
    };
    edits.push(edit);
    Ok(())
}

/// Cut a marker attribute, taking its whole line when nothing else is on it.
fn marker_removal(text: &SourceText<'_>, attr: &Attribute) -> Result<Edit, SpliceError> {
    let (Some(first), Some(last)) = (first_span(attr), last_span(attr)) else {
        return Err(SpliceError::Position { line: 0, column: 0 });
    };
    let start = text.offset(first.start())?;
    let end = text.offset(last.end())?;

    if text.blank_before(start) && text.blank_after(end) {
        Ok(Edit {
            start: text.line_start(start),
            end: text.next_line_start(end),
            text: String::new(),
        })
    } else {
        let trailing = text.slice(end, text.source.len()).len()
            - text.slice(end, text.source.len()).trim_start_matches([' ', '\t']).len();
        Ok(Edit {
            start,
            end: end + trailing,
            text: String::new(),
        })
    }
}

/// One `use` block per module that gained imports.
fn import_edits(
    text: &SourceText<'_>,
    original: &File,
    outcome: &Outcome,
    edits: &mut Vec<Edit>,
) -> Result<(), SpliceError> {
    let mut modules: Vec<(&[usize], Vec<&QualifiedName>)> = Vec::new();
    for done in &outcome.applied {
        if done.imports.is_empty() {
            continue;
        }
        let module = done.original.module.as_slice();
        let entry = match modules.iter_mut().position(|(m, _)| *m == module) {
            Some(idx) => &mut modules[idx].1,
            None => {
                modules.push((module, Vec::new()));
                let last = modules.len() - 1;
                &mut modules[last].1
            }
        };
        for name in &done.imports {
            if !entry.contains(&name) {
                entry.push(name);
            }
        }
    }

    let mut names = Names::new();
    for (module, wanted) in modules {
        let items = slot::module_items(original, module).ok_or_else(|| RewriteError::InvalidSlot {
            slot: DeclSlot::item(module.to_vec(), 0).to_string(),
        })?;
        let mut lines = Vec::new();
        for name in wanted {
            lines.extend(render_use(name, &mut names)?);
        }
        edits.push(use_block(text, items, &lines)?);
    }
    Ok(())
}

/// Place `lines` after the last `use` (or leading `extern crate`), else before the first item.
fn use_block(text: &SourceText<'_>, items: &[Item], lines: &[String]) -> Result<Edit, SpliceError> {
    let anchor = items
        .iter()
        .rposition(|item| matches!(item, Item::Use(_)))
        .or_else(|| {
            items
                .iter()
                .take_while(|item| matches!(item, Item::ExternCrate(_)))
                .count()
                .checked_sub(1)
        });

    if let Some(idx) = anchor {
        let Some(last) = last_span(&items[idx]) else {
            return Err(SpliceError::Position { line: 0, column: 0 });
        };
        let end = text.offset(last.end())?;
        let indent = text.indent_at(end).to_string();
        // a trailing `// comment` stays with its own `use`
        if text.blank_after(end) || text.comment_after(end) {
            let at = text.next_line_start(end);
            let mut block = String::new();
            if at == text.source.len() && !text.source.ends_with('\n') {
                block.push_str(text.eol);
            }
            for line in lines {
                block.push_str(&format!("{indent}{line}{}", text.eol));
            }
            return Ok(Edit::insert(at, block));
        }
        let block: String = lines.iter().map(|line| format!("{}{indent}{line}", text.eol)).collect();
        return Ok(Edit::insert(end, block));
    }

    match items.first().and_then(|item| first_span(item)) {
        Some(first) => {
            let start = text.offset(first.start())?;
            if text.blank_before(start) {
                let indent = text.indent_at(start).to_string();
                let mut block = String::new();
                for line in lines {
                    block.push_str(&format!("{indent}{line}{}", text.eol));
                }
                block.push_str(text.eol);
                Ok(Edit::insert(text.line_start(start), block))
            } else {
                Ok(Edit::insert(start, format!("{} ", lines.join(" "))))
            }
        }
        None => {
            let mut block = String::new();
            if !text.source.is_empty() && !text.source.ends_with('\n') {
                block.push_str(text.eol);
            }
            for line in lines {
                block.push_str(&format!("{line}{}", text.eol));
            }
            Ok(Edit::insert(text.source.len(), block))
        }
    }
}

fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, SpliceError> {
    // Identical removals come from a declaration listed twice.
    let mut seen = HashSet::new();
    edits.retain(|e| !e.text.is_empty() || seen.insert((e.start, e.end)));
    // Stable: insertions at the same offset keep their order.
    edits.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(source.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in edits {
        if edit.start < cursor {
            return Err(SpliceError::Overlap { offset: edit.start });
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    tracing::debug!(before = source.len(), after = out.len(), "spliced source");
    Ok(out)
}

/// Render a statement the way `prettyplease` would inside a function body, one entry per line.
fn render_stmt(stmt: &Stmt) -> Result<Vec<String>, SpliceError> {
    let wrapper: File = syn::parse2(quote! { fn __throwgen() { #stmt } })?;
    let rendered = prettyplease::unparse(&wrapper);
    let lines: Vec<&str> = rendered.lines().collect();
    // drop the `fn` header and the closing brace
    let body = lines.get(1..lines.len().saturating_sub(1)).unwrap_or_default();
    Ok(body
        .iter()
        .map(|line| line.strip_prefix(INDENT).unwrap_or(line).to_string())
        .collect())
}

fn render_use(name: &QualifiedName, names: &mut Names) -> Result<Vec<String>, SpliceError> {
    let item = imports::use_item(name, names)?;
    let rendered = prettyplease::unparse(&File {
        shebang: None,
        attrs: Vec::new(),
        items: vec![item],
    });
    Ok(rendered.lines().map(str::to_string).collect())
}

fn first_span(node: &impl ToTokens) -> Option<Span> {
    node.to_token_stream().into_iter().next().map(|tt| tt.span())
}

fn last_span(node: &impl ToTokens) -> Option<Span> {
    node.to_token_stream().into_iter().last().map(|tt| tt.span())
}

impl Edit {
    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }
}

/// Source text with a line index for span conversion.
struct SourceText<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
    /// Line ending for inserted lines, taken from the first line of the source.
    eol: &'static str,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(idx, _)| idx + 1));
        let eol = match source.find('\n') {
            Some(idx) if source[..idx].ends_with('\r') => "\r\n",
            _ => "\n",
        };
        Self {
            source,
            line_starts,
            eol,
        }
    }

    /// Byte offset of a span location (1-based line, 0-based column in characters).
    fn offset(&self, at: LineColumn) -> Result<usize, SpliceError> {
        let out_of_range = || SpliceError::Position {
            line: at.line,
            column: at.column,
        };
        let start = *at
            .line
            .checked_sub(1)
            .and_then(|line| self.line_starts.get(line))
            .ok_or_else(out_of_range)?;
        let rest = &self.source[start..];
        match rest.char_indices().nth(at.column) {
            Some((idx, _)) => Ok(start + idx),
            // one past the last character of the file
            None if rest.chars().count() == at.column => Ok(self.source.len()),
            None => Err(out_of_range()),
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    fn line_start(&self, offset: usize) -> usize {
        self.source[..offset].rfind('\n').map_or(0, |idx| idx + 1)
    }

    /// Offset just past the newline that ends `offset`'s line, or the end of the text.
    fn next_line_start(&self, offset: usize) -> usize {
        self.source[offset..]
            .find('\n')
            .map_or(self.source.len(), |idx| offset + idx + 1)
    }

    /// Leading whitespace of the line containing `offset`.
    fn indent_at(&self, offset: usize) -> &'a str {
        let start = self.line_start(offset);
        let line = &self.source[start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }

    fn blank_before(&self, offset: usize) -> bool {
        self.source[self.line_start(offset)..offset].trim().is_empty()
    }

    fn blank_after(&self, offset: usize) -> bool {
        self.rest_of_line(offset).trim().is_empty()
    }

    /// Whether only a line comment follows `offset` on its line.
    fn comment_after(&self, offset: usize) -> bool {
        self.rest_of_line(offset).trim_start().starts_with("//")
    }

    fn rest_of_line(&self, offset: usize) -> &'a str {
        let end = self.source[offset..].find('\n').map_or(self.source.len(), |idx| offset + idx);
        &self.source[offset..end]
    }
}
