//! Rust keyword vocabulary (for identifier escaping in constructed nodes).

/// Reserved + strict keywords that can be written as raw identifiers (`r#type`).
pub const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let",
    "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type",
    "unsafe", "use", "where", "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Keywords that start a path and can never be raw identifiers.
pub const PATH_ROOTS: &[&str] = &["crate", "self", "super", "Self"];

/// Check whether an identifier is a keyword that needs the `r#` prefix.
pub fn is_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}

/// Check whether an identifier is a path-root keyword (`crate`, `self`, `super`, `Self`).
pub fn is_path_root(name: &str) -> bool {
    PATH_ROOTS.contains(&name)
}
