//! Golden snapshot tests for rewritten sources
//!
//! These tests rewrite the `.rs` fixtures in `tests/rewrite_snapshots/` and compare the spliced output against
//! stored snapshots. This ensures output changes are reviewed and intentional.
//!
//! Run with: `cargo test --test rewrite_snapshot_tests`
//! Review changes: `cargo insta review`

use std::fs;

use throwgen::{RewriteConfig, transform_source};

/// Rewrite a source file with the default configuration
fn rewrite(source: &str) -> String {
    transform_source(source, &RewriteConfig::default())
        .expect("rewrite failed")
        .output
}

/// Load a fixture from the rewrite_snapshots directory
fn load_test_file(name: &str) -> String {
    let path = format!("tests/rewrite_snapshots/{}.rs", name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {}", path))
}

#[test]
fn test_widget_rewrite() {
    let source = load_test_file("widget");
    insta::assert_snapshot!("widget", rewrite(&source));
}

#[test]
fn test_nested_modules_rewrite() {
    let source = load_test_file("nested");
    insta::assert_snapshot!("nested_modules", rewrite(&source));
}

#[test]
fn test_fixtures_are_stable_after_rewrite() {
    for name in ["widget", "nested"] {
        let once = rewrite(&load_test_file(name));
        assert_eq!(rewrite(&once), once, "second rewrite of {name} should be a no-op");
    }
}
