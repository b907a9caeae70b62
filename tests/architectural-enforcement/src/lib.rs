//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code (state machines wait on I/O only)
//! - No panicking shortcuts in the core library
//! - Passwords never reach log output
//!
//! The helpers here walk the workspace sources and hand each test the
//! production part of every file, so checks do not trip over test modules.

use std::fs;
use std::path::{Path, PathBuf};

/// Source directories scanned by the enforcement tests, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["client/core/src", "client/headless/src"];

/// Workspace root, resolved from this package's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir` (relative to the workspace root)
///
/// # Panics
///
/// Panics if `dir` does not exist, so a moved crate cannot make a check pass
/// vacuously.
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    assert!(path.exists(), "source directory missing: {}", path.display());

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// A line of production code with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    /// 1-based line number
    pub number: usize,
    /// Line text with any trailing `//` comment removed
    pub code: String,
}

/// Production lines of a source file
///
/// Everything from the first `#[cfg(test)]` onwards is treated as test code.
/// Comment-only lines are dropped and trailing comments are stripped.
#[must_use]
pub fn production_lines(content: &str) -> Vec<CodeLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .filter_map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line);
            if code.trim().is_empty() {
                return None;
            }
            Some(CodeLine {
                number: idx + 1,
                code: code.to_string(),
            })
        })
        .collect()
}

/// Production lines of every source file under `dir`, paired with their file
#[must_use]
pub fn production_code(dir: &str) -> Vec<(PathBuf, Vec<CodeLine>)> {
    rust_sources(dir)
        .into_iter()
        .filter_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            let lines = production_lines(&content);
            Some((path, lines))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\nlet x = 1; // trailing\n#[cfg(test)]\nfn b() {}\n";
        let lines = production_lines(source);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].number, 3);
        assert_eq!(lines[1].code.trim(), "let x = 1;");
    }

    #[test]
    fn test_doc_comments_are_skipped() {
        let lines = production_lines("//! crate docs\n/// item docs\npub fn f() {}\n");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_scanned_directories_exist() {
        for dir in PRODUCTION_DIRS {
            assert!(!rust_sources(dir).is_empty(), "{dir} has no sources");
        }
    }
}
