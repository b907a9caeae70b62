//! Integration Test: Panic Prohibition
//!
//! **Policy**: The core library reports every failure through published state
//! or a `Result`. Production code MUST NOT call `unwrap()`, `expect()`,
//! `panic!` or `unreachable!`. Test modules are exempt.

use architectural_enforcement::production_code;

const FORBIDDEN: &[&str] = &[".unwrap()", ".expect(", "panic!(", "unreachable!("];

#[test]
fn test_no_panicking_shortcuts_in_core() {
    let mut violations = Vec::new();

    for (path, lines) in production_code("client/core/src") {
        for line in lines {
            if let Some(pattern) = forbidden_pattern(&line.code) {
                violations.push(format!(
                    "{}:{} - {} ({pattern})",
                    path.display(),
                    line.number,
                    line.code.trim()
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found panicking calls in core production code:\n  {}",
        violations.join("\n  ")
    );
}

fn forbidden_pattern(code: &str) -> Option<&'static str> {
    FORBIDDEN.iter().copied().find(|p| code.contains(p))
}

#[test]
fn test_forbidden_pattern_detection() {
    assert_eq!(forbidden_pattern("let x = y.unwrap();"), Some(".unwrap()"));
    assert_eq!(forbidden_pattern("opt.expect(\"set\")"), Some(".expect("));
    assert_eq!(forbidden_pattern("v.unwrap_or_default()"), None);
    assert_eq!(forbidden_pattern("v.unwrap_or_else(|| 0)"), None);
}
