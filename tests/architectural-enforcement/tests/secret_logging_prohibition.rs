//! Integration Test: Secret Logging Prohibition
//!
//! **Policy**: Passwords MUST NOT appear in log output. No `tracing` macro
//! invocation in production code may mention a password field, and types
//! that carry one implement a redacting `Debug`.

use architectural_enforcement::{production_code, CodeLine, PRODUCTION_DIRS};

const LOG_MACROS: &[&str] = &["trace!(", "debug!(", "info!(", "warn!(", "error!("];

#[test]
fn test_no_password_in_log_statements() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for (path, lines) in production_code(dir) {
            for (number, statement) in log_statements(&lines) {
                if statement.to_lowercase().contains("password") {
                    violations.push(format!("{}:{} - {}", path.display(), number, statement));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found log statements that mention a password:\n  {}",
        violations.join("\n  ")
    );
}

/// Join each log macro invocation into one string, keyed by its first line
fn log_statements(lines: &[CodeLine]) -> Vec<(usize, String)> {
    let mut statements = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for line in lines {
        let code = line.code.trim();
        if current.is_none() && LOG_MACROS.iter().any(|m| code.contains(m)) {
            current = Some((line.number, String::new()));
        }
        if let Some((number, mut text)) = current.take() {
            text.push_str(code);
            text.push(' ');
            if code.ends_with(';') || code.ends_with("),") {
                statements.push((number, text));
            } else {
                current = Some((number, text));
            }
        }
    }
    if let Some(open) = current {
        statements.push(open);
    }
    statements
}

#[test]
fn test_multi_line_statement_is_joined() {
    let lines: Vec<CodeLine> = [
        "tracing::info!(",
        "    phone = %phone,",
        "    password = %password,",
        "    \"Login\"",
        ");",
        "let password = read();",
    ]
    .iter()
    .enumerate()
    .map(|(idx, code)| CodeLine {
        number: idx + 1,
        code: (*code).to_string(),
    })
    .collect();

    let statements = log_statements(&lines);
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].0, 1);
    assert!(statements[0].1.contains("password"));
}
