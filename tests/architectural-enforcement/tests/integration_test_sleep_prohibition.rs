//! Integration Test: Sleep Prohibition
//!
//! **Policy**: The state machines and the headless surface MUST NOT call sleep
//! methods. Every wait is on a gateway response, a watch channel or a task
//! handle. Ordering in tests is controlled with gateway gates, never timers.

use architectural_enforcement::{production_code, PRODUCTION_DIRS};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for (path, lines) in production_code(dir) {
            for line in lines {
                if is_sleep_call(&line.code) {
                    violations.push(format!(
                        "{}:{} - {}",
                        path.display(),
                        line.number,
                        line.code.trim()
                    ));
                }
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Wait on the gateway future, a watch receiver or a JoinHandle instead.");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(") || code.contains("sleep_until(")
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep_call("    tokio::time::sleep(Duration::from_millis(10)).await;"));
    assert!(is_sleep_call("std::thread::sleep(d);"));
    assert!(!is_sleep_call("let asleep = false;"));
}
