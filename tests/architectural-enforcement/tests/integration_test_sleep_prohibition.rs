//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the core and the TUI MUST NOT call sleep.
//! Countdown ticks, grace periods and audio retries are pull-based timers
//! polled once per frame; the frame itself comes from `tokio::time::interval`.
//!
//! **Exceptions**: frame rate limiting (TUI `app.rs` only), test code.

use std::fs;
use std::path::Path;

use architectural_enforcement::source_tree;

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = find_sleep_violations();

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {}", violation);
        }

        eprintln!("\n✅ ACCEPTABLE:");
        eprintln!("  - Frame pacing with tokio::time::interval in tui/src/app.rs");
        eprintln!("  - Interval / Timeout polled against the Clock");
        eprintln!("  - Test code (#[cfg(test)] modules)");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep to wait for the countdown, grace period or audio retry");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// Find all sleep() calls in production code
fn find_sleep_violations() -> Vec<String> {
    let mut violations = Vec::new();

    check_directory(
        "countdown/core/src",
        &mut violations,
        &SleepPolicy {
            allow_frame_limiting: false,
            allow_tests: true,
        },
    );

    check_directory(
        "tui/src",
        &mut violations,
        &SleepPolicy {
            allow_frame_limiting: true,
            allow_tests: true,
        },
    );

    violations
}

struct SleepPolicy {
    allow_frame_limiting: bool,
    allow_tests: bool,
}

fn check_directory(dir: &str, violations: &mut Vec<String>, policy: &SleepPolicy) {
    let path = source_tree(dir);
    assert!(path.exists(), "source tree not found: {}", path.display());

    for entry in walkdir::WalkDir::new(&path)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), violations, policy);
        }
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>, policy: &SleepPolicy) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if !(code_part.contains("::sleep(") || code_part.contains(".sleep(")) {
            continue;
        }

        if policy.allow_tests && is_in_test_module(&lines, idx) {
            continue;
        }

        if policy.allow_frame_limiting
            && path.ends_with("tui/src/app.rs")
            && is_frame_limiting_context(&lines, idx)
        {
            continue;
        }

        violations.push(format!(
            "{}:{} - {}",
            path.display(),
            idx + 1,
            line.trim()
        ));
    }
}

/// Check if line sits below a `#[cfg(test)]` attribute
fn is_in_test_module(lines: &[&str], current_idx: usize) -> bool {
    lines[..current_idx]
        .iter()
        .any(|line| line.trim().starts_with("#[cfg(test)]"))
}

/// Check if sleep is used for frame rate limiting
fn is_frame_limiting_context(lines: &[&str], current_idx: usize) -> bool {
    let context_range = current_idx.saturating_sub(10)..std::cmp::min(current_idx + 5, lines.len());

    lines[context_range].iter().any(|line| {
        let line = line.to_lowercase();
        line.contains("frame") || line.contains("fps") || line.contains("tick_rate")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_module_detection() {
        let code = vec![
            "fn run() {}",
            "#[cfg(test)]",
            "mod tests {",
            "    fn helper() { std::thread::sleep(d); }",
            "}",
        ];

        assert!(!is_in_test_module(&code, 0));
        assert!(is_in_test_module(&code, 3));
    }

    #[test]
    fn test_frame_limiting_detection() {
        let code = vec![
            "async fn run() {",
            "    let frame_duration = Duration::from_millis(33);",
            "    loop {",
            "        render();",
            "        tokio::time::sleep(frame_duration).await;",
            "    }",
            "}",
        ];

        assert!(is_frame_limiting_context(&code, 4));
    }
}
