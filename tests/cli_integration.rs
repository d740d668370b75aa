//! Integration tests for the CLI
//!
//! Tests the command-line interface for apply, check, and list commands

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to create a target tree with the route markers in place
fn setup_target() -> TempDir {
    let dir = TempDir::new().unwrap();

    let mut lines: Vec<String> = (0..400).map(|i| format!("line {i}\n")).collect();
    lines[303] = "const type = await detectEntryType(actualSlug);\n".to_string();
    lines[304] = "const actualSlug = await findActualSlug(req.params.slug);\n".to_string();
    lines[316] = "const actualSlug = await findActualSlug(req.params.slug);\n".to_string();
    fs::write(dir.path().join("index.js"), lines.concat()).unwrap();

    dir
}

/// Helper that also drops a fix file in <root>/fixes/
fn setup_target_with_fixes() -> TempDir {
    let dir = setup_target();

    let fixes_dir = dir.path().join("fixes");
    fs::create_dir(&fixes_dir).unwrap();
    fs::write(
        fixes_dir.join("route-fixes.toml"),
        r#"[meta]
name = "route-fixes"
root_relative = true

[[fixes]]
id = "movie-route-order"
file = "index.js"

[fixes.op]
type = "swap-pair"
first = 303
second = 304
first_contains = "detectEntryType(actualSlug)"
second_contains = "findActualSlug"

[[fixes]]
id = "episode-route-decl"
file = "index.js"

[fixes.op]
type = "relocate"
window_start = 315
window_end = 320
contains = "const actualSlug"
dest = 317
"#,
    )
    .unwrap();

    dir
}

fn run_linefix(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_apply_help() {
    let output = run_linefix(&["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Apply fixes to a target tree"));
}

#[test]
fn test_apply_builtin_fallback() {
    let target = setup_target();

    let output = run_linefix(&["apply", "--root", target.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("built-in"));
    assert!(stdout.contains("movie-route-order"));
    assert!(stdout.contains("episode-route-decl"));
    assert!(stdout.contains("Summary:"));
    assert!(stdout.contains("2 applied"));

    // And the target actually changed
    let content = fs::read_to_string(target.path().join("index.js")).unwrap();
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    assert!(lines[303].contains("findActualSlug"));
    assert!(lines[304].contains("detectEntryType(actualSlug)"));
}

#[test]
fn test_apply_with_fix_file() {
    let target = setup_target_with_fixes();

    let output = run_linefix(&["apply", "--root", target.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("route-fixes.toml"));
    assert!(stdout.contains("2 applied"));
}

#[test]
fn test_apply_dry_run_leaves_target_untouched() {
    let target = setup_target();
    let before = fs::read_to_string(target.path().join("index.js")).unwrap();

    let output = run_linefix(&[
        "apply",
        "--root",
        target.path().to_str().unwrap(),
        "--dry-run",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would apply"));

    let after = fs::read_to_string(target.path().join("index.js")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_apply_dry_run_diff_shows_hunks_without_writing() {
    let target = setup_target();
    let before = fs::read_to_string(target.path().join("index.js")).unwrap();

    let output = run_linefix(&[
        "apply",
        "--root",
        target.path().to_str().unwrap(),
        "--dry-run",
        "--diff",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    // The would-be diff is computed in memory
    assert!(stdout.contains("--- "));
    assert!(stdout.contains("+++ "));
    assert!(stdout.contains("detectEntryType(actualSlug)"));

    let after = fs::read_to_string(target.path().join("index.js")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_apply_reports_skips_on_guard_miss() {
    let dir = TempDir::new().unwrap();
    let lines: String = (0..400).map(|i| format!("line {i}\n")).collect();
    fs::write(dir.path().join("index.js"), lines).unwrap();

    let output = run_linefix(&["apply", "--root", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Guard misses are not failures
    assert!(output.status.success());
    assert!(stdout.contains("2 skipped"));
    assert!(stdout.contains("0 failed"));
}

#[test]
fn test_apply_short_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.js"), "line 0\nline 1\n").unwrap();

    let output = run_linefix(&["apply", "--root", dir.path().to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("out of range"));
}

#[test]
fn test_check_command() {
    let target = setup_target_with_fixes();

    let output = run_linefix(&["check", "--root", target.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Fix Status Report"));
    assert!(stdout.contains("WOULD APPLY"));

    // Check is read-only: applying afterwards still changes the file
    let apply = run_linefix(&["apply", "--root", target.path().to_str().unwrap()]);
    let apply_stdout = String::from_utf8_lossy(&apply.stdout);
    assert!(apply_stdout.contains("2 applied"));
}

#[test]
fn test_list_command() {
    let target = setup_target_with_fixes();

    let output = run_linefix(&["list", "--root", target.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("route-fixes"));
    assert!(stdout.contains("movie-route-order"));
    assert!(stdout.contains("swap-pair 303 <-> 304"));
}

#[test]
fn test_missing_root() {
    let output = run_linefix(&["apply", "--root", "/nonexistent/root"]);
    assert!(!output.status.success());
}
