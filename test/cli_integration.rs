//! CLI Integration Tests for Aranya Prime
//!
//! Runs the `aranya` binary end to end against the built-in kernels.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Get the path to the aranya binary built for this test run
fn aranya_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aranya"))
}

/// Get a fresh temp directory for test outputs
fn temp_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("aranya_cli_{}_{}", name, std::process::id()));
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).unwrap();
    path
}

/// Run the binary in `dir` with the given arguments
fn run_in(dir: &PathBuf, args: &[&str]) -> Output {
    Command::new(aranya_binary())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to run aranya")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Config with small workloads so the suite runs quickly
const QUICK_CONFIG: &str = r#"
[audit]
samples = 20000
rapid_fire_iterations = 10
rapid_fire_len = 1000

[bench]
size = 10000
"#;

fn quick_dir(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    fs::write(dir.join("aranya.toml"), QUICK_CONFIG).unwrap();
    dir
}

// ============================================================================
// Inspection
// ============================================================================

#[test]
fn test_info() {
    let output = run_in(&temp_dir("info"), &["info"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("ARANYA PRIME"));
    assert!(text.contains(env!("CARGO_PKG_VERSION")));
    assert!(text.contains("Source: builtin"));
    assert!(text.contains("State:  loaded"));
    assert!(text.contains("13/13"));
}

#[test]
fn test_info_reports_missing_library() {
    let output = run_in(
        &temp_dir("info_missing"),
        &["--library", "no_such_kernel_library", "info"],
    );
    // Reported, not fatal
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("State:  failed"));
    assert!(text.contains("no_such_kernel_library"));
}

#[test]
fn test_symbols_json() {
    let output = run_in(&temp_dir("symbols"), &["symbols", "--json"]);
    assert!(output.status.success());

    let caps: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let caps = caps.as_array().unwrap();
    assert_eq!(caps.len(), 13);
    assert_eq!(caps[0]["op"], "poly");
    assert_eq!(caps[12]["symbol"], "kernel_rotate2d");
}

#[test]
fn test_symbols_text() {
    let output = run_in(&temp_dir("symbols_text"), &["symbols"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("void kernel_scale(i64, f64*, const f64*, f64)"));
    assert!(!text.contains("absent"));
}

#[test]
fn test_missing_library_is_an_error() {
    let output = run_in(
        &temp_dir("symbols_missing"),
        &["--library", "no_such_kernel_library", "symbols"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"));
}

// ============================================================================
// Audits
// ============================================================================

#[test]
fn test_falsify_json() {
    let output = run_in(&quick_dir("falsify"), &["falsify", "--json"]);
    assert!(
        output.status.success(),
        "falsify failed: {}",
        stdout(&output)
    );

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let checks = report["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 10);
    assert!(checks.iter().all(|c| c["status"] != "fail"));
}

#[test]
fn test_falsify_text() {
    let output = run_in(&quick_dir("falsify_text"), &["falsify"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("ENGINE INTEGRITY VERIFIED"));
}

#[test]
fn test_audit() {
    let output = run_in(&quick_dir("audit"), &["audit", "--samples", "5000", "--seed", "3"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Max ULP Deviation"));
    assert!(text.contains("NUMERICAL CERTIFICATION: GRANTED"));
}

#[test]
fn test_audit_json() {
    let output = run_in(&quick_dir("audit_json"), &["audit", "--json", "--seed", "9"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["samples"], 20000);
    assert_eq!(report["seed"], 9);
    assert_eq!(report["verdict"], "granted");
}

#[test]
fn test_bench_json() {
    let output = run_in(&quick_dir("bench"), &["bench", "--size", "2048", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["size"], 2048);
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 13);
    assert!(results.iter().all(|r| r["passed"] == true));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_init_and_show() {
    let dir = temp_dir("config");
    let output = run_in(&dir, &["config", "--init"]);
    assert!(output.status.success());
    assert!(dir.join("aranya.toml").is_file());

    // Refuses to overwrite without --force
    let output = run_in(&dir, &["config", "--init"]);
    assert!(!output.status.success());
    let output = run_in(&dir, &["config", "--init", "--force"]);
    assert!(output.status.success());

    let output = run_in(&dir, &["config"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[library]"));
    assert!(text.contains("samples = 1000000"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = temp_dir("bad_config");
    fs::write(dir.join("aranya.toml"), "[audit]\nrange = -1.0\n").unwrap();
    let output = run_in(&dir, &["info"]);
    assert!(!output.status.success());
}
