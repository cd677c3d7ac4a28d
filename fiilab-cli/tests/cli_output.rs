//! Binary-level checks: with a machine-readable format, stdout carries only data.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fiilab-core/tests/fixtures/fundamentus_sample.csv")
}

fn fiilab(args: &[&str]) -> Output {
    let cache = tempfile::tempdir().unwrap();
    let fixture = fixture_path();
    let output = Command::new(env!("CARGO_BIN_EXE_fiilab"))
        .args(args)
        .arg("--csv")
        .arg(&fixture)
        .args(["--separator", ";"])
        .arg("--cache-dir")
        .arg(cache.path())
        .env("RUST_LOG", "info")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "fiilab {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn stdout_json(output: &Output) -> Vec<Value> {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{stdout}"))
}

#[test]
fn screen_json_stdout_is_pure_json() {
    let output = fiilab(&["screen", "--preset", "advanced", "--min-score", "0", "--format", "json"]);
    let records = stdout_json(&output);
    assert_eq!(records.len(), 12);
    assert!(records.iter().all(|r| r["papel"].is_string()));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("funds scored >= 0"));
}

#[test]
fn screen_csv_stdout_starts_with_header() {
    let output = fiilab(&["screen", "--min-score", "0", "--format", "csv"]);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert!(lines.next().unwrap().starts_with("Fundo,"));
    assert_eq!(lines.count(), 12);
}

#[test]
fn similar_json_respects_macro_filter() {
    let output = fiilab(&[
        "similar",
        "XPML11",
        "--preset",
        "advanced",
        "--any-segment",
        "--macro",
        "shopping",
        "--format",
        "json",
    ]);
    let records = stdout_json(&output);
    let tickers: Vec<&str> = records.iter().filter_map(|r| r["papel"].as_str()).collect();
    assert_eq!(tickers, vec!["VISC11"]);
}

#[test]
fn similar_json_with_no_peers_is_an_empty_array() {
    let output = fiilab(&[
        "similar",
        "XPML11",
        "--macro",
        "shopping",
        "--yield-tolerance",
        "0.01",
        "--format",
        "json",
    ]);
    assert!(stdout_json(&output).is_empty());
}
