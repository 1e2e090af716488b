//! CLI Integration Tests
//!
//! These tests verify that the CLI commands work correctly end-to-end.
//! They test the actual binary behavior, not just the library.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::tempdir;

/// Run assetstore against `data_dir` and return (stdout, stderr, success)
fn run_assetstore(args: &[&str], data_dir: &Path) -> (Vec<u8>, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_assetstore"))
        .arg("-d")
        .arg(data_dir)
        .args(["-f", "json"])
        .args(args)
        .env_remove("ASSETSTORE_DATA_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute assetstore");

    (
        output.stdout,
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn run_json(args: &[&str], data_dir: &Path) -> (serde_json::Value, bool) {
    let (stdout, stderr, success) = run_assetstore(args, data_dir);
    let json = serde_json::from_slice(&stdout)
        .unwrap_or_else(|e| panic!("invalid JSON ({}): {:?} / {}", e, stdout, stderr));
    (json, success)
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn test_cli_init_creates_storage() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().join("data");

    let (json, success) = run_json(&["init"], &data_dir);

    assert!(success, "init should succeed");
    assert_eq!(json["status"], "ok");
    assert!(data_dir.join("assets.table").exists());
    assert!(data_dir.join("content").is_dir());
}

// ============================================================================
// Put / Get
// ============================================================================

#[test]
fn test_cli_put_and_get_by_id() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "file.txt", b"hello");

    let (json, success) = run_json(&["put", &file], dir.path());
    assert!(success);
    assert_eq!(json["asset"]["name"], "file.txt");
    assert_eq!(json["asset"]["size"], 5);
    assert_eq!(json["token"], serde_json::json!({}));

    let id = json["asset"]["id"].as_str().unwrap().to_string();
    let (stdout, _, success) = run_assetstore(&["get", &id], dir.path());
    assert!(success);
    assert_eq!(stdout, b"hello");
}

#[test]
fn test_cli_get_to_file() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "in.bin", &[0, 1, 2, 254, 255]);
    let out = dir.path().join("out.bin");

    let (json, _) = run_json(&["put", &file, "--name", "renamed.bin"], dir.path());
    assert_eq!(json["asset"]["name"], "renamed.bin");
    let id = json["asset"]["id"].as_str().unwrap().to_string();

    let (json, success) = run_json(&["get", &id, "-o", out.to_str().unwrap()], dir.path());
    assert!(success);
    assert_eq!(json["bytes"], 5);
    assert_eq!(json["asset"]["id"], id.as_str());
    assert_eq!(std::fs::read(&out).unwrap(), vec![0, 1, 2, 254, 255]);
}

#[test]
fn test_cli_put_from_stdin() {
    let dir = tempdir().unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_assetstore"))
        .arg("-d")
        .arg(dir.path())
        .args(["put", "-", "--name", "piped.txt"])
        .env_remove("ASSETSTORE_DATA_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"from a pipe")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["asset"]["name"], "piped.txt");
    assert_eq!(json["asset"]["size"], 11);
}

#[test]
fn test_cli_stdin_requires_name() {
    let dir = tempdir().unwrap();

    let (json, success) = run_json(&["put", "-"], dir.path());
    assert!(!success);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("name"));
}

#[test]
fn test_cli_get_unknown_id_fails() {
    let dir = tempdir().unwrap();

    let (json, success) = run_json(&["get", "no-such-asset"], dir.path());
    assert!(!success);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("Not found"));
}

// ============================================================================
// Tokens
// ============================================================================

#[test]
fn test_cli_token_access() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "shared.txt", b"shared content");

    let (json, success) = run_json(&["put", &file, "--token", "--expiry", "5"], dir.path());
    assert!(success);
    let id = json["asset"]["id"].as_str().unwrap().to_string();
    let token = json["token"]["token"].as_str().unwrap().to_string();
    assert_eq!(json["token"]["asset_id"], id.as_str());
    assert_ne!(token, id);

    let (stdout, _, success) = run_assetstore(&["get-token", &token], dir.path());
    assert!(success);
    assert_eq!(stdout, b"shared content");
}

#[test]
fn test_cli_token_needs_expiry() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "x.txt", b"x");

    // --token without a non-zero expiry issues nothing
    let (json, success) = run_json(&["put", &file, "--token"], dir.path());
    assert!(success);
    assert_eq!(json["token"], serde_json::json!({}));
}

#[test]
fn test_cli_meta() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "m.txt", b"1234567");

    let (json, _) = run_json(&["put", &file], dir.path());
    let id = json["asset"]["id"].as_str().unwrap().to_string();

    let (json, success) = run_json(&["meta", &id], dir.path());
    assert!(success);
    assert_eq!(json["asset"]["size"], 7);
    assert_eq!(json["asset"]["version"], 0);
}
