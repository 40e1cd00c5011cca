//! Integration tests for the sevlog binary
//!
//! These run the real process so the terminating severities can be checked
//! by exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

mod common;

/// Helper to write a config and return its path
fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("sevlog.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

/// Helper to run sevlog against an isolated config and log directory
fn run_sevlog(dir: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sevlog"))
        .env("SEVLOG_DIR", dir)
        .env("SEVLOG_CONFIG", config)
        .env("SEVLOG_LOG_DIR", dir.join("logs"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute sevlog")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn setup() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "sink:\n  target: stderr\n  flags: []\n");
    (temp, config)
}

#[test]
fn test_info_exits_zero() {
    let (temp, config) = setup();
    let output = run_sevlog(temp.path(), &config, &["info", "service started"]);

    assert!(output.status.success());
    assert_eq!(stderr_of(&output), "INFO: service started\n");
}

#[test]
fn test_warn_does_not_terminate() {
    let (temp, config) = setup();
    let output = run_sevlog(temp.path(), &config, &["warn", "disk almost full", "--tag", "job=nightly"]);

    assert!(output.status.success());
    assert!(stderr_of(&output).contains("WARN: disk almost full"));
}

#[test]
fn test_error_exits_one_after_writing() {
    let (temp, config) = setup();
    let output = run_sevlog(temp.path(), &config, &["error", "disk full"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("ERROR: disk full"));
}

#[test]
fn test_fatal_error_exits_one_after_writing() {
    let (temp, config) = setup();
    let output = run_sevlog(temp.path(), &config, &["fatal-error", "disk full", "--user-id", "7"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("ERROR: disk full"));
}

#[test]
fn test_fatal_error_delivers_before_exit() {
    let (addr, requests) = common::start_mock_store();
    let temp = TempDir::new().unwrap();
    let config = write_config(
        temp.path(),
        &format!(
            "sink:\n  flags: []\nreporter:\n  dsn: http://key@{}/5\n  environment: ci\n",
            addr
        ),
    );

    let output = run_sevlog(temp.path(), &config, &["fatal-error", "out of memory", "--tag", "job=etl"]);

    assert_eq!(output.status.code(), Some(1));
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["message"], "out of memory");
    assert_eq!(requests[0].body["tags"]["job"], "etl");
}

#[test]
fn test_warn_is_delivered_before_shutdown() {
    let (addr, requests) = common::start_mock_store();
    let temp = TempDir::new().unwrap();
    let config = write_config(
        temp.path(),
        &format!("sink:\n  flags: []\nreporter:\n  dsn: http://key@{}/5\n", addr),
    );

    let output = run_sevlog(temp.path(), &config, &["warn", "slow disk", "--user-id", "42"]);

    assert!(output.status.success());
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body["level"], "warning");
    assert_eq!(requests[0].body["user"]["id"], "42");
}

#[test]
fn test_fatal_error_gives_up_on_unreachable_store() {
    let temp = TempDir::new().unwrap();
    let config = write_config(
        temp.path(),
        "sink:\n  flags: []\nreporter:\n  dsn: http://key@127.0.0.1:9/1\n  timeout_secs: 1\n",
    );

    let output = run_sevlog(temp.path(), &config, &["fatal-error", "disk full"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("ERROR: disk full"));
}

#[test]
fn test_invalid_dsn_fails_initialization() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "reporter:\n  dsn: https://errors.example.com/1\n");

    let output = run_sevlog(temp.path(), &config, &["info", "hello"]);

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Failed to initialize logger"));
    assert!(!stderr_of(&output).contains("INFO: hello"));
}

#[test]
fn test_debug_goes_to_debug_sink() {
    let temp = TempDir::new().unwrap();
    let config = write_config(
        temp.path(),
        "sink:\n  target: stdout\n  flags: []\ndebug_sink:\n  target: stderr\n  flags: []\n",
    );

    let output = run_sevlog(
        temp.path(),
        &config,
        &["debug", "cache miss", "--error", "timeout", "--env", "region=eu"],
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.starts_with("DEBUG: cache miss. timeout\n"));
    assert!(stderr.contains("\"region\": \"eu\""));
}

#[test]
fn test_print_joins_words() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "sink:\n  target: stdout\n  prefix: \"[job] \"\n  flags: []\n");

    let output = run_sevlog(temp.path(), &config, &["print", "rows", "copied:", "42"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "[job] rows copied: 42\n");
}

#[test]
fn test_file_sink_appends() {
    let temp = TempDir::new().unwrap();
    let log_path = temp.path().join("app.log");
    let config = write_config(
        temp.path(),
        &format!("sink:\n  target: file\n  path: {}\n  flags: []\n", log_path.display()),
    );

    run_sevlog(temp.path(), &config, &["info", "one"]);
    run_sevlog(temp.path(), &config, &["info", "two"]);

    assert_eq!(fs::read_to_string(&log_path).unwrap(), "INFO: one\nINFO: two\n");
}

#[test]
fn test_config_get() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "reporter:\n  logger_name: payments\n");

    let output = run_sevlog(temp.path(), &config, &["config", "get", "reporter.logger_name"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "payments");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (temp, config) = setup();
    let output = run_sevlog(temp.path(), &config, &["config", "get", "nope"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_doctor_flags_invalid_dsn() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "reporter:\n  dsn: ftp://key@host/1\n");

    let output = run_sevlog(temp.path(), &config, &["doctor"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("invalid DSN"));
}
