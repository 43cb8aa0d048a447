//! Integration tests for the `smartdisplay` CLI binary.
//!
//! Parsing, help, completions and config handling run without a backend;
//! the backend-bound commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `smartdisplay` binary with env isolation.
///
/// Clears all `SMARTDISPLAY_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn sd_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("smartdisplay");
    cmd.env("HOME", "/tmp/smartdisplay-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/smartdisplay-cli-test-nonexistent")
        .env(
            "SMARTDISPLAY_CONFIG",
            "/tmp/smartdisplay-cli-test-nonexistent/config.toml",
        )
        .env_remove("SMARTDISPLAY_PROFILE")
        .env_remove("SMARTDISPLAY_BACKEND")
        .env_remove("SMARTDISPLAY_OUTPUT")
        .env_remove("SMARTDISPLAY_INSECURE")
        .env_remove("SMARTDISPLAY_TIMEOUT")
        .env_remove("SMARTDISPLAY_PIN")
        .env_remove("SMARTDISPLAY_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn sd_cmd_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = sd_cmd();
    cmd.env("SMARTDISPLAY_CONFIG", config);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sd_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    sd_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("smart display")
            .and(predicate::str::contains("alarm"))
            .and(predicate::str::contains("guest"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    sd_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("smartdisplay"));
}

#[test]
fn test_invalid_subcommand() {
    sd_cmd()
        .arg("thermostat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_output_format() {
    sd_cmd()
        .args(["--output", "xml", "home"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_arm_mode() {
    sd_cmd()
        .args(["alarm", "arm", "vacation"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    sd_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    sd_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("smartdisplay"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_backend_command_without_config() {
    sd_cmd()
        .args(["alarm", "state"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_unknown_profile() {
    sd_cmd()
        .args(["--profile", "attic", "home"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Profile 'attic' not found"));
}

#[test]
fn test_config_path_honors_env() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("display.toml");
    sd_cmd_with_config(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("display.toml"));
}

#[test]
fn test_config_init_show_and_refuse_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");

    sd_cmd_with_config(&file)
        .args(["config", "init", "--url", "http://10.0.0.7:8090"])
        .assert()
        .success();
    assert!(file.exists());

    sd_cmd_with_config(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.kiosk]")
                .and(predicate::str::contains("http://10.0.0.7:8090")),
        );

    sd_cmd_with_config(&file)
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_init_rejects_bad_url() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    sd_cmd_with_config(&file)
        .args(["config", "init", "--url", "ftp://nas"])
        .assert()
        .code(2);
    assert!(!file.exists());
}

#[test]
fn test_short_pin_rejected_locally() {
    sd_cmd()
        .args(["--backend", "http://127.0.0.1:9", "login", "--pin", "12"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("4 digits"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_alarm_state_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ui/alarm/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mode": "disarmed"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = sd_cmd();
    cmd.args(["--backend", &server.uri(), "-o", "json-compact", "alarm", "state"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"mode":"disarmed"}"#
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"pin": "0000"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Hatalı PIN"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = sd_cmd();
    cmd.args(["--backend", &server.uri(), "login", "--pin", "0000"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Hatalı PIN"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_success_prints_auth_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let mut cmd = sd_cmd();
    cmd.args(["--backend", &server.uri(), "-o", "json-compact", "login", "--pin", "1234"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, json!({"authenticated": true, "role": "admin"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ui/home/state"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut cmd = sd_cmd();
    cmd.args(["--backend", &server.uri(), "home"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("HTTP_ERROR"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ui/home/state"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let mut cmd = sd_cmd();
    cmd.args(["--backend", &server.uri(), "--timeout", "100", "home"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(8));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_stops_after_cycles() {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/ui/alarm/state", json!({"mode": "disarmed"})),
        ("/ui/home/state", json!({"scene": "day"})),
        ("/ui/guest/state", json!({"visitors": 0})),
        ("/ui/menu", json!([{"id": "alarm"}])),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    let mut cmd = sd_cmd();
    cmd.args([
        "--backend",
        &server.uri(),
        "-o",
        "json-compact",
        "watch",
        "--interval-ms",
        "50",
        "--cycles",
        "2",
    ])
    .timeout(std::time::Duration::from_secs(20));
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["cycle"], 1);
    assert_eq!(lines[0]["updated"]["alarmState"], json!({"mode": "disarmed"}));
    assert_eq!(lines[0]["updated"]["menuState"], json!({"items": [{"id": "alarm"}]}));
}
