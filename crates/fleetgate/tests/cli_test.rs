//! Integration tests for the `fleetgate` CLI binary.
//!
//! Argument parsing, help output, shell completions and error handling run
//! without a backend; the end-to-end cases talk to a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fleetgate` binary with env isolation.
///
/// Clears all `FLEETGATE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fleetgate_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fleetgate");
    cmd.env("HOME", "/tmp/fleetgate-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fleetgate-cli-test-nonexistent")
        .env_remove("FLEETGATE_PROFILE")
        .env_remove("FLEETGATE_BASE_URL")
        .env_remove("FLEETGATE_USERNAME")
        .env_remove("FLEETGATE_PASSWORD")
        .env_remove("FLEETGATE_OUTPUT")
        .env_remove("FLEETGATE_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "ops", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "a1", "refreshToken": "r1" })),
        )
        .expect(1)
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fleetgate_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_resources() {
    fleetgate_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("cars")
            .and(predicate::str::contains("rents"))
            .and(predicate::str::contains("notifications")),
    );
}

#[test]
fn test_version_flag() {
    fleetgate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetgate"));
}

#[test]
fn test_rents_have_close_subcommand() {
    fleetgate_cmd()
        .args(["rents", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("close").and(predicate::str::contains("list")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fleetgate_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    fleetgate_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = fleetgate_cmd().arg("trucks").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("trucks"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_create_requires_a_body() {
    let output = fleetgate_cmd().args(["cars", "create"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cars_list_without_config() {
    fleetgate_cmd()
        .args(["cars", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API configured"));
}

#[test]
fn test_base_url_without_credentials() {
    let output = fleetgate_cmd()
        .args(["--base-url", "http://127.0.0.1:1/api", "cars", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_cars_list_plain_is_newest_first() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/cars"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "_id": "3" }, { "_id": "ff" }, { "_id": "1a" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = format!("{}/api", server.uri());
    fleetgate_cmd()
        .env("FLEETGATE_PASSWORD", "pw")
        .args(["--base-url", &base_url, "--username", "ops", "-o", "plain"])
        .args(["cars", "list"])
        .assert()
        .success()
        .stdout("ff\n1a\n3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid credentials" })),
        )
        .mount(&server)
        .await;

    let base_url = format!("{}/api", server.uri());
    let output = fleetgate_cmd()
        .args(["--base-url", &base_url, "--username", "ops", "--password", "nope"])
        .arg("login")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("invalid credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_requires_yes_without_terminal() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let base_url = format!("{}/api", server.uri());
    let output = fleetgate_cmd()
        .env("FLEETGATE_PASSWORD", "pw")
        .args(["--base-url", &base_url, "--username", "ops"])
        .args(["cars", "delete", "ff"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}
