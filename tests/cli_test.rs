#![allow(deprecated)]

//! End-to-end tests for the `chatmate` binary
//!
//! Only commands that need no network are exercised here: agent catalog,
//! sessions, theme and signed-out auth state.
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
mod common;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("chatmate").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("chat")
            .and(predicate::str::contains("sessions"))
            .and(predicate::str::contains("agents"))
            .and(predicate::str::contains("theme")),
    );
}

#[test]
fn test_agents_list_shows_builtin_agents() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["agents", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("assistant").and(predicate::str::contains("coder")));
}

#[test]
fn test_agents_show_unknown_suggests_closest() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["agents", "show", "asistant"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown agent: asistant"))
        .stderr(predicate::str::contains("did you mean 'assistant'"));
}

#[test]
fn test_agents_create_invalid_reports_fields() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args([
            "agents",
            "create",
            "--name",
            "X",
            "--description",
            "tiny",
            "--prompt",
            "You are a helpful cooking assistant.",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name:").and(predicate::str::contains("description:")));
}

#[test]
fn test_agents_create_then_list_custom() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args([
            "agents",
            "create",
            "--name",
            "Chef",
            "--description",
            "Suggests quick weeknight dinners",
            "--category",
            "health",
            "--icon",
            "utensils",
            "--prompt",
            "You are a friendly home cook who suggests quick recipes.",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created agent custom-"));

    common::chatmate(&dir)
        .args(["agents", "list", "--custom"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chef").and(predicate::str::contains("assistant").not()));
}

#[test]
fn test_builtin_agent_cannot_be_deleted() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["agents", "delete", "assistant"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be deleted"));
}

#[test]
fn test_sessions_list_empty() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["sessions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No chat sessions found."));
}

#[test]
fn test_sessions_show_unknown_fails() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["sessions", "show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found"));
}

#[test]
fn test_theme_set_persists() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["theme", "set", "--mode", "dark", "--font-scale", "1.2"])
        .assert()
        .success();

    common::chatmate(&dir)
        .args(["theme", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Mode: Dark (dark)")
                .and(predicate::str::contains("Font scale: 1.20"))
                .and(predicate::str::contains("#0b0f19")),
        );
}

#[test]
fn test_auth_whoami_signed_out() {
    let dir = TempDir::new().unwrap();
    common::chatmate(&dir)
        .args(["auth", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[test]
fn test_invalid_config_is_rejected() {
    // Written to the same config.yaml the helper passes via --config.
    let (dir, _config_path) =
        common::temp_config_file("provider:\n  generation:\n    temperature: 3.5\n");
    common::chatmate(&dir)
        .args(["agents", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("temperature must be between"));
}
