//! CLI subprocess integration tests.
//!
//! These tests invoke the `isctl` binary with the mock backend and a private
//! `HOME`, and check exit codes and output.

use std::path::Path;
use std::process::{Command, Output};

fn isctl_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_isctl"));
    cmd.env("HOME", home).env_remove("ISCTL_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    isctl_bin(home).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("isctl"));
}

#[test]
fn cli_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    for sub in ["list", "start", "stop", "wait", "exec", "zstu", "commands"] {
        assert!(text.contains(sub), "help is missing {sub}");
    }
}

#[test]
fn cli_zstu_toggles_and_restores() {
    let home = tempfile::tempdir().unwrap();
    let cpf = home.path().join("cache.cpf");
    let original = "[Startup]\nZSTU=1\nSystemMode=DEV\n";
    std::fs::write(&cpf, original).unwrap();
    let cpf_arg = cpf.to_str().unwrap();

    let output = run(home.path(), &["zstu", cpf_arg, "off"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("ZSTU on -> off"));
    assert_eq!(
        std::fs::read_to_string(&cpf).unwrap(),
        "[Startup]\nZSTU=0\nSystemMode=DEV\n"
    );

    let output = run(home.path(), &["--json", "zstu", cpf_arg, "on"]);
    assert!(output.status.success());
    let change: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(change["previous"], false);
    assert_eq!(change["current"], true);
    assert_eq!(std::fs::read_to_string(&cpf).unwrap(), original);
}

#[test]
fn cli_zstu_without_setting_line_exits_config_error() {
    let home = tempfile::tempdir().unwrap();
    let cpf = home.path().join("cache.cpf");
    std::fs::write(&cpf, "[Startup]\nSystemMode=DEV\n").unwrap();

    let output = run(home.path(), &["zstu", cpf.to_str().unwrap(), "on"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("ZSTU"));
    assert_eq!(
        std::fs::read_to_string(&cpf).unwrap(),
        "[Startup]\nSystemMode=DEV\n"
    );
}

#[test]
fn cli_mock_list_is_empty() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--backend", "mock", "list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("no instances found"));
}

#[test]
fn cli_mock_list_json_is_empty_array() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--backend", "mock", "--json", "list"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value, serde_json::json!([]));
}

#[test]
fn cli_inspect_unknown_instance_exits_state_error() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--backend", "mock", "inspect", "NOPE"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("instance not found: NOPE"));
}

#[test]
fn cli_invalid_config_exits_config_error() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("toolchain.toml");
    std::fs::write(&config, "poll_interval_ms = \"fast\"\n").unwrap();

    let output = run(
        home.path(),
        &["--config", config.to_str().unwrap(), "--backend", "mock", "list"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("config error"));
}

#[test]
fn cli_unknown_backend_exits_config_error() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--backend", "docker", "list"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("isctl"));
}

#[test]
fn cli_exec_rejects_conflicting_identities() {
    let home = tempfile::tempdir().unwrap();
    let output = run(
        home.path(),
        &["--backend", "mock", "exec", "CACHE", "--as-owner", "--as-manager"],
    );
    assert!(!output.status.success());
}

#[test]
fn cli_start_help_describes_single_verification() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["start", "--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("check that it reports ready"));
}
