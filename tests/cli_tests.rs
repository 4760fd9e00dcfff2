//! CLI tests for controllerx
//!
//! Runs the binary against saved script exports so no Controller is needed:
//! - Action selection (--list, --host, --graph, --doc)
//! - Output formats
//! - Filter flags and config files
//! - Exit codes and error reporting

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, NamedTempFile, TempDir};

const CONTROLLER_ENV: [&str; 10] = [
    "CONTROLLER_HOST",
    "CONTROLLER_USERNAME",
    "CONTROLLER_PASSWORD",
    "CONTROLLER_INVENTORY",
    "CONTROLLER_VERIFY_SSL",
    "HOSTS_FILTER",
    "HOSTGROUPS_FILTER",
    "GROUPS_FILTER",
    "METADATA_ENABLED",
    "RUST_LOG",
];

// Helper to get a command with no Controller settings leaking in
fn controllerx_cmd() -> Command {
    let mut cmd = Command::cargo_bin("controllerx").unwrap();
    for var in CONTROLLER_ENV {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

// Helper to create a saved script export
fn create_script_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
  "_meta": {{"hostvars": {{
    "web1": {{"ansible_host": "10.0.0.1"}},
    "web2": {{"ansible_host": "10.0.0.2"}},
    "db1": {{}}
  }}}},
  "all": {{"vars": {{"env": "prod"}}}},
  "web": {{"hosts": ["web1", "web2"], "vars": {{"http_port": 80}}}},
  "db": {{"hosts": ["db1"]}}
}}"#
    )
    .unwrap();
    file
}

// Helper to create an inventory source file with the given body
fn create_source_file(body: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prod.controllerx.yml");
    fs::write(&path, body).unwrap();
    (dir, path)
}

fn list_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

// ============================================================================
// Basic Flags
// ============================================================================

#[test]
fn test_help() {
    controllerx_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--hosts-filter"))
        .stdout(predicate::str::contains("--hostgroups-filter"))
        .stdout(predicate::str::contains("--groups-filter"));
}

#[test]
fn test_version() {
    controllerx_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_doc_lists_options() {
    controllerx_cmd()
        .arg("--doc")
        .assert()
        .success()
        .stdout(predicate::str::contains("= host (string, required)"))
        .stdout(predicate::str::contains("- hostgroups_filter (string)"))
        .stdout(predicate::str::contains("aliases: verify_ssl"))
        .stdout(predicate::str::contains("env: GROUPS_FILTER"));
}

#[test]
fn test_conflicting_actions_rejected() {
    controllerx_cmd()
        .args(["--list", "--host", "web1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Script File Source
// ============================================================================

#[test]
fn test_list_without_filters() {
    let script = create_script_file();
    let doc = list_output(controllerx_cmd().arg("--script-file").arg(script.path()).arg("--list"));

    assert_eq!(doc["web"]["hosts"], serde_json::json!(["web1", "web2"]));
    assert_eq!(doc["db"]["hosts"], serde_json::json!(["db1"]));
    assert_eq!(doc["all"]["vars"]["env"], "prod");
    assert_eq!(doc["_meta"]["hostvars"]["web1"]["ansible_host"], "10.0.0.1");
}

#[test]
fn test_list_is_default_action() {
    let script = create_script_file();
    let doc = list_output(controllerx_cmd().arg("--script-file").arg(script.path()));
    assert!(doc.get("_meta").is_some());
}

#[test]
fn test_list_with_filter_flags() {
    let script = create_script_file();
    let doc = list_output(
        controllerx_cmd()
            .arg("--script-file")
            .arg(script.path())
            .args(["--hosts-filter", "2$", "--groups-filter", "^web$"]),
    );

    assert_eq!(doc["web"]["hosts"], serde_json::json!(["web2"]));
    assert!(doc.get("db").is_none());
    let hostvars = doc["_meta"]["hostvars"].as_object().unwrap();
    assert_eq!(hostvars.keys().collect::<Vec<_>>(), vec!["web2"]);
}

#[test]
fn test_filters_from_environment() {
    let script = create_script_file();
    let doc = list_output(
        controllerx_cmd()
            .arg("--script-file")
            .arg(script.path())
            .env("HOSTGROUPS_FILTER", "^db$"),
    );

    let hostvars = doc["_meta"]["hostvars"].as_object().unwrap();
    assert_eq!(hostvars.keys().collect::<Vec<_>>(), vec!["db1"]);
    // groups are untouched without groups_filter
    assert_eq!(doc["web"]["hosts"], serde_json::json!([]));
}

#[test]
fn test_flag_overrides_environment() {
    let script = create_script_file();
    let doc = list_output(
        controllerx_cmd()
            .arg("--script-file")
            .arg(script.path())
            .env("HOSTS_FILTER", "db")
            .args(["--hosts-filter", "web1"]),
    );

    let hostvars = doc["_meta"]["hostvars"].as_object().unwrap();
    assert_eq!(hostvars.keys().collect::<Vec<_>>(), vec!["web1"]);
}

#[test]
fn test_filters_from_source_file() {
    let script = create_script_file();
    let (_dir, source) = create_source_file("plugin: controllerx\ngroups_filter: '^db'\n");

    let doc = list_output(
        controllerx_cmd()
            .arg("-i")
            .arg(&source)
            .arg("--script-file")
            .arg(script.path()),
    );

    assert!(doc.get("web").is_none());
    assert_eq!(doc["db"]["hosts"], serde_json::json!(["db1"]));
}

#[test]
fn test_yaml_output() {
    let script = create_script_file();
    controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .args(["--list", "--yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_meta:"))
        .stdout(predicate::str::contains("http_port: 80"));
}

#[test]
fn test_host_merges_group_vars() {
    let script = create_script_file();
    let output = controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .args(["--host", "web1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let vars: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        vars,
        serde_json::json!({"env": "prod", "http_port": 80, "ansible_host": "10.0.0.1"})
    );
}

#[test]
fn test_host_not_found() {
    let script = create_script_file();
    controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .args(["--host", "ghost"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ERROR! host not found: ghost"));
}

#[test]
fn test_graph() {
    let script = create_script_file();
    controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .arg("--graph")
        .assert()
        .success()
        .stdout(
            "@all:\n  |--@db:\n  |  |--db1\n  |--@ungrouped:\n  |--@web:\n  |  |--web1\n  |  |--web2\n",
        );
}

#[test]
fn test_graph_single_group() {
    let script = create_script_file();
    controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .args(["--graph", "db"])
        .assert()
        .success()
        .stdout("@db:\n  |--db1\n");
}

#[test]
fn test_malformed_script_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[1, 2, 3]").unwrap();

    controllerx_cmd()
        .arg("--script-file")
        .arg(file.path())
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test]
fn test_invalid_regex_fails_before_output() {
    let script = create_script_file();
    controllerx_cmd()
        .arg("--script-file")
        .arg(script.path())
        .args(["--hosts-filter", "("])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("ERROR!"))
        .stderr(predicate::str::contains("hosts_filter"));
}

#[test]
fn test_invalid_regex_before_missing_options() {
    controllerx_cmd()
        .args(["--list", "--groups-filter", "[unclosed"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("groups_filter"));
}

#[test]
fn test_missing_required_options() {
    controllerx_cmd()
        .arg("--list")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("CONTROLLER_HOST"));
}

#[test]
fn test_malformed_controller_host() {
    controllerx_cmd()
        .args(["--list", "--controller-host", "https://"])
        .args(["--username", "admin", "--password", "secret", "--inventory", "prod"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid Controller URL"));
}

#[test]
fn test_unsupported_source() {
    controllerx_cmd()
        .args(["-i", "hosts.ini", "--list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a controllerx inventory source"));
}

#[test]
fn test_wrong_plugin_name() {
    let (_dir, source) = create_source_file("plugin: awx.awx.tower\nhost: example.com\n");
    controllerx_cmd()
        .arg("-i")
        .arg(&source)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("plugin: awx.awx.tower"));
}

#[test]
fn test_invalid_boolean_flag() {
    controllerx_cmd()
        .args(["--validate-certs", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a boolean"));
}
