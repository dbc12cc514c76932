//! CLI tests for settings files, env overrides and registry flags.

use serde_json::{Value, json};
use std::error::Error;
use std::path::PathBuf;
use std::process::{Command, Output};

fn config_crate_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../crates/config")
}

/// Runs from the config crate so relative fixture paths in settings resolve.
fn checkconf(args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_checkconf"));
    command
        .current_dir(config_crate_dir())
        .args(args)
        .env_remove("CHECKCONF_LOG_LEVEL")
        .env_remove("CHECKCONF_LOG_FORMAT")
        .env_remove("CHECKCONF_INCLUDE_BUILTIN")
        .env_remove("CHECKCONF_DEFINITION_PATHS")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

fn stdout_json(output: &Output) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn kind_names(payload: &Value) -> Result<Vec<String>, Box<dyn Error>> {
    Ok(payload["kinds"]
        .as_array()
        .ok_or("kinds is not an array")?
        .iter()
        .filter_map(|kind| kind["name"].as_str().map(ToOwned::to_owned))
        .collect())
}

#[test]
fn settings_file_adds_definition_kinds() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "kinds",
            "--settings",
            "tests/fixtures/settings/settings.valid.toml",
            "--json",
        ],
        &[],
    )?;
    assert!(output.status.success());
    let names = kind_names(&stdout_json(&output)?)?;
    assert_eq!(names.len(), 10);
    assert!(names.iter().any(|name| name == "active_checks:ftp"));
    Ok(())
}

#[test]
fn json_logs_go_to_stderr_only() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "kinds",
            "--settings",
            "tests/fixtures/settings/settings.valid.toml",
            "--json",
        ],
        &[],
    )?;
    assert!(output.status.success());
    stdout_json(&output)?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let first = stderr.lines().next().ok_or("no log lines at info level")?;
    let event: Value = serde_json::from_str(first)?;
    assert!(event.get("level").is_some());
    Ok(())
}

#[test]
fn quiet_silences_info_logs() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "kinds",
            "--settings",
            "tests/fixtures/settings/settings.valid.toml",
            "--quiet",
        ],
        &[],
    )?;
    assert!(output.status.success());
    assert!(output.stderr.is_empty());
    Ok(())
}

#[test]
fn definitions_without_builtin_catalog() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "normalize",
            "--no-builtin",
            "--definitions",
            "tests/fixtures/definitions/cpu_load.yaml",
            "--kind",
            "checkgroup_parameters:cpu_load",
            "--input-json",
            "[2.5, 5.0]",
            "--json",
        ],
        &[],
    )?;
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)?["config"],
        json!({"levels": [2.5, 5.0], "average": 15})
    );

    let output = checkconf(
        &[
            "kinds",
            "--no-builtin",
            "--definitions",
            "tests/fixtures/definitions/ftp.json",
            "--json",
        ],
        &[],
    )?;
    assert_eq!(kind_names(&stdout_json(&output)?)?, ["active_checks:ftp"]);
    Ok(())
}

#[test]
fn env_overrides_are_applied() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &["kinds", "--json"],
        &[
            ("CHECKCONF_INCLUDE_BUILTIN", "false"),
            (
                "CHECKCONF_DEFINITION_PATHS",
                "tests/fixtures/definitions/ftp.toml, tests/fixtures/definitions/cpu_load.yaml",
            ),
        ],
    )?;
    assert!(output.status.success());
    assert_eq!(
        kind_names(&stdout_json(&output)?)?,
        ["active_checks:ftp", "checkgroup_parameters:cpu_load"]
    );
    Ok(())
}

#[test]
fn invalid_env_values_are_rejected() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&["kinds", "--json"], &[("CHECKCONF_INCLUDE_BUILTIN", "maybe")])?;
    assert_eq!(output.status.code(), Some(2));
    let payload = stdout_json(&output)?;
    assert_eq!(payload["error"]["code"], json!("ERR_CONFIG_INVALID_ENV_BOOL"));
    assert_eq!(
        payload["error"]["meta"]["env_var"],
        json!("CHECKCONF_INCLUDE_BUILTIN")
    );
    Ok(())
}

#[test]
fn unsupported_settings_version_is_rejected() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "kinds",
            "--settings",
            "tests/fixtures/settings/settings.unsupported.json",
            "--json",
        ],
        &[],
    )?;
    assert_eq!(output.status.code(), Some(2));
    let payload = stdout_json(&output)?;
    assert_eq!(
        payload["error"]["code"],
        json!("ERR_CONFIG_UNSUPPORTED_VERSION")
    );
    assert_eq!(
        payload["error"]["meta"]["path"],
        json!("tests/fixtures/settings/settings.unsupported.json")
    );
    Ok(())
}

#[test]
fn registry_problems_map_to_exit_codes() -> Result<(), Box<dyn Error>> {
    let cases = [
        (
            "tests/fixtures/definitions/duplicate_builtin.yaml",
            2,
            "ERR_CONFIG_DUPLICATE_KIND",
        ),
        (
            "tests/fixtures/definitions/undeclared_target.json",
            2,
            "ERR_CONFIG_INVALID_RULE_CHAIN",
        ),
        (
            "tests/fixtures/definitions/absent.json",
            3,
            "ERR_CONFIG_DEFINITIONS_FILE_NOT_FOUND",
        ),
    ];
    for (path, exit, code) in cases {
        let output = checkconf(&["kinds", "--definitions", path, "--json"], &[])?;
        assert_eq!(output.status.code(), Some(exit), "{path}");
        let payload = stdout_json(&output)?;
        assert_eq!(payload["error"]["code"], json!(code), "{path}");
        assert_eq!(payload["error"]["meta"]["path"], json!(path), "{path}");
    }
    Ok(())
}

#[test]
fn definitions_schema_ignores_broken_settings() -> Result<(), Box<dyn Error>> {
    let output = checkconf(
        &[
            "definitions-schema",
            "--settings",
            "tests/fixtures/settings/settings.unsupported.json",
        ],
        &[],
    )?;
    assert!(output.status.success());
    Ok(())
}
