//! CLI normalize/check tests against the built-in catalog.

use serde_json::{Value, json};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const BI_AGGR_LEGACY: &str = r#"["http://monitoring.example.com/site", "Hosts", "automation", ["password", "s3cr3t"], {"timeout": 30}]"#;

fn command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_checkconf"));
    command
        .env_remove("CHECKCONF_LOG_LEVEL")
        .env_remove("CHECKCONF_LOG_FORMAT")
        .env_remove("CHECKCONF_INCLUDE_BUILTIN")
        .env_remove("CHECKCONF_DEFINITION_PATHS")
        .env_remove("RUST_LOG");
    command
}

fn checkconf(args: &[&str]) -> std::io::Result<Output> {
    command().args(args).output()
}

fn checkconf_stdin(args: &[&str], input: &str) -> Result<Output, Box<dyn Error>> {
    let mut child = command()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .ok_or("stdin not piped")?
        .write_all(input.as_bytes())?;
    Ok(child.wait_with_output()?)
}

fn raw_fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../crates/config/tests/fixtures/raw")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn stdout_json(output: &Output) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn legacy_tuple_is_normalized_and_masked() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[
        "normalize",
        "--kind",
        "active_checks:bi_aggr",
        "--input-json",
        BI_AGGR_LEGACY,
        "--json",
    ])?;
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("s3cr3t"));

    let payload = stdout_json(&output)?;
    assert_eq!(
        payload,
        json!({
            "status": "ok",
            "kind": "active_checks:bi_aggr",
            "version": 2,
            "config": {
                "base_url": "http://monitoring.example.com/site",
                "aggregation_name": "Hosts",
                "credentials": ["configured", ["automation", ["password", "[REDACTED]"]]],
                "optional": {"timeout": 30},
            },
        })
    );
    Ok(())
}

#[test]
fn show_secrets_keeps_the_password() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[
        "normalize",
        "--kind",
        "active_checks:bi_aggr",
        "--input",
        &raw_fixture("bi_aggr.legacy.yaml"),
        "--output",
        "json",
        "--show-secrets",
    ])?;
    assert!(output.status.success());
    let payload = stdout_json(&output)?;
    assert_eq!(
        payload.pointer("/config/credentials/1/1"),
        Some(&json!(["password", "s3cr3t"]))
    );
    Ok(())
}

#[test]
fn normalized_output_is_a_fixed_point() -> Result<(), Box<dyn Error>> {
    let first = checkconf(&[
        "normalize",
        "--kind",
        "active_checks:form_submit",
        "--input",
        &raw_fixture("form_submit.v1.json"),
        "--json",
    ])?;
    assert!(first.status.success());
    let config = stdout_json(&first)?["config"].clone();
    assert_eq!(config["name"], json!("Shop login"));
    assert_eq!(config["params"]["tls_configuration"], json!("tls_standard"));
    assert!(config["params"].get("ssl").is_none());

    let second = checkconf(&[
        "normalize",
        "--kind",
        "active_checks:form_submit",
        "--input-json",
        &config.to_string(),
        "--json",
    ])?;
    assert!(second.status.success());
    assert_eq!(stdout_json(&second)?["config"], config);
    Ok(())
}

#[test]
fn yaml_from_stdin_is_accepted() -> Result<(), Box<dyn Error>> {
    let output = checkconf_stdin(
        &[
            "normalize",
            "--kind",
            "checkgroup_parameters:ups_test",
            "--stdin",
            "--stdin-format",
            "yaml",
            "--output",
            "ndjson",
        ],
        "- 2\n- 3\n",
    )?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(payload["type"], json!("summary"));
    assert_eq!(payload["command"], json!("normalize"));
    assert_eq!(
        payload["config"],
        json!({"levels_elapsed_time": [172_800, 259_200]})
    );
    Ok(())
}

#[test]
fn check_accepts_a_valid_value() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[
        "check",
        "--kind",
        "active_checks:traceroute",
        "--input-json",
        r#"{"dns": false, "routers": [["gw.example.com", "W"]], "method": "icmp"}"#,
    ])?;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "status: ok\nkind: active_checks:traceroute\nversion: v2\n"
    );
    Ok(())
}

#[test]
fn rejections_carry_stable_codes() -> Result<(), Box<dyn Error>> {
    let cases = [
        (
            "active_checks:traceroute",
            r#"{"dns": false, "routers": [], "method": null, "colour": "red"}"#,
            "ERR_CONFIG_UNKNOWN_FIELD",
        ),
        (
            "active_checks:traceroute",
            r#"{"dns": false, "routers": []}"#,
            "ERR_CONFIG_MISSING_REQUIRED_FIELD",
        ),
        (
            "active_checks:traceroute",
            r#"{"dns": "yes", "routers": [], "method": null}"#,
            "ERR_CONFIG_CONSTRAINT_VIOLATION",
        ),
        (
            "active_checks:bi_aggr",
            r#"["http://x", "agg"]"#,
            "ERR_CONFIG_SHAPE_MISMATCH",
        ),
    ];
    for (kind, input, code) in cases {
        let output = checkconf(&["check", "--kind", kind, "--input-json", input, "--json"])?;
        assert_eq!(output.status.code(), Some(2), "{kind} {input}");
        let payload = stdout_json(&output)?;
        assert_eq!(payload["status"], json!("error"));
        assert_eq!(payload["error"]["code"], json!(code), "{kind} {input}");
        assert_eq!(payload["error"]["kind"], json!("EXPECTED"));
    }
    Ok(())
}

#[test]
fn malformed_inline_json_is_invalid_input() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[
        "check",
        "--kind",
        "custom_checks",
        "--input-json",
        "{not json",
    ])?;
    assert_eq!(output.status.code(), Some(2));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("code: ERR_CONFIG_INVALID_RAW_CONFIG\n"));
    Ok(())
}

#[test]
fn missing_input_file_is_an_io_failure() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[
        "check",
        "--kind",
        "custom_checks",
        "--input",
        &raw_fixture("does-not-exist.json"),
        "--json",
    ])?;
    assert_eq!(output.status.code(), Some(3));
    let payload = stdout_json(&output)?;
    assert_eq!(
        payload["error"]["code"],
        json!("ERR_CONFIG_RAW_CONFIG_FILE_NOT_FOUND")
    );
    Ok(())
}
