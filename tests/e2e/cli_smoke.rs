//! CLI smoke tests: kinds, schema, definitions-schema.

use serde_json::{Value, json};
use std::error::Error;
use std::process::{Command, Output};

fn checkconf(args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_checkconf"))
        .args(args)
        .env_remove("CHECKCONF_LOG_LEVEL")
        .env_remove("CHECKCONF_LOG_FORMAT")
        .env_remove("CHECKCONF_INCLUDE_BUILTIN")
        .env_remove("CHECKCONF_DEFINITION_PATHS")
        .env_remove("RUST_LOG")
        .output()
}

fn stdout_json(output: &Output) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn kinds_lists_the_builtin_catalog() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&["kinds", "--output", "json"])?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(payload["status"], json!("ok"));
    let names: Vec<&str> = payload["kinds"]
        .as_array()
        .ok_or("kinds is not an array")?
        .iter()
        .filter_map(|kind| kind["name"].as_str())
        .collect();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&"active_checks:bi_aggr"));
    assert!(names.contains(&"checkgroup_parameters:ups_test"));
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "kinds are listed in name order");
    Ok(())
}

#[test]
fn kinds_output_is_deterministic() -> Result<(), Box<dyn Error>> {
    let first = checkconf(&["kinds"])?;
    let second = checkconf(&["kinds"])?;
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).starts_with("status: ok\nkinds: 9\n"));
    Ok(())
}

#[test]
fn schema_prints_fields_of_a_kind() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&["schema", "--kind", "active_checks:traceroute", "--json"])?;
    assert!(output.status.success());

    let payload = stdout_json(&output)?;
    assert_eq!(payload["version"], json!(2));
    let fields: Vec<&str> = payload["schema"]["fields"]
        .as_array()
        .ok_or("fields is not an array")?
        .iter()
        .filter_map(|field| field["name"].as_str())
        .collect();
    assert_eq!(fields, ["dns", "address_family", "routers", "method"]);
    Ok(())
}

#[test]
fn schema_of_unknown_kind_exits_with_invalid_input() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&["schema", "--kind", "active_checks:nope", "--output", "ndjson"])?;
    assert_eq!(output.status.code(), Some(2));

    let payload = stdout_json(&output)?;
    assert_eq!(payload["type"], json!("error"));
    assert_eq!(payload["error"]["code"], json!("ERR_CONFIG_UNKNOWN_KIND"));
    Ok(())
}

#[test]
fn definitions_schema_describes_kind_files() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&["definitions-schema"])?;
    assert!(output.status.success());

    let schema = stdout_json(&output)?;
    assert!(schema.pointer("/properties/kinds").is_some());
    Ok(())
}

#[test]
fn missing_subcommand_is_a_usage_error() -> Result<(), Box<dyn Error>> {
    let output = checkconf(&[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    Ok(())
}
