//! Definitions-schema command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_ndjson_summary, pretty_json_line};
use checkconf_config::definitions_json_schema;
use serde_json::json;

/// Print the JSON Schema that definitions files must satisfy.
pub fn run_definitions_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let schema = serde_json::to_value(definitions_json_schema())?;
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "definitions-schema", Some(json!({ "schema": schema })))
    } else {
        pretty_json_line(&schema)?
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
