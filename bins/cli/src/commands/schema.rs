//! Schema command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, envelope_output, format_ndjson_summary, pretty_json_line};
use checkconf_config::RuleRegistry;
use serde_json::json;

/// Run the schema command.
pub fn run_schema(
    mode: OutputMode,
    registry: &RuleRegistry,
    kind: &str,
) -> Result<CliOutput, CliError> {
    let entry = match registry.resolve(kind) {
        Ok(entry) => entry,
        Err(error) => return Ok(envelope_output(mode, &error)),
    };
    let schema = serde_json::to_value(entry.schema())?;
    let version = entry.chain().version();

    let stdout = if mode.is_ndjson() {
        format_ndjson_summary(
            "ok",
            "schema",
            Some(json!({ "kind": kind, "version": version, "schema": schema })),
        )
    } else if mode.is_json() {
        pretty_json_line(&json!({
            "status": "ok",
            "kind": kind,
            "version": version,
            "schema": schema,
        }))?
    } else {
        format!(
            "status: ok\nkind: {kind}\nversion: {version}\nschema:\n{}",
            pretty_json_line(&schema)?
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
