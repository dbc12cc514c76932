//! Kinds command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_ndjson_summary, pretty_json_line};
use checkconf_config::{RegistryEntry, RuleRegistry};
use serde_json::{Value, json};

/// Run the kinds command.
pub fn run_kinds(mode: OutputMode, registry: &RuleRegistry) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_ndjson() {
        format_kinds_ndjson(registry)?
    } else if mode.is_json() {
        let kinds: Vec<Value> = registry.entries().map(kind_payload).collect();
        pretty_json_line(&json!({ "status": "ok", "kinds": kinds }))?
    } else {
        format_kinds_text(registry)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn kind_payload(entry: &RegistryEntry) -> Value {
    json!({
        "name": entry.name(),
        "version": entry.chain().version(),
        "title": entry.title(),
        "rules": entry.chain().rules().len(),
    })
}

fn format_kinds_text(registry: &RuleRegistry) -> String {
    let mut out = format!("status: ok\nkinds: {}\n", registry.len());
    for entry in registry.entries() {
        out.push_str("  ");
        out.push_str(entry.name());
        out.push(' ');
        out.push_str(&entry.chain().version().to_string());
        if let Some(title) = entry.title() {
            out.push_str("  ");
            out.push_str(title);
        }
        out.push('\n');
    }
    out
}

fn format_kinds_ndjson(registry: &RuleRegistry) -> Result<String, CliError> {
    let mut out = String::new();
    for entry in registry.entries() {
        let mut payload = kind_payload(entry);
        if let Value::Object(map) = &mut payload {
            map.insert("type".to_string(), Value::from("kind"));
        }
        out.push_str(&serde_json::to_string(&payload)?);
        out.push('\n');
    }
    out.push_str(&format_ndjson_summary(
        "ok",
        "kinds",
        Some(json!({ "count": registry.len() })),
    ));
    Ok(out)
}
