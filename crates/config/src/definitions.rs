//! Declarative kind definitions loaded from data files.

use crate::document::{DocumentFormat, parse_document, read_document};
use checkconf_domain::{Schema, TransformRule};
use checkconf_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Contents of a definitions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DefinitionsFile {
    /// Declared kinds, registered in order.
    pub kinds: Vec<KindDefinition>,
}

/// One declared configuration kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct KindDefinition {
    /// Registry name, e.g. `active_checks:bi_aggr`.
    pub name: String,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Current schema.
    pub schema: Schema,
    /// Migration rules, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<TransformRule>,
}

/// Parse a definitions document.
pub fn parse_definitions(
    input: &str,
    format: DocumentFormat,
) -> Result<DefinitionsFile, ErrorEnvelope> {
    parse_document(input, format, "invalid_definitions", "definitions")
}

/// Read and parse a definitions file; the format follows the extension.
pub fn load_definitions_from_path(path: &Path) -> Result<DefinitionsFile, ErrorEnvelope> {
    let format = DocumentFormat::from_path(path)?;
    let input = read_document(path, "definitions")?;
    let definitions = parse_definitions(&input, format)
        .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?;
    debug!(
        path = %path.display(),
        format = format.as_str(),
        kinds = definitions.kinds.len(),
        "definitions loaded"
    );
    Ok(definitions)
}

/// JSON Schema describing definitions files.
#[must_use]
pub fn definitions_json_schema() -> schemars::Schema {
    schemars::schema_for!(DefinitionsFile)
}

/// Serialize definitions as deterministic pretty JSON (with trailing newline).
pub fn definitions_to_pretty_json(definitions: &DefinitionsFile) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(definitions).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize definitions: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}
