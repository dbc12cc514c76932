//! Document formats and file reading shared by the loaders.

use checkconf_shared::{ErrorCode, ErrorEnvelope};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

/// Serialization format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON (`.json`, or no extension).
    Json,
    /// TOML (`.toml`).
    Toml,
    /// YAML (`.yaml` / `.yml`).
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ErrorEnvelope> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some(other) => Err(unsupported_format(other, "use .json, .toml, .yaml, or .yml")),
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

pub(crate) fn unsupported_format(extension: &str, hint: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("config", "unsupported_format"),
        format!("unsupported format `{extension}`; {hint}"),
    )
    .with_metadata("extension", extension.to_string())
}

/// Read a document, mapping failures to `config:<source>_file_*` codes.
pub(crate) fn read_document(path: &Path, source: &str) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let suffix = match error.kind() {
            std::io::ErrorKind::NotFound => "file_not_found",
            std::io::ErrorKind::PermissionDenied => "file_permission_denied",
            _ => "file_io",
        };
        let label = source.replace('_', " ");
        ErrorEnvelope::expected(
            ErrorCode::new("config", format!("{source}_{suffix}")),
            format!("failed to read {label} file: {error}"),
        )
        .with_metadata("path", path.to_string_lossy().to_string())
    })
}

/// Deserialize a document, mapping failures to `config:<code>`.
pub(crate) fn parse_document<T>(
    input: &str,
    format: DocumentFormat,
    code: &str,
    label: &str,
) -> Result<T, ErrorEnvelope>
where
    T: DeserializeOwned,
{
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(input).map_err(|error| error.to_string()),
        DocumentFormat::Toml => toml::from_str(input).map_err(|error| error.to_string()),
        DocumentFormat::Yaml => serde_yaml_ng::from_str(input).map_err(|error| error.to_string()),
    };
    parsed.map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", code),
            format!("invalid {label} {}: {error}", format.as_str().to_ascii_uppercase()),
        )
        .with_metadata("format", format.as_str())
    })
}
