//! Loading persisted configuration values from JSON or YAML.

use crate::document::{DocumentFormat, parse_document, read_document, unsupported_format};
use checkconf_domain::RawConfig;
use checkconf_shared::ErrorEnvelope;
use std::path::Path;

/// Parse a persisted value.
///
/// TOML cannot express `null` or a top-level sequence and is rejected.
pub fn parse_raw_config(input: &str, format: DocumentFormat) -> Result<RawConfig, ErrorEnvelope> {
    if format == DocumentFormat::Toml {
        return Err(unsupported_format("toml", "persisted values must be JSON or YAML"));
    }
    parse_document(input, format, "invalid_raw_config", "raw config")
}

/// Read and parse a persisted value from a file.
pub fn load_raw_config_from_path(path: &Path) -> Result<RawConfig, ErrorEnvelope> {
    let format = DocumentFormat::from_path(path)?;
    if format == DocumentFormat::Toml {
        return Err(unsupported_format("toml", "persisted values must be JSON or YAML")
            .with_metadata("path", path.to_string_lossy().to_string()));
    }
    let input = read_document(path, "raw_config")?;
    parse_raw_config(&input, format)
        .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_and_json_parse_to_the_same_value() -> Result<(), ErrorEnvelope> {
        let from_json = parse_raw_config(
            r#"["http://x", "agg", "automation", "pw", {}]"#,
            DocumentFormat::Json,
        )?;
        let from_yaml = parse_raw_config(
            "- http://x\n- agg\n- automation\n- pw\n- {}\n",
            DocumentFormat::Yaml,
        )?;
        assert_eq!(from_json, from_yaml);
        assert_eq!(
            from_json.into_value(),
            json!(["http://x", "agg", "automation", "pw", {}])
        );
        Ok(())
    }

    #[test]
    fn toml_is_rejected() {
        let result = parse_raw_config("uri = \"/\"", DocumentFormat::Toml);
        assert!(matches!(
            result,
            Err(ref error) if error.code.to_string() == "config:unsupported_format"
        ));
    }

    #[test]
    fn malformed_input_is_invalid_raw_config() {
        let result = parse_raw_config("{", DocumentFormat::Json);
        assert!(matches!(
            result,
            Err(ref error) if error.code.to_string() == "config:invalid_raw_config"
        ));
    }
}
