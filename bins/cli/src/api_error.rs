//! Stable error payloads printed by the CLI.

use checkconf_shared::{ErrorCode, ErrorEnvelope, ErrorKind, REDACTED, is_secret_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorKind {
    /// Rejected input (bad configuration value, unknown kind, bad flags).
    Expected,
    /// Inconsistent schema or rule definitions.
    Invariant,
}

impl ApiErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "EXPECTED",
            Self::Invariant => "INVARIANT",
        }
    }
}

/// Metadata map attached to error payloads.
pub type ApiErrorMeta = BTreeMap<String, String>;

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDto {
    /// Stable error code (e.g. `ERR_CONFIG_UNKNOWN_FIELD`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Error category.
    pub kind: ApiErrorKind,
    /// Diagnostic metadata with secret-looking keys redacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiErrorMeta>,
}

/// Map an error code into `ERR_<NAMESPACE>_<CODE>`.
pub fn error_code_to_api(code: &ErrorCode) -> String {
    let namespace = sanitize_code_segment(code.namespace());
    let detail = sanitize_code_segment(code.code());
    format!("ERR_{namespace}_{detail}")
}

/// Map an `ErrorEnvelope` into an error payload.
pub fn error_envelope_to_api_error(envelope: &ErrorEnvelope) -> ApiErrorDto {
    let meta = if envelope.metadata.is_empty() {
        None
    } else {
        Some(
            envelope
                .metadata
                .iter()
                .map(|(key, value)| {
                    let value = if is_secret_key(key) {
                        REDACTED.to_string()
                    } else {
                        value.clone()
                    };
                    (key.clone(), value)
                })
                .collect(),
        )
    };

    ApiErrorDto {
        code: error_code_to_api(&envelope.code),
        message: envelope.message.clone(),
        kind: match envelope.kind {
            ErrorKind::Expected | ErrorKind::Unexpected => ApiErrorKind::Expected,
            ErrorKind::Invariant => ApiErrorKind::Invariant,
        },
        meta,
    }
}

fn sanitize_code_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn codes_are_upper_snake_case() {
        let code = ErrorCode::new("config", "unknown_field");
        assert_eq!(error_code_to_api(&code), "ERR_CONFIG_UNKNOWN_FIELD");
        let code = ErrorCode::new("config", "settings_file-not.found");
        assert_eq!(error_code_to_api(&code), "ERR_CONFIG_SETTINGS_FILE_NOT_FOUND");
    }

    #[test]
    fn secret_meta_is_redacted() -> Result<(), Box<dyn std::error::Error>> {
        let code = ErrorCode::new("config", "constraint_violation");
        let envelope = ErrorEnvelope::expected(code, "bad")
            .with_metadata("field", "credentials")
            .with_metadata("password", "s3cr3t");
        let dto = error_envelope_to_api_error(&envelope);
        let meta = dto.meta.ok_or("meta missing")?;
        assert_eq!(meta.get("field").map(String::as_str), Some("credentials"));
        assert_eq!(meta.get("password").map(String::as_str), Some(REDACTED));
        assert_eq!(dto.kind, ApiErrorKind::Expected);
        Ok(())
    }

    #[test]
    fn empty_meta_is_omitted() -> Result<(), Box<dyn std::error::Error>> {
        let code = ErrorCode::new("config", "invalid_rule_chain");
        let envelope = ErrorEnvelope::invariant(code, "x");
        let dto = error_envelope_to_api_error(&envelope);
        let json = serde_json::to_value(&dto)?;
        assert_eq!(json.get("kind"), Some(&serde_json::json!("INVARIANT")));
        assert!(json.get("meta").is_none());
        Ok(())
    }

    proptest! {
        #[test]
        fn sanitized_codes_use_only_upper_alphanumerics(
            ns in "[a-z_.:-]{1,12}",
            code in "[a-z0-9_ -]{1,24}",
        ) {
            let api = error_code_to_api(&ErrorCode::new(ns, code));
            prop_assert!(api.starts_with("ERR_"));
            prop_assert!(
                api.chars()
                    .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
            );
        }
    }
}
