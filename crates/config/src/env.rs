//! Environment variable parsing and env-to-settings merging.
//!
//! Env parsing is strict: a variable that is present but empty or malformed
//! fails fast instead of being ignored. Values of secret-looking variables
//! are redacted in error metadata.

use crate::settings::{LogFormat, LogLevel, MAX_DEFINITION_PATHS, Settings, SettingsError};
use checkconf_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Env var: minimum log level.
pub const ENV_LOG_LEVEL: &str = "CHECKCONF_LOG_LEVEL";
/// Env var: log encoding (`text` | `json`).
pub const ENV_LOG_FORMAT: &str = "CHECKCONF_LOG_FORMAT";
/// Env var: register the built-in catalog (true/false).
pub const ENV_INCLUDE_BUILTIN: &str = "CHECKCONF_INCLUDE_BUILTIN";
/// Env var: definition files as a comma-separated list.
pub const ENV_DEFINITION_PATHS: &str = "CHECKCONF_DEFINITION_PATHS";

const ALL_VARS: [&str; 4] = [
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
    ENV_INCLUDE_BUILTIN,
    ENV_DEFINITION_PATHS,
];

/// Typed env-derived overrides for `Settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsEnv {
    /// Override for `logging.level`.
    pub log_level: Option<LogLevel>,
    /// Override for `logging.format`.
    pub log_format: Option<LogFormat>,
    /// Override for `registry.include_builtin`.
    pub include_builtin: Option<bool>,
    /// Override for `registry.definition_paths` (full replacement).
    pub definition_paths: Option<Vec<PathBuf>>,
}

impl SettingsEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            log_level: parse_optional_enum(map, ENV_LOG_LEVEL, LogLevel::parse)?,
            log_format: parse_optional_enum(map, ENV_LOG_FORMAT, LogFormat::parse)?,
            include_builtin: parse_optional_bool(map, ENV_INCLUDE_BUILTIN)?,
            definition_paths: parse_optional_paths(map, ENV_DEFINITION_PATHS)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.log_level.is_none()
            && self.log_format.is_none()
            && self.include_builtin.is_none()
            && self.definition_paths.is_none()
    }
}

/// Apply env overrides to base settings (env wins over file/default values).
pub fn apply_env_overrides(base: Settings, env: &SettingsEnv) -> Result<Settings, SettingsError> {
    let mut settings = base;
    if let Some(level) = env.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = env.log_format {
        settings.logging.format = format;
    }
    if let Some(include) = env.include_builtin {
        settings.registry.include_builtin = include;
    }
    if let Some(paths) = &env.definition_paths {
        settings.registry.definition_paths.clone_from(paths);
    }
    settings.validate()
}

/// Env parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an unsupported value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// CSV env var had too many entries.
    CsvTooLarge {
        /// Env var name.
        var: &'static str,
        /// Number of entries.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
            Self::CsvTooLarge { .. } => ErrorCode::new("config", "invalid_env_csv"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
            Self::CsvTooLarge { var, len, max } => {
                write!(formatter, "{var} is too large ({len} items, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_if_secret(var, &value)),
            EnvParseError::CsvTooLarge { var, len, max } => envelope
                .with_metadata("env_var", var)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

fn non_empty<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<&'a str>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed))
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(trimmed) = non_empty(map, var)? else {
        return Ok(None);
    };
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: trimmed.to_string(),
        }),
    }
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(trimmed) = non_empty(map, var)? else {
        return Ok(None);
    };
    parse(trimmed).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: trimmed.to_string(),
    })
}

fn parse_optional_paths(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<PathBuf>>, EnvParseError> {
    let Some(trimmed) = non_empty(map, var)? else {
        return Ok(None);
    };
    let entries = parse_csv(trimmed);
    if entries.len() > MAX_DEFINITION_PATHS {
        return Err(EnvParseError::CsvTooLarge {
            var,
            len: entries.len(),
            max: MAX_DEFINITION_PATHS,
        });
    }
    Ok(Some(entries.into_iter().map(PathBuf::from).collect()))
}

fn parse_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
