//! Settings for the checkconf tool itself.

use checkconf_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Current supported settings version.
pub const CURRENT_SETTINGS_VERSION: u32 = 1;

/// Maximum number of definition files loaded at startup.
pub const MAX_DEFINITION_PATHS: usize = 64;

/// Top-level tool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Settings version for forward-compatible migrations.
    pub version: u32,
    /// Which kinds the registry is built from.
    pub registry: RegistrySettings,
    /// Diagnostic logging.
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_SETTINGS_VERSION,
            registry: RegistrySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Validate the settings.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.version != CURRENT_SETTINGS_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_SETTINGS_VERSION,
            });
        }
        self.registry.validate()?;
        Ok(self)
    }
}

/// Registry assembly settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RegistrySettings {
    /// Register the built-in catalog.
    pub include_builtin: bool,
    /// Definition files registered after the built-in catalog, in order.
    pub definition_paths: Vec<PathBuf>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            include_builtin: true,
            definition_paths: Vec::new(),
        }
    }
}

impl RegistrySettings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.definition_paths.len() > MAX_DEFINITION_PATHS {
            return Err(SettingsError::TooManyDefinitionPaths {
                len: self.definition_paths.len(),
                max: MAX_DEFINITION_PATHS,
            });
        }
        if let Some(index) = self
            .definition_paths
            .iter()
            .position(|path| path.as_os_str().is_empty())
        {
            return Err(SettingsError::EmptyDefinitionPath { index });
        }
        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSettings {
    /// Minimum level emitted.
    pub level: LogLevel,
    /// Output encoding.
    pub format: LogFormat,
}

/// Minimum log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    #[default]
    Warn,
    /// Informational events.
    Info,
    /// Per-rule diagnostics.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Parse a level name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Settings validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Settings version is not supported.
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Supported version.
        supported: u32,
    },
    /// Too many definition files.
    TooManyDefinitionPaths {
        /// Number of paths.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A definition path is empty.
    EmptyDefinitionPath {
        /// Position in `definition_paths`.
        index: usize,
    },
}

impl SettingsError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TooManyDefinitionPaths { .. } => ErrorCode::new("config", "list_too_large"),
            Self::EmptyDefinitionPath { .. } => ErrorCode::new("config", "invalid_definition_path"),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported settings version: {found} (supported: {supported})"
            ),
            Self::TooManyDefinitionPaths { len, max } => write!(
                formatter,
                "registry.definition_paths is too large ({len} items, max {max})"
            ),
            Self::EmptyDefinitionPath { index } => {
                write!(formatter, "registry.definition_paths[{index}] must be non-empty")
            },
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<SettingsError> for ErrorEnvelope {
    fn from(error: SettingsError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            SettingsError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            SettingsError::TooManyDefinitionPaths { len, max } => envelope
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
            SettingsError::EmptyDefinitionPath { index } => {
                envelope.with_metadata("index", index.to_string())
            },
        }
    }
}
