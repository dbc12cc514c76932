//! Settings loading (defaults + file + env + flags) and registry assembly.
//!
//! The loader owns the merge order and surfaces user-facing failures as
//! typed `ErrorEnvelope`s.

use crate::catalog::register_builtin;
use crate::definitions::load_definitions_from_path;
use crate::document::{DocumentFormat, parse_document, read_document, unsupported_format};
use crate::env::{SettingsEnv, apply_env_overrides};
use crate::registry::RuleRegistry;
use crate::settings::{LogFormat, LogLevel, Settings};
use checkconf_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Overrides supplied on the command line; applied after env.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    /// Force `registry.include_builtin`.
    pub include_builtin: Option<bool>,
    /// Appended to `registry.definition_paths`.
    pub definition_paths: Vec<PathBuf>,
    /// Force `logging.level`.
    pub log_level: Option<LogLevel>,
    /// Force `logging.format`.
    pub log_format: Option<LogFormat>,
}

/// Parse a settings document (JSON or TOML) without applying overrides.
pub fn parse_settings(input: &str, format: DocumentFormat) -> Result<Settings, ErrorEnvelope> {
    if format == DocumentFormat::Yaml {
        return Err(unsupported_format("yaml", "settings must be .json or .toml"));
    }
    let settings: Settings = parse_document(input, format, "invalid_settings", "settings")?;
    settings.validate().map_err(Into::into)
}

/// Load settings using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - command-line overrides
/// - env overrides (`SettingsEnv`)
/// - settings file
/// - defaults (`Settings::default()`)
pub fn load_settings_from_path(
    settings_path: Option<&Path>,
    env: &SettingsEnv,
    overrides: &SettingsOverrides,
) -> Result<Settings, ErrorEnvelope> {
    let base = match settings_path {
        None => Settings::default(),
        Some(path) => {
            let format = DocumentFormat::from_path(path)
                .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?;
            let input = read_document(path, "settings")?;
            parse_settings(&input, format)
                .map_err(|error| error.with_metadata("path", path.to_string_lossy().to_string()))?
        },
    };

    let settings = apply_env_overrides(base, env)?;
    let settings = apply_overrides(settings, overrides)?;
    debug!(
        include_builtin = settings.registry.include_builtin,
        definition_paths = settings.registry.definition_paths.len(),
        level = %settings.logging.level,
        "settings resolved"
    );
    Ok(settings)
}

/// Load settings from an optional file, the process env, and overrides.
pub fn load_settings_std_env(
    settings_path: Option<&Path>,
    overrides: &SettingsOverrides,
) -> Result<Settings, ErrorEnvelope> {
    let env = SettingsEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_settings_from_path(settings_path, &env, overrides)
}

fn apply_overrides(
    mut settings: Settings,
    overrides: &SettingsOverrides,
) -> Result<Settings, ErrorEnvelope> {
    if let Some(include) = overrides.include_builtin {
        settings.registry.include_builtin = include;
    }
    settings
        .registry
        .definition_paths
        .extend(overrides.definition_paths.iter().cloned());
    if let Some(level) = overrides.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = overrides.log_format {
        settings.logging.format = format;
    }
    settings.validate().map_err(Into::into)
}

/// Build the registry described by `settings`.
///
/// The built-in catalog is registered first, then every definitions file in
/// order. A kind declared twice fails with `config:duplicate_kind`.
pub fn build_registry(settings: &Settings) -> Result<RuleRegistry, ErrorEnvelope> {
    let mut builder = RuleRegistry::builder();
    if settings.registry.include_builtin {
        register_builtin(&mut builder)?;
    }
    for path in &settings.registry.definition_paths {
        let definitions = load_definitions_from_path(path)?;
        builder
            .register_definitions(definitions)
            .map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
            })?;
    }
    let registry = builder.build();
    info!(
        kinds = registry.len(),
        builtin = settings.registry.include_builtin,
        files = settings.registry.definition_paths.len(),
        "registry assembled from settings"
    );
    Ok(registry)
}

/// Serialize settings as deterministic pretty JSON (with trailing newline).
pub fn settings_to_pretty_json(settings: &Settings) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(settings).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize settings: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}
