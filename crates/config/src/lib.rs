//! # checkconf-config
//!
//! Registry assembly and tool configuration for checkconf.
//! This crate depends on `domain` and `shared` only.
//!
//! - `RuleRegistry`: explicit map from kind names to checked rule chains
//! - The built-in catalog of check kinds
//! - Definition files (JSON/TOML/YAML) declaring additional kinds
//! - Persisted value loading (JSON/YAML)
//! - `Settings` with file, env, and flag precedence

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// Built-in check kinds.
pub mod catalog;
/// Declarative kind definitions.
pub mod definitions;
/// Input document formats.
pub mod document;
/// Environment variable parsing and merging.
pub mod env;
/// Settings loading and registry assembly.
pub mod load;
/// Persisted value loading.
pub mod raw;
/// The kind registry.
pub mod registry;
/// Tool settings.
pub mod settings;

pub use catalog::{builtin_registry, register_builtin};
pub use definitions::{
    DefinitionsFile, KindDefinition, definitions_json_schema, definitions_to_pretty_json,
    load_definitions_from_path, parse_definitions,
};
pub use document::DocumentFormat;
pub use env::{
    ENV_DEFINITION_PATHS, ENV_INCLUDE_BUILTIN, ENV_LOG_FORMAT, ENV_LOG_LEVEL, EnvParseError,
    SettingsEnv, apply_env_overrides,
};
pub use load::{
    SettingsOverrides, build_registry, load_settings_from_path, load_settings_std_env,
    parse_settings, settings_to_pretty_json,
};
pub use raw::{load_raw_config_from_path, parse_raw_config};
pub use registry::{
    MAX_KIND_NAME_LEN, RegistryEntry, RegistryError, RuleRegistry, RuleRegistryBuilder,
};
pub use settings::{
    CURRENT_SETTINGS_VERSION, LogFormat, LogLevel, LoggingSettings, MAX_DEFINITION_PATHS,
    RegistrySettings, Settings, SettingsError,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
