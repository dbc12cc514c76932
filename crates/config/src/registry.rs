//! Explicit registry of configuration kinds.
//!
//! A `RuleRegistry` maps kind names (`active_checks:bi_aggr`) to checked
//! rule chains. It is assembled once through `RuleRegistryBuilder` and is
//! immutable afterwards, so it can be shared across threads by reference.

use crate::definitions::{DefinitionsFile, KindDefinition};
use checkconf_domain::{NormalizedConfig, RawConfig, RuleChain, RuleChainError, Schema};
use checkconf_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Maximum length of a kind name.
pub const MAX_KIND_NAME_LEN: usize = 128;

/// One registered configuration kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    name: Box<str>,
    title: Option<Box<str>>,
    chain: RuleChain,
}

impl RegistryEntry {
    /// Kind name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Checked schema and rules.
    #[must_use]
    pub const fn chain(&self) -> &RuleChain {
        &self.chain
    }

    /// Target schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        self.chain.schema()
    }
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Kind name is blank, too long, or contains whitespace.
    InvalidKindName {
        /// Rejected name.
        name: String,
    },
    /// Kind name is already registered.
    DuplicateKind {
        /// Kind name.
        kind: String,
    },
    /// The kind's schema and rules are inconsistent.
    InvalidChain {
        /// Kind name.
        kind: String,
        /// Underlying check failure.
        error: RuleChainError,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKindName { name } => write!(formatter, "invalid kind name `{name}`"),
            Self::DuplicateKind { kind } => {
                write!(formatter, "kind `{kind}` is already registered")
            },
            Self::InvalidChain { kind, error } => write!(formatter, "kind `{kind}`: {error}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidChain { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<RegistryError> for ErrorEnvelope {
    fn from(error: RegistryError) -> Self {
        let message = error.to_string();
        match error {
            RegistryError::InvalidKindName { name } => {
                Self::invariant(ErrorCode::new("config", "invalid_kind_name"), message)
                    .with_metadata("kind", name)
            },
            RegistryError::DuplicateKind { kind } => {
                Self::invariant(ErrorCode::new("config", "duplicate_kind"), message)
                    .with_metadata("kind", kind)
            },
            RegistryError::InvalidChain { kind, error } => {
                let mut envelope = Self::from(error);
                envelope.message = message;
                envelope.with_metadata("kind", kind)
            },
        }
    }
}

/// Builder collecting kinds before the registry is frozen.
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    entries: BTreeMap<Box<str>, RegistryEntry>,
}

impl RuleRegistryBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checked chain under `name`.
    pub fn register(
        &mut self,
        name: &str,
        title: Option<&str>,
        chain: RuleChain,
    ) -> Result<&mut Self, RegistryError> {
        let name = validate_kind_name(name)?;
        if self.entries.contains_key(name) {
            return Err(RegistryError::DuplicateKind {
                kind: name.to_string(),
            });
        }
        debug!(
            kind = name,
            version = %chain.version(),
            rules = chain.rules().len(),
            "kind registered"
        );
        self.entries.insert(
            name.into(),
            RegistryEntry {
                name: name.into(),
                title: title.map(Into::into),
                chain,
            },
        );
        Ok(self)
    }

    /// Check and register one declared kind.
    pub fn register_definition(
        &mut self,
        definition: KindDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let KindDefinition {
            name,
            title,
            schema,
            rules,
        } = definition;
        let chain = RuleChain::new(schema, rules).map_err(|error| RegistryError::InvalidChain {
            kind: name.clone(),
            error,
        })?;
        self.register(&name, title.as_deref(), chain)
    }

    /// Check and register every kind of a definitions file.
    pub fn register_definitions(
        &mut self,
        definitions: DefinitionsFile,
    ) -> Result<&mut Self, RegistryError> {
        for definition in definitions.kinds {
            self.register_definition(definition)?;
        }
        Ok(self)
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> RuleRegistry {
        info!(kinds = self.entries.len(), "rule registry built");
        RuleRegistry {
            entries: self.entries,
        }
    }
}

fn validate_kind_name(name: &str) -> Result<&str, RegistryError> {
    let trimmed = name.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_KIND_NAME_LEN
        && !trimmed.chars().any(char::is_whitespace);
    if valid {
        Ok(trimmed)
    } else {
        Err(RegistryError::InvalidKindName {
            name: name.to_string(),
        })
    }
}

/// Immutable map from kind name to rule chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRegistry {
    entries: BTreeMap<Box<str>, RegistryEntry>,
}

impl RuleRegistry {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::new()
    }

    /// Look up a kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&RegistryEntry> {
        self.entries.get(kind)
    }

    /// Registered kind names in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|kind| &**kind)
    }

    /// Registered entries in kind-name order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a kind or fail with `config:unknown_kind`.
    pub fn resolve(&self, kind: &str) -> Result<&RegistryEntry, ErrorEnvelope> {
        self.get(kind).ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "unknown_kind"),
                format!("unknown configuration kind `{kind}`"),
            )
            .with_metadata("kind", kind)
        })
    }

    /// Normalize a persisted value of `kind`.
    pub fn normalize(&self, kind: &str, raw: RawConfig) -> Result<NormalizedConfig, ErrorEnvelope> {
        let entry = self.resolve(kind)?;
        let config = entry.chain.normalize(raw).map_err(|error| {
            let envelope = ErrorEnvelope::from(error).with_metadata("kind", kind);
            debug!(kind, code = %envelope.code, "normalization rejected");
            envelope
        })?;
        debug!(kind, version = %config.version(), "normalization accepted");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkconf_domain::{FieldSpec, SchemaVersion, TransformRule, ValueSpec};
    use checkconf_shared::ErrorKind;
    use serde_json::json;

    fn chain() -> Result<RuleChain, Box<dyn std::error::Error>> {
        let schema = Schema::new(
            SchemaVersion::new(2),
            vec![
                FieldSpec::required("dns", ValueSpec::boolean()),
                FieldSpec::required(
                    "address_family",
                    ValueSpec::choice([json!(null), json!("ipv4"), json!("ipv6")]),
                ),
            ],
        )?;
        Ok(RuleChain::new(
            schema,
            vec![TransformRule::default_fill("address_family", json!(null))],
        )?)
    }

    #[test]
    fn registry_normalizes_registered_kinds() -> Result<(), Box<dyn std::error::Error>> {
        let mut builder = RuleRegistry::builder();
        builder.register("active_checks:traceroute", Some("Check current routing"), chain()?)?;
        let registry = builder.build();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.kinds().collect::<Vec<_>>(),
            vec!["active_checks:traceroute"]
        );
        let config = registry.normalize(
            "active_checks:traceroute",
            RawConfig::new(json!({"dns": true})),
        )?;
        assert_eq!(config.get("address_family"), Some(&json!(null)));
        Ok(())
    }

    #[test]
    fn duplicate_and_invalid_names_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut builder = RuleRegistry::builder();
        builder.register("traceroute", None, chain()?)?;
        let duplicate = builder.register("traceroute", None, chain()?);
        assert!(matches!(duplicate, Err(RegistryError::DuplicateKind { .. })));

        let invalid = builder.register("two words", None, chain()?);
        assert!(matches!(invalid, Err(RegistryError::InvalidKindName { .. })));

        let envelope = ErrorEnvelope::from(RegistryError::DuplicateKind {
            kind: "traceroute".to_string(),
        });
        assert_eq!(envelope.code.to_string(), "config:duplicate_kind");
        Ok(())
    }

    #[test]
    fn unknown_kinds_and_rejections_carry_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let mut builder = RuleRegistry::builder();
        builder.register("traceroute", None, chain()?)?;
        let registry = builder.build();

        let Err(error) = registry.normalize("nope", RawConfig::new(json!({}))) else {
            return Err("expected unknown kind".into());
        };
        assert_eq!(error.code.to_string(), "config:unknown_kind");
        assert_eq!(error.kind, ErrorKind::Expected);

        let Err(error) = registry.normalize("traceroute", RawConfig::new(json!({"dns": 1}))) else {
            return Err("expected constraint violation".into());
        };
        assert_eq!(error.code.to_string(), "config:constraint_violation");
        assert_eq!(error.metadata.get("kind").map(String::as_str), Some("traceroute"));
        assert_eq!(error.metadata.get("field").map(String::as_str), Some("dns"));
        Ok(())
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleRegistry>();
    }
}
