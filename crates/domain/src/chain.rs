//! Checked pairing of a schema with its migration rules.

use crate::error::{NormalizationError, RuleChainError};
use crate::normalize::normalize;
use crate::rules::TransformRule;
use crate::schema::{FieldSpec, Schema, SchemaVersion, ValueKind};
use crate::validate::validate_value;
use crate::value::{NormalizedConfig, RawConfig};
use std::collections::BTreeSet;

/// A schema plus the ordered rules that migrate older values to it.
///
/// Construction verifies that the rules are consistent with the schema, so
/// a chain held by a registry can only fail on bad input data.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleChain {
    schema: Schema,
    rules: Vec<TransformRule>,
}

impl RuleChain {
    /// Check and pair `schema` with `rules`.
    pub fn new(schema: Schema, rules: Vec<TransformRule>) -> Result<Self, RuleChainError> {
        schema.check()?;
        check_rules(&schema, &rules)?;
        Ok(Self { schema, rules })
    }

    /// Target schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Migration rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    /// Target schema version.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.schema.version()
    }

    /// Normalize a persisted value with this chain.
    pub fn normalize(&self, raw: RawConfig) -> Result<NormalizedConfig, NormalizationError> {
        normalize(raw, &self.schema, &self.rules)
    }
}

fn check_rules(schema: &Schema, rules: &[TransformRule]) -> Result<(), RuleChainError> {
    let declared = |key: &str| schema.allows_extra() || schema.field(key).is_some();

    for (position, rule) in rules.iter().enumerate() {
        match rule {
            TransformRule::Shape(shape) => {
                if position != 0 {
                    return Err(RuleChainError::ShapeNotFirst { position });
                }
                if shape.fields.is_empty() {
                    return Err(RuleChainError::EmptyShape);
                }
                let mut produced = BTreeSet::new();
                for field in &shape.fields {
                    if !produced.insert(field.as_str()) {
                        return Err(RuleChainError::DuplicateShapeField {
                            name: field.clone(),
                        });
                    }
                }
                for pack in &shape.packs {
                    for source in &pack.sources {
                        if !produced.remove(source.as_str()) {
                            return Err(RuleChainError::UnknownPackSource {
                                target: pack.target.clone(),
                                source: source.clone(),
                            });
                        }
                    }
                    if !declared(&pack.target) {
                        return Err(RuleChainError::UndeclaredTarget {
                            rule: rule.label(),
                            key: pack.target.clone(),
                        });
                    }
                    produced.insert(pack.target.as_str());
                }
            },
            TransformRule::Rename(rename) => {
                if rename.old_key == rename.new_key {
                    return Err(RuleChainError::SelfRename {
                        key: rename.old_path(),
                    });
                }
                let Some((fields, allow_extra)) = rename_scope(schema, &rename.within) else {
                    return Err(RuleChainError::UndeclaredTarget {
                        rule: rule.label(),
                        key: rename.within.join("."),
                    });
                };
                let has_field = |key: &str| fields.iter().any(|field| field.name == key);
                if has_field(&rename.old_key) {
                    return Err(RuleChainError::DeprecatedKeyDeclared {
                        key: rename.old_path(),
                    });
                }
                if !allow_extra && !has_field(&rename.new_key) {
                    return Err(RuleChainError::UndeclaredTarget {
                        rule: rule.label(),
                        key: rename.new_path(),
                    });
                }
            },
            TransformRule::DefaultFill(fill) => {
                let Some(field) = schema.field(&fill.key) else {
                    if schema.allows_extra() {
                        continue;
                    }
                    return Err(RuleChainError::UndeclaredTarget {
                        rule: rule.label(),
                        key: fill.key.clone(),
                    });
                };
                if let Err(violation) = validate_value(&fill.value, &field.spec, &fill.key) {
                    return Err(RuleChainError::InvalidFill {
                        key: fill.key.clone(),
                        reason: violation.to_string(),
                    });
                }
            },
        }
    }
    Ok(())
}

/// Fields and passthrough flag of the mapping reached through `within`.
fn rename_scope<'a>(schema: &'a Schema, within: &[String]) -> Option<(&'a [FieldSpec], bool)> {
    let mut scope = (schema.fields(), schema.allows_extra());
    for key in within {
        let field = scope.0.iter().find(|field| field.name == *key)?;
        let ValueKind::Mapping {
            fields,
            allow_extra,
        } = &field.spec.kind
        else {
            return None;
        };
        scope = (fields.as_slice(), *allow_extra);
    }
    Some(scope)
}
