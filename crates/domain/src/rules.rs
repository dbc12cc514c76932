//! Declarative migration rules and value mappers.

use crate::error::{MapperError, NormalizationError};
use crate::value::type_name;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// VALUE MAPPERS
// =============================================================================

/// Structural transformation applied to a moved value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueMapper {
    /// Keep the value unchanged.
    #[default]
    Identity,
    /// Replace the value with a constant.
    Constant {
        /// Replacement value.
        value: Value,
    },
    /// Wrap the value as `[tag, value]`.
    Tagged {
        /// Leading tag.
        tag: String,
    },
    /// Multiply every integer of a sequence by `factor`.
    Scale {
        /// Multiplier.
        factor: i64,
        /// Yield `null` when every element is zero.
        #[serde(default)]
        null_if_all_zero: bool,
    },
}

impl ValueMapper {
    /// Apply the mapper to a value.
    pub fn apply(&self, value: Value) -> Result<Value, MapperError> {
        match self {
            Self::Identity => Ok(value),
            Self::Constant { value } => Ok(value.clone()),
            Self::Tagged { tag } => Ok(Value::Array(vec![Value::String(tag.clone()), value])),
            Self::Scale {
                factor,
                null_if_all_zero,
            } => scale(&value, *factor, *null_if_all_zero),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Constant { .. } => "constant",
            Self::Tagged { .. } => "tagged",
            Self::Scale { .. } => "scale",
        }
    }
}

fn scale(value: &Value, factor: i64, null_if_all_zero: bool) -> Result<Value, MapperError> {
    let Value::Array(items) = value else {
        return Err(MapperError::ExpectedSequence {
            found: type_name(value),
        });
    };

    let mut numbers = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let number = item.as_i64().ok_or(MapperError::ExpectedInteger {
            index,
            found: type_name(item),
        })?;
        numbers.push(number);
    }

    if null_if_all_zero && numbers.iter().all(|number| *number == 0) {
        return Ok(Value::Null);
    }

    let mut scaled = Vec::with_capacity(numbers.len());
    for (index, number) in numbers.into_iter().enumerate() {
        let product = number
            .checked_mul(factor)
            .ok_or(MapperError::Overflow { index })?;
        scaled.push(Value::from(product));
    }
    Ok(Value::Array(scaled))
}

// =============================================================================
// TRANSFORM RULES
// =============================================================================

/// Repackages several shaped keys into one target key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PackSpec {
    /// Key receiving the mapped value.
    pub target: String,
    /// Keys removed and fed to the mapper (a single source is passed bare).
    pub sources: Vec<String>,
    /// Mapper applied to the collected sources.
    #[serde(default)]
    pub mapper: ValueMapper,
}

/// Maps a legacy positional sequence onto named keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ShapeRule {
    /// Legacy field names in positional order.
    pub fields: Vec<String>,
    /// Repackaging steps applied after positional mapping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packs: Vec<PackSpec>,
}

/// Moves a deprecated key to its new name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RenameRule {
    /// Keys leading to the nested mapping holding `old_key`; empty for the
    /// top level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub within: Vec<String>,
    /// Deprecated key name.
    pub old_key: String,
    /// Current key name.
    pub new_key: String,
    /// Mapper applied to the moved value.
    #[serde(default)]
    pub mapper: ValueMapper,
}

/// Inserts a value for an absent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DefaultFillRule {
    /// Key to fill.
    pub key: String,
    /// Inserted value.
    pub value: Value,
}

/// One deterministic migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TransformRule {
    /// Positional sequence to keyed mapping.
    Shape(ShapeRule),
    /// Deprecated key to new key.
    Rename(RenameRule),
    /// Insert a missing key.
    DefaultFill(DefaultFillRule),
}

impl TransformRule {
    /// Shape rule without packs.
    pub fn shape<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Shape(ShapeRule {
            fields: fields.into_iter().map(Into::into).collect(),
            packs: Vec::new(),
        })
    }

    /// Shape rule with packs.
    pub fn shape_with_packs<I, S>(fields: I, packs: Vec<PackSpec>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Shape(ShapeRule {
            fields: fields.into_iter().map(Into::into).collect(),
            packs,
        })
    }

    /// Rename rule on the top-level mapping.
    pub fn rename(
        old_key: impl Into<String>,
        new_key: impl Into<String>,
        mapper: ValueMapper,
    ) -> Self {
        Self::rename_within(Vec::<String>::new(), old_key, new_key, mapper)
    }

    /// Rename rule on the nested mapping reached through `within`.
    pub fn rename_within<I, S>(
        within: I,
        old_key: impl Into<String>,
        new_key: impl Into<String>,
        mapper: ValueMapper,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Rename(RenameRule {
            within: within.into_iter().map(Into::into).collect(),
            old_key: old_key.into(),
            new_key: new_key.into(),
            mapper,
        })
    }

    /// Default-fill rule.
    pub fn default_fill(key: impl Into<String>, value: Value) -> Self {
        Self::DefaultFill(DefaultFillRule {
            key: key.into(),
            value,
        })
    }

    /// Stable lowercase rule name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Rename(_) => "rename",
            Self::DefaultFill(_) => "default_fill",
        }
    }

    /// Apply the rule to a value, returning the transformed value.
    pub fn apply(&self, value: Value) -> Result<Value, NormalizationError> {
        match (self, value) {
            (Self::Shape(rule), Value::Array(items)) => rule.apply(items).map(Value::Object),
            (Self::Rename(rule), Value::Object(values)) => rule.apply(values).map(Value::Object),
            (Self::DefaultFill(rule), Value::Object(mut values)) => {
                if !values.contains_key(&rule.key) {
                    values.insert(rule.key.clone(), rule.value.clone());
                }
                Ok(Value::Object(values))
            },
            (_, value) => Ok(value),
        }
    }
}

impl PackSpec {
    /// Pack `sources` into `target` through `mapper`.
    pub fn new<I, S>(target: impl Into<String>, sources: I, mapper: ValueMapper) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            mapper,
        }
    }
}

impl ShapeRule {
    fn apply(&self, items: Vec<Value>) -> Result<Map<String, Value>, NormalizationError> {
        if items.len() != self.fields.len() {
            return Err(NormalizationError::ShapeMismatch {
                expected: format!("sequence of {} elements", self.fields.len()),
                found: format!("sequence of {} elements", items.len()),
            });
        }

        let mut values: Map<String, Value> = self.fields.iter().cloned().zip(items).collect();
        for pack in &self.packs {
            let mut collected: Vec<Value> = pack
                .sources
                .iter()
                .map(|source| values.remove(source).unwrap_or(Value::Null))
                .collect();
            let input = if collected.len() == 1 {
                collected.pop().unwrap_or(Value::Null)
            } else {
                Value::Array(collected)
            };
            let packed = pack.mapper.apply(input).map_err(|error| {
                NormalizationError::violation(pack.target.clone(), error.to_string())
            })?;
            tracing::debug!(
                target_key = %pack.target,
                mapper = pack.mapper.label(),
                "packed legacy fields"
            );
            values.insert(pack.target.clone(), packed);
        }
        Ok(values)
    }
}

impl RenameRule {
    /// Dotted path of the deprecated key.
    #[must_use]
    pub fn old_path(&self) -> String {
        self.path_to(&self.old_key)
    }

    /// Dotted path of the current key.
    #[must_use]
    pub fn new_path(&self) -> String {
        self.path_to(&self.new_key)
    }

    fn path_to(&self, key: &str) -> String {
        self.within
            .iter()
            .map(String::as_str)
            .chain([key])
            .collect::<Vec<_>>()
            .join(".")
    }

    fn apply(
        &self,
        mut values: Map<String, Value>,
    ) -> Result<Map<String, Value>, NormalizationError> {
        // Absent or mistyped scopes are left for validation to report.
        if let Some(scope) = scope_mut(&mut values, &self.within) {
            self.rename_in(scope)?;
        }
        Ok(values)
    }

    fn rename_in(&self, scope: &mut Map<String, Value>) -> Result<(), NormalizationError> {
        if scope.contains_key(&self.new_key) {
            return Ok(());
        }
        let Some(old) = scope.remove(&self.old_key) else {
            return Ok(());
        };
        let renamed = self
            .mapper
            .apply(old)
            .map_err(|error| NormalizationError::violation(self.new_path(), error.to_string()))?;
        tracing::debug!(
            old_key = %self.old_path(),
            new_key = %self.new_path(),
            mapper = self.mapper.label(),
            "renamed deprecated key"
        );
        scope.insert(self.new_key.clone(), renamed);
        Ok(())
    }
}

fn scope_mut<'a>(
    values: &'a mut Map<String, Value>,
    path: &[String],
) -> Option<&'a mut Map<String, Value>> {
    let Some((first, rest)) = path.split_first() else {
        return Some(values);
    };
    match values.get_mut(first) {
        Some(Value::Object(nested)) => scope_mut(nested, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_and_constant_mappers() -> Result<(), MapperError> {
        let tagged = ValueMapper::Tagged {
            tag: "configured".to_string(),
        };
        assert_eq!(
            tagged.apply(json!(["automation", "pw"]))?,
            json!(["configured", ["automation", "pw"]])
        );

        let constant = ValueMapper::Constant {
            value: json!("tls_standard"),
        };
        assert_eq!(constant.apply(json!(true))?, json!("tls_standard"));
        assert_eq!(ValueMapper::Identity.apply(json!(3))?, json!(3));
        Ok(())
    }

    #[test]
    fn scale_mapper_multiplies_or_nulls() -> Result<(), MapperError> {
        let days = ValueMapper::Scale {
            factor: 86_400,
            null_if_all_zero: true,
        };
        assert_eq!(days.apply(json!([2, 3]))?, json!([172_800, 259_200]));
        assert_eq!(days.apply(json!([0, 0]))?, Value::Null);
        assert_eq!(
            days.apply(json!("2")),
            Err(MapperError::ExpectedSequence { found: "text" })
        );
        assert_eq!(
            days.apply(json!([1, 1.5])),
            Err(MapperError::ExpectedInteger {
                index: 1,
                found: "float"
            })
        );
        let huge = ValueMapper::Scale {
            factor: i64::MAX,
            null_if_all_zero: false,
        };
        assert_eq!(
            huge.apply(json!([2])),
            Err(MapperError::Overflow { index: 0 })
        );
        Ok(())
    }

    #[test]
    fn shape_maps_positions_and_packs() -> Result<(), NormalizationError> {
        let rule = TransformRule::shape_with_packs(
            ["base_url", "aggregation_name", "user", "secret", "optional"],
            vec![PackSpec::new(
                "credentials",
                ["user", "secret"],
                ValueMapper::Tagged {
                    tag: "configured".to_string(),
                },
            )],
        );
        let shaped = rule.apply(json!(["http://x", "agg", "automation", "pw", {}]))?;
        assert_eq!(
            shaped,
            json!({
                "base_url": "http://x",
                "aggregation_name": "agg",
                "credentials": ["configured", ["automation", "pw"]],
                "optional": {}
            })
        );
        Ok(())
    }

    #[test]
    fn shape_requires_exact_arity_and_skips_mappings() -> Result<(), NormalizationError> {
        let rule = TransformRule::shape(["a", "b", "c", "d", "e"]);
        assert!(matches!(
            rule.apply(json!([1, 2, 3])),
            Err(NormalizationError::ShapeMismatch { .. })
        ));
        let mapping = json!({"a": 1});
        assert_eq!(rule.apply(mapping.clone())?, mapping);
        Ok(())
    }

    #[test]
    fn rename_moves_only_when_new_key_absent() -> Result<(), NormalizationError> {
        let rule = TransformRule::rename(
            "ssl",
            "tls_configuration",
            ValueMapper::Constant {
                value: json!("tls_standard"),
            },
        );
        assert_eq!(
            rule.apply(json!({"uri": "/", "ssl": true}))?,
            json!({"uri": "/", "tls_configuration": "tls_standard"})
        );

        let migrated = json!({"uri": "/", "tls_configuration": "no_tls"});
        assert_eq!(rule.apply(migrated.clone())?, migrated);

        let both = json!({"ssl": true, "tls_configuration": "no_tls"});
        assert_eq!(rule.apply(both.clone())?, both);
        Ok(())
    }

    #[test]
    fn nested_rename_edits_only_its_scope() -> Result<(), NormalizationError> {
        let rule = TransformRule::rename_within(
            ["params"],
            "ssl",
            "tls_configuration",
            ValueMapper::Constant {
                value: json!("tls_standard"),
            },
        );
        let legacy = json!({
            "name": "My form",
            "ssl": 1,
            "params": {"uri": "/", "ssl": true}
        });
        assert_eq!(
            rule.apply(legacy)?,
            json!({
                "name": "My form",
                "ssl": 1,
                "params": {"uri": "/", "tls_configuration": "tls_standard"}
            })
        );

        let without_scope = json!({"name": "My form"});
        assert_eq!(rule.apply(without_scope.clone())?, without_scope);
        let scalar_scope = json!({"params": "/"});
        assert_eq!(rule.apply(scalar_scope.clone())?, scalar_scope);

        let TransformRule::Rename(rename) = &rule else {
            return Ok(());
        };
        assert_eq!(rename.old_path(), "params.ssl");
        assert_eq!(rename.new_path(), "params.tls_configuration");
        Ok(())
    }

    #[test]
    fn default_fill_never_overwrites() -> Result<(), NormalizationError> {
        let rule = TransformRule::default_fill("address_family", Value::Null);
        assert_eq!(
            rule.apply(json!({"dns": false}))?,
            json!({"dns": false, "address_family": null})
        );
        let present = json!({"address_family": "ipv6"});
        assert_eq!(rule.apply(present.clone())?, present);
        assert_eq!(rule.apply(json!([1]))?, json!([1]));
        Ok(())
    }

    #[test]
    fn rules_deserialize_from_tagged_json() -> Result<(), serde_json::Error> {
        let rules: Vec<TransformRule> = serde_json::from_value(json!([
            {"rule": "shape", "fields": ["warn_days", "crit_days"], "packs": [
                {"target": "levels_elapsed_time", "sources": ["warn_days", "crit_days"],
                 "mapper": {"kind": "scale", "factor": 86400, "null_if_all_zero": true}}
            ]},
            {"rule": "rename", "within": ["params"], "old_key": "ssl",
             "new_key": "tls_configuration",
             "mapper": {"kind": "constant", "value": "tls_standard"}},
            {"rule": "default_fill", "key": "address_family", "value": null}
        ]))?;
        assert_eq!(
            rules.iter().map(TransformRule::label).collect::<Vec<_>>(),
            vec!["shape", "rename", "default_fill"]
        );
        assert!(matches!(
            rules.get(1),
            Some(TransformRule::Rename(RenameRule {
                mapper: ValueMapper::Constant { .. },
                within,
                ..
            })) if within == &["params"]
        ));
        Ok(())
    }
}
