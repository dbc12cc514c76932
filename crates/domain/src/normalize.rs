//! The normalizer: transform rules followed by schema validation.

use crate::error::NormalizationError;
use crate::rules::TransformRule;
use crate::schema::Schema;
use crate::validate::validate_fields;
use crate::value::{NormalizedConfig, RawConfig, type_name};
use serde_json::Value;
use tracing::debug;

/// Normalize a persisted value to the current shape of `schema`.
///
/// `rules` run left to right, each receiving the previous output. The
/// result is validated against the schema; any failure discards the
/// partially transformed value.
///
/// # Examples
///
/// ```
/// use checkconf_domain::{
///     FieldSpec, RawConfig, Schema, SchemaVersion, TransformRule, ValueSpec, normalize,
/// };
/// use serde_json::json;
///
/// let schema = Schema::new(
///     SchemaVersion::new(2),
///     vec![FieldSpec::required("address_family", ValueSpec::text().nullable())],
/// )?;
/// let rules = [TransformRule::default_fill("address_family", json!(null))];
///
/// let config = normalize(RawConfig::new(json!({})), &schema, &rules)?;
/// assert_eq!(config.get("address_family"), Some(&json!(null)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn normalize(
    raw: RawConfig,
    schema: &Schema,
    rules: &[TransformRule],
) -> Result<NormalizedConfig, NormalizationError> {
    let mut value = raw.into_value();
    for (position, rule) in rules.iter().enumerate() {
        value = rule.apply(value)?;
        debug!(rule = rule.label(), position, "transform rule applied");
    }

    let Value::Object(values) = value else {
        return Err(NormalizationError::ShapeMismatch {
            expected: "mapping".to_string(),
            found: type_name(&value).to_string(),
        });
    };

    let deprecated = deprecated_keys(rules);
    let deprecated: Vec<&str> = deprecated.iter().map(String::as_str).collect();
    validate_fields(
        &values,
        schema.fields(),
        schema.allows_extra(),
        &deprecated,
        "",
    )?;

    debug!(
        version = %schema.version(),
        keys = values.len(),
        "configuration normalized"
    );
    Ok(NormalizedConfig::new(schema.version(), values))
}

/// Dotted paths of the keys that rename rules retire.
pub fn deprecated_keys(rules: &[TransformRule]) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| match rule {
            TransformRule::Rename(rename) => Some(rename.old_path()),
            _ => None,
        })
        .collect()
}
