//! Schema-driven masking of secret values.

use crate::schema::{FieldSpec, Schema, ValueKind, ValueSpec};
use crate::value::NormalizedConfig;
use checkconf_shared::REDACTED;
use serde_json::{Map, Value};

/// Copy of `config` with every explicit password replaced by a placeholder.
///
/// Password-store identifiers are references, not secrets, and are kept.
#[must_use]
pub fn mask_secrets(config: &NormalizedConfig, schema: &Schema) -> Value {
    Value::Object(mask_fields(config.values(), schema.fields()))
}

fn mask_fields(values: &Map<String, Value>, fields: &[FieldSpec]) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| {
            let masked = fields
                .iter()
                .find(|field| field.name == *key)
                .map_or_else(|| value.clone(), |field| mask_value(value, &field.spec));
            (key.clone(), masked)
        })
        .collect()
}

fn mask_value(value: &Value, spec: &ValueSpec) -> Value {
    match (&spec.kind, value) {
        (ValueKind::PasswordReference, Value::String(_)) => Value::from(REDACTED),
        (ValueKind::PasswordReference, Value::Array(items)) => match items.as_slice() {
            [Value::String(tag), _] if tag == "password" => {
                Value::Array(vec![Value::from(tag.as_str()), Value::from(REDACTED)])
            },
            _ => value.clone(),
        },
        (ValueKind::Mapping { fields, .. }, Value::Object(values)) => {
            Value::Object(mask_fields(values, fields))
        },
        (ValueKind::Tuple { elements }, Value::Array(items)) => Value::Array(
            items
                .iter()
                .zip(elements)
                .map(|(item, element)| mask_value(item, element))
                .collect(),
        ),
        (ValueKind::ListOf { element }, Value::Array(items)) => {
            Value::Array(items.iter().map(|item| mask_value(item, element)).collect())
        },
        (ValueKind::Cascading { choices }, Value::Array(items)) => match items.as_slice() {
            [Value::String(tag), payload] => {
                let payload = choices
                    .iter()
                    .find(|choice| choice.tag == *tag)
                    .and_then(|choice| choice.payload.as_ref())
                    .map_or_else(|| payload.clone(), |spec| mask_value(payload, spec));
                Value::Array(vec![Value::from(tag.as_str()), payload])
            },
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
