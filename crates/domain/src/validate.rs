//! Value validation against field specs.
//!
//! Checks run in a fixed order for every mapping: unknown keys, then
//! required keys, then per-field constraints in declared order. Nested
//! failures are reported with dotted paths (`optional.timeout`).

use crate::error::NormalizationError;
use crate::schema::{Constraints, FieldSpec, ValueKind, ValueSpec, join_path};
use crate::value::type_name;
use serde_json::{Map, Value};

const PASSWORD_TAGS: [&str; 2] = ["password", "store"];

/// Validate a keyed mapping against declared fields.
///
/// `deprecated` holds dotted paths; a key whose path is listed is reported
/// as unknown even when `allow_extra` is set, at any depth.
pub fn validate_fields(
    values: &Map<String, Value>,
    fields: &[FieldSpec],
    allow_extra: bool,
    deprecated: &[&str],
    parent: &str,
) -> Result<(), NormalizationError> {
    for key in values.keys() {
        let path = join_path(parent, key);
        let declared = fields.iter().any(|field| field.name == *key);
        let rejected = deprecated.contains(&path.as_str()) || !allow_extra;
        if !declared && rejected {
            return Err(NormalizationError::UnknownField { name: path });
        }
    }

    for field in fields.iter().filter(|field| field.required) {
        if !values.contains_key(&field.name) {
            return Err(NormalizationError::MissingRequiredField {
                name: join_path(parent, &field.name),
            });
        }
    }

    for field in fields {
        if let Some(value) = values.get(&field.name) {
            let path = join_path(parent, &field.name);
            validate_nested(value, &field.spec, &path, deprecated)?;
        }
    }

    Ok(())
}

/// Validate one value against its spec; `path` names it in errors.
pub fn validate_value(
    value: &Value,
    spec: &ValueSpec,
    path: &str,
) -> Result<(), NormalizationError> {
    validate_nested(value, spec, path, &[])
}

fn validate_nested(
    value: &Value,
    spec: &ValueSpec,
    path: &str,
    deprecated: &[&str],
) -> Result<(), NormalizationError> {
    let constraints = &spec.constraints;
    if value.is_null() && constraints.nullable {
        return Ok(());
    }

    match &spec.kind {
        ValueKind::Text => {
            let text = expect_text(value, path)?;
            if constraints.non_empty && text.trim().is_empty() {
                return Err(NormalizationError::violation(path, "must not be empty"));
            }
            if let Some(pattern) = &constraints.pattern {
                if !pattern.is_match(text) {
                    return Err(NormalizationError::violation(
                        path,
                        format!("does not match pattern `{}`", pattern.as_str()),
                    ));
                }
            }
            Ok(())
        },
        ValueKind::Integer => {
            let number = value
                .as_i64()
                .ok_or_else(|| mismatch(path, "integer", value))?;
            #[expect(clippy::cast_precision_loss, reason = "bounds are compared as f64")]
            let number = number as f64;
            check_bounds(number, constraints, path)
        },
        ValueKind::Float => {
            let number = value.as_f64().ok_or_else(|| mismatch(path, "number", value))?;
            check_bounds(number, constraints, path)
        },
        ValueKind::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(mismatch(path, "boolean", value))
            }
        },
        ValueKind::Choice { choices } => {
            if choices.contains(value) {
                Ok(())
            } else {
                Err(NormalizationError::violation(
                    path,
                    format!("{value} is not one of {}", Value::Array(choices.clone())),
                ))
            }
        },
        ValueKind::Duration => {
            let seconds = value
                .as_i64()
                .filter(|seconds| *seconds >= 0)
                .ok_or_else(|| {
                    NormalizationError::violation(
                        path,
                        format!(
                            "expected a non-negative number of seconds, found {}",
                            type_name(value)
                        ),
                    )
                })?;
            #[expect(clippy::cast_precision_loss, reason = "bounds are compared as f64")]
            let seconds = seconds as f64;
            check_bounds(seconds, constraints, path)
        },
        ValueKind::Mapping {
            fields,
            allow_extra,
        } => {
            let Value::Object(values) = value else {
                return Err(mismatch(path, "mapping", value));
            };
            if constraints.non_empty && values.is_empty() {
                return Err(NormalizationError::violation(path, "must not be empty"));
            }
            validate_fields(values, fields, *allow_extra, deprecated, path)
        },
        ValueKind::Tuple { elements } => {
            let items = expect_sequence(value, path)?;
            if items.len() != elements.len() {
                return Err(NormalizationError::violation(
                    path,
                    format!("expected {} elements, found {}", elements.len(), items.len()),
                ));
            }
            for (index, (item, element)) in items.iter().zip(elements).enumerate() {
                let item_path = join_path(path, &index.to_string());
                validate_nested(item, element, &item_path, deprecated)?;
            }
            Ok(())
        },
        ValueKind::ListOf { element } => {
            let items = expect_sequence(value, path)?;
            if constraints.non_empty && items.is_empty() {
                return Err(NormalizationError::violation(path, "must not be empty"));
            }
            for (index, item) in items.iter().enumerate() {
                let item_path = join_path(path, &index.to_string());
                validate_nested(item, element, &item_path, deprecated)?;
            }
            Ok(())
        },
        ValueKind::PasswordReference => validate_password(value, constraints, path),
        ValueKind::Cascading { choices } => {
            let (tag, payload) = split_cascading(value, path)?;
            let Some(choice) = choices.iter().find(|choice| choice.tag == tag) else {
                return Err(NormalizationError::violation(
                    path,
                    format!("unknown alternative `{tag}`"),
                ));
            };
            match (&choice.payload, payload) {
                (Some(spec), Some(payload)) => {
                    validate_nested(payload, spec, &join_path(path, "1"), deprecated)
                },
                (Some(_), None) => Err(NormalizationError::violation(
                    path,
                    format!("alternative `{tag}` requires a value"),
                )),
                (None, Some(_)) => Err(NormalizationError::violation(
                    path,
                    format!("alternative `{tag}` takes no value"),
                )),
                (None, None) => Ok(()),
            }
        },
    }
}

fn validate_password(
    value: &Value,
    constraints: &Constraints,
    path: &str,
) -> Result<(), NormalizationError> {
    let secret = match value {
        Value::String(secret) => secret.as_str(),
        Value::Array(items) => match items.as_slice() {
            [Value::String(tag), Value::String(secret)]
                if PASSWORD_TAGS.contains(&tag.as_str()) =>
            {
                secret.as_str()
            },
            _ => {
                return Err(NormalizationError::violation(
                    path,
                    "expected a password or a [\"password\"|\"store\", text] pair",
                ));
            },
        },
        other => return Err(mismatch(path, "password reference", other)),
    };
    if constraints.non_empty && secret.is_empty() {
        return Err(NormalizationError::violation(path, "must not be empty"));
    }
    Ok(())
}

fn split_cascading<'a>(
    value: &'a Value,
    path: &str,
) -> Result<(&'a str, Option<&'a Value>), NormalizationError> {
    match value {
        Value::String(tag) => Ok((tag, None)),
        Value::Array(items) => match items.as_slice() {
            [Value::String(tag)] => Ok((tag, None)),
            [Value::String(tag), payload] => Ok((tag, Some(payload))),
            _ => Err(NormalizationError::violation(
                path,
                format!(
                    "expected a tag or a [tag, value] pair, found a sequence of {} elements",
                    items.len()
                ),
            )),
        },
        other => Err(mismatch(path, "tag or [tag, value] pair", other)),
    }
}

fn check_bounds(
    number: f64,
    constraints: &Constraints,
    path: &str,
) -> Result<(), NormalizationError> {
    if let Some(min) = constraints.min {
        if number < min {
            return Err(NormalizationError::violation(path, format!("must be >= {min}")));
        }
    }
    if let Some(max) = constraints.max {
        if number > max {
            return Err(NormalizationError::violation(path, format!("must be <= {max}")));
        }
    }
    Ok(())
}

fn expect_text<'a>(value: &'a Value, path: &str) -> Result<&'a str, NormalizationError> {
    value.as_str().ok_or_else(|| mismatch(path, "text", value))
}

fn expect_sequence<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, NormalizationError> {
    value
        .as_array()
        .ok_or_else(|| mismatch(path, "sequence", value))
}

fn mismatch(path: &str, expected: &str, value: &Value) -> NormalizationError {
    NormalizationError::violation(
        path,
        format!("expected {expected}, found {}", type_name(value)),
    )
}
