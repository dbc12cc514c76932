//! Raw and normalized configuration values.

use crate::schema::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped persisted configuration value, possibly in an outdated shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConfig(Value);

impl RawConfig {
    /// Wrap a persisted value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap the underlying value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for RawConfig {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Validated configuration conforming to one schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedConfig {
    version: SchemaVersion,
    values: Map<String, Value>,
}

impl NormalizedConfig {
    pub(crate) const fn new(version: SchemaVersion, values: Map<String, Value>) -> Self {
        Self { version, values }
    }

    /// Schema version the values conform to.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Validated key/value mapping.
    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Look up one value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns true when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Turn the values back into a persisted value.
    #[must_use]
    pub fn into_raw(self) -> RawConfig {
        RawConfig(Value::Object(self.values))
    }

    /// Copy of the values as a JSON mapping.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// Short structural name of a JSON value, safe to show in diagnostics.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "text",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_config_converts_back_to_raw() {
        let mut values = Map::new();
        values.insert("uri".to_string(), json!("/"));
        let config = NormalizedConfig::new(SchemaVersion::new(2), values);

        assert!(config.contains_key("uri"));
        assert_eq!(config.into_raw().into_value(), json!({"uri": "/"}));
    }

    #[test]
    fn type_names_distinguish_integers_and_floats() {
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!([1])), "sequence");
        assert_eq!(type_name(&json!({})), "mapping");
    }
}
