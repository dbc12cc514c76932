//! Schema model: versions, field specs, value kinds, and constraints.
//!
//! A [`Schema`] is data. It can be built in Rust with the constructors below
//! or deserialized from a definitions file; either way [`Schema::check`]
//! must pass before the schema is used for normalization.

use crate::error::SchemaError;
use crate::validate::validate_value;
use regex::Regex;
use schemars::JsonSchema;
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered tag identifying one generation of a configuration shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// Initial schema generation.
    pub const INITIAL: Self = Self(1);

    /// Wrap a raw version number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw version number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "v{}", self.0)
    }
}

/// Compiled regular expression that text values must match.
///
/// Serialized as its source string; invalid expressions fail deserialization.
#[derive(Clone)]
pub struct Pattern {
    source: Box<str>,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(source)?;
        Ok(Self {
            source: source.into(),
            regex,
        })
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true when `text` matches the pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source)
            .map_err(|error| de::Error::custom(format!("invalid pattern `{source}`: {error}")))
    }
}

/// Validation constraints attached to a value spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraints {
    /// Inclusive lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Rejects blank text, empty collections, and empty secrets.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub non_empty: bool,
    /// Regular expression text values must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub pattern: Option<Pattern>,
    /// Accept `null` in place of a value.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

/// One alternative of a cascading choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CascadingChoice {
    /// Tag selecting the alternative.
    pub tag: String,
    /// Payload carried next to the tag, if the alternative has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ValueSpec>,
}

impl CascadingChoice {
    /// Alternative without payload.
    pub fn bare(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: None,
        }
    }

    /// Alternative with a payload spec.
    pub fn with_payload(tag: impl Into<String>, payload: ValueSpec) -> Self {
        Self {
            tag: tag.into(),
            payload: Some(payload),
        }
    }
}

/// Semantic type of a configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueKind {
    /// String value.
    Text,
    /// Integer value (i64 range).
    Integer,
    /// Any JSON number.
    Float,
    /// Boolean value.
    Boolean,
    /// One of a fixed set of values.
    Choice {
        /// Allowed values (may include `null`).
        choices: Vec<Value>,
    },
    /// Non-negative number of seconds.
    Duration,
    /// Nested keyed mapping.
    Mapping {
        /// Declared fields.
        fields: Vec<FieldSpec>,
        /// Accept undeclared keys.
        #[serde(default)]
        allow_extra: bool,
    },
    /// Fixed-arity positional sequence.
    Tuple {
        /// Per-position element specs.
        elements: Vec<ValueSpec>,
    },
    /// Sequence of homogeneous items.
    ListOf {
        /// Item spec.
        element: Box<ValueSpec>,
    },
    /// Secret entered inline or referenced from the password store.
    PasswordReference,
    /// Tagged union: a tag and an optional payload.
    Cascading {
        /// Available alternatives.
        choices: Vec<CascadingChoice>,
    },
}

impl ValueKind {
    /// Stable lowercase name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Choice { .. } => "choice",
            Self::Duration => "duration",
            Self::Mapping { .. } => "mapping",
            Self::Tuple { .. } => "tuple",
            Self::ListOf { .. } => "list_of",
            Self::PasswordReference => "password_reference",
            Self::Cascading { .. } => "cascading",
        }
    }

    /// Keys a spec of this kind may carry besides `type` and constraints.
    const fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Choice { .. } | Self::Cascading { .. } => &["choices"],
            Self::Mapping { .. } => &["fields", "allow_extra"],
            Self::Tuple { .. } => &["elements"],
            Self::ListOf { .. } => &["element"],
            Self::Text
            | Self::Integer
            | Self::Float
            | Self::Boolean
            | Self::Duration
            | Self::PasswordReference => &[],
        }
    }
}

/// Value kind plus constraints.
///
/// Deserialization rejects keys that neither the kind nor [`Constraints`]
/// declare, so a misspelled bound fails instead of vanishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "ValueSpecRepr")]
pub struct ValueSpec {
    /// Semantic type.
    #[serde(flatten)]
    pub kind: ValueKind,
    /// Validation constraints.
    #[serde(flatten)]
    pub constraints: Constraints,
}

/// Wire form of [`ValueSpec`]; `rest` sees every key the kind did not
/// consume as a struct field.
#[derive(Deserialize, JsonSchema)]
struct ValueSpecRepr {
    #[serde(flatten)]
    kind: ValueKind,
    #[serde(flatten)]
    constraints: Constraints,
    #[serde(flatten)]
    #[schemars(skip)]
    rest: BTreeMap<String, IgnoredAny>,
}

impl TryFrom<ValueSpecRepr> for ValueSpec {
    type Error = String;

    fn try_from(repr: ValueSpecRepr) -> Result<Self, Self::Error> {
        let known = repr.kind.keys();
        let unknown: Vec<String> = repr
            .rest
            .keys()
            .filter(|key| *key != "type" && !known.contains(&key.as_str()))
            .map(|key| format!("`{key}`"))
            .collect();
        if !unknown.is_empty() {
            let noun = if unknown.len() == 1 { "key" } else { "keys" };
            return Err(format!(
                "unknown {noun} {} in {} spec",
                unknown.join(", "),
                repr.kind.as_str()
            ));
        }
        Ok(Self {
            kind: repr.kind,
            constraints: repr.constraints,
        })
    }
}

impl ValueSpec {
    /// Spec of the given kind without constraints.
    #[must_use]
    pub fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            constraints: Constraints::default(),
        }
    }

    /// Text value.
    #[must_use]
    pub fn text() -> Self {
        Self::of(ValueKind::Text)
    }

    /// Integer value.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(ValueKind::Integer)
    }

    /// Float value.
    #[must_use]
    pub fn float() -> Self {
        Self::of(ValueKind::Float)
    }

    /// Boolean value.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(ValueKind::Boolean)
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration() -> Self {
        Self::of(ValueKind::Duration)
    }

    /// Secret reference.
    #[must_use]
    pub fn password_reference() -> Self {
        Self::of(ValueKind::PasswordReference)
    }

    /// Enumerated choice.
    #[must_use]
    pub fn choice<I>(choices: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::of(ValueKind::Choice {
            choices: choices.into_iter().collect(),
        })
    }

    /// Strict nested mapping.
    #[must_use]
    pub fn mapping(fields: Vec<FieldSpec>) -> Self {
        Self::of(ValueKind::Mapping {
            fields,
            allow_extra: false,
        })
    }

    /// Fixed-arity tuple.
    #[must_use]
    pub fn tuple(elements: Vec<Self>) -> Self {
        Self::of(ValueKind::Tuple { elements })
    }

    /// Homogeneous list.
    #[must_use]
    pub fn list_of(element: Self) -> Self {
        Self::of(ValueKind::ListOf {
            element: Box::new(element),
        })
    }

    /// Tagged union.
    #[must_use]
    pub fn cascading(choices: Vec<CascadingChoice>) -> Self {
        Self::of(ValueKind::Cascading { choices })
    }

    /// Set the inclusive lower bound.
    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    /// Set the inclusive upper bound.
    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    /// Reject empty values.
    #[must_use]
    pub const fn non_empty(mut self) -> Self {
        self.constraints.non_empty = true;
        self
    }

    /// Accept `null`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.constraints.nullable = true;
        self
    }

    /// Require text to match `pattern`.
    #[must_use]
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }
}

/// One named configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "FieldSpecRepr")]
pub struct FieldSpec {
    /// Key name, unique within its schema or mapping.
    pub name: String,
    /// Display title for the rendering layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Help text for the rendering layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Whether the key must be present after normalization.
    #[serde(default)]
    pub required: bool,
    /// Default offered by the rendering layer (optional fields only).
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// Value type and constraints.
    #[serde(flatten)]
    pub spec: ValueSpec,
}

#[derive(Deserialize, JsonSchema)]
struct FieldSpecRepr {
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    help: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default, deserialize_with = "deserialize_present")]
    default: Option<Value>,
    #[serde(flatten)]
    spec: ValueSpecRepr,
}

impl TryFrom<FieldSpecRepr> for FieldSpec {
    type Error = String;

    fn try_from(repr: FieldSpecRepr) -> Result<Self, Self::Error> {
        let spec = ValueSpec::try_from(repr.spec)
            .map_err(|reason| format!("field `{}`: {reason}", repr.name))?;
        Ok(Self {
            name: repr.name,
            title: repr.title,
            help: repr.help,
            required: repr.required,
            default: repr.default,
            spec,
        })
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldSpec {
    /// Required field.
    pub fn required(name: impl Into<String>, spec: ValueSpec) -> Self {
        Self {
            name: name.into(),
            title: None,
            help: None,
            required: true,
            default: None,
            spec,
        }
    }

    /// Optional field.
    pub fn optional(name: impl Into<String>, spec: ValueSpec) -> Self {
        Self {
            required: false,
            ..Self::required(name, spec)
        }
    }

    /// Attach a display title.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Attach a default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Current shape of one configuration kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    version: SchemaVersion,
    #[serde(default)]
    allow_extra: bool,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build and check a strict schema.
    pub fn new(version: SchemaVersion, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let schema = Self {
            version,
            allow_extra: false,
            fields,
        };
        schema.check()?;
        Ok(schema)
    }

    /// Accept undeclared top-level keys.
    #[must_use]
    pub const fn with_extra_fields(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    /// Schema version tag.
    #[must_use]
    pub const fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Whether undeclared top-level keys pass through.
    #[must_use]
    pub const fn allows_extra(&self) -> bool {
        self.allow_extra
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Names of the keys that must be present after normalization.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
    }

    /// Check internal consistency (unique names, defaults, bounds, choices).
    pub fn check(&self) -> Result<(), SchemaError> {
        check_fields(&self.fields, "")
    }
}

fn check_fields(fields: &[FieldSpec], parent: &str) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for field in fields {
        let path = join_path(parent, &field.name);
        if field.name.trim().is_empty() {
            return Err(SchemaError::EmptyFieldName {
                parent: parent.to_string(),
            });
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField { name: path });
        }
        check_spec(&field.spec, &path)?;
        if let Some(default) = &field.default {
            if field.required {
                return Err(SchemaError::DefaultOnRequired { name: path });
            }
            if let Err(violation) = validate_value(default, &field.spec, &path) {
                return Err(SchemaError::InvalidDefault {
                    name: path,
                    reason: violation.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_spec(spec: &ValueSpec, path: &str) -> Result<(), SchemaError> {
    let Constraints { min, max, .. } = spec.constraints;
    let non_finite = min.into_iter().chain(max).any(|bound| !bound.is_finite());
    let inverted = matches!((min, max), (Some(min), Some(max)) if min > max);
    if non_finite || inverted {
        return Err(SchemaError::InvalidBounds {
            name: path.to_string(),
            min,
            max,
        });
    }

    match &spec.kind {
        ValueKind::Choice { choices } if choices.is_empty() => Err(SchemaError::EmptyChoices {
            name: path.to_string(),
        }),
        ValueKind::Mapping { fields, .. } => check_fields(fields, path),
        ValueKind::Tuple { elements } => {
            for (index, element) in elements.iter().enumerate() {
                check_spec(element, &join_path(path, &index.to_string()))?;
            }
            Ok(())
        },
        ValueKind::ListOf { element } => check_spec(element, &join_path(path, "*")),
        ValueKind::Cascading { choices } => {
            if choices.is_empty() {
                return Err(SchemaError::EmptyChoices {
                    name: path.to_string(),
                });
            }
            let mut tags = BTreeSet::new();
            for choice in choices {
                if !tags.insert(choice.tag.as_str()) {
                    return Err(SchemaError::DuplicateAlternative {
                        name: path.to_string(),
                        tag: choice.tag.clone(),
                    });
                }
                if let Some(payload) = &choice.payload {
                    check_spec(payload, &join_path(path, "1"))?;
                }
            }
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Join a parent path and a segment with `.`.
pub(crate) fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}
