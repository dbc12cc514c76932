//! Typed errors for schemas, rule chains, mappers, and normalization.

use checkconf_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Reasons a raw configuration cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The value (or a legacy sequence) does not have the expected structure.
    ShapeMismatch {
        /// Structure the normalizer expected.
        expected: String,
        /// Structure actually found.
        found: String,
    },
    /// A required key is absent after all rules ran.
    MissingRequiredField {
        /// Dotted path of the missing key.
        name: String,
    },
    /// A key is not declared by the schema.
    UnknownField {
        /// Dotted path of the unknown key.
        name: String,
    },
    /// A present value fails its field's type or constraints.
    ConstraintViolation {
        /// Dotted path of the offending value.
        name: String,
        /// Human-readable reason; never contains secret values.
        reason: String,
    },
}

impl NormalizationError {
    pub(crate) fn violation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            Self::ShapeMismatch { .. } => ErrorCode::new("config", "shape_mismatch"),
            Self::MissingRequiredField { .. } => {
                ErrorCode::new("config", "missing_required_field")
            },
            Self::UnknownField { .. } => ErrorCode::new("config", "unknown_field"),
            Self::ConstraintViolation { .. } => ErrorCode::new("config", "constraint_violation"),
        }
    }

    /// Dotted path of the field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ShapeMismatch { .. } => None,
            Self::MissingRequiredField { name }
            | Self::UnknownField { name }
            | Self::ConstraintViolation { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, found } => {
                write!(formatter, "shape mismatch: expected {expected}, found {found}")
            },
            Self::MissingRequiredField { name } => {
                write!(formatter, "missing required field `{name}`")
            },
            Self::UnknownField { name } => write!(formatter, "unknown field `{name}`"),
            Self::ConstraintViolation { name, reason } => {
                write!(formatter, "invalid value for `{name}`: {reason}")
            },
        }
    }
}

impl std::error::Error for NormalizationError {}

impl From<NormalizationError> for ErrorEnvelope {
    fn from(error: NormalizationError) -> Self {
        let mut envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            NormalizationError::ShapeMismatch { expected, found } => {
                envelope = envelope
                    .with_metadata("expected", expected)
                    .with_metadata("found", found);
            },
            NormalizationError::MissingRequiredField { name }
            | NormalizationError::UnknownField { name } => {
                envelope = envelope.with_metadata("field", name);
            },
            NormalizationError::ConstraintViolation { name, reason } => {
                envelope = envelope
                    .with_metadata("field", name)
                    .with_metadata("reason", reason);
            },
        }
        envelope
    }
}

/// Inconsistencies detected while checking a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A field name is blank.
    EmptyFieldName {
        /// Path of the enclosing mapping (empty at top level).
        parent: String,
    },
    /// Two fields share a name.
    DuplicateField {
        /// Dotted path of the duplicated field.
        name: String,
    },
    /// A required field declares a default.
    DefaultOnRequired {
        /// Dotted path of the field.
        name: String,
    },
    /// A default does not validate against its own spec.
    InvalidDefault {
        /// Dotted path of the field.
        name: String,
        /// Validation failure.
        reason: String,
    },
    /// A bound is not finite, or `min` is greater than `max`.
    InvalidBounds {
        /// Dotted path of the value spec.
        name: String,
        /// Declared lower bound.
        min: Option<f64>,
        /// Declared upper bound.
        max: Option<f64>,
    },
    /// A choice or cascading spec lists no alternatives.
    EmptyChoices {
        /// Dotted path of the value spec.
        name: String,
    },
    /// A cascading spec repeats a tag.
    DuplicateAlternative {
        /// Dotted path of the value spec.
        name: String,
        /// Repeated tag.
        tag: String,
    },
    /// A pattern constraint does not compile.
    InvalidPattern {
        /// Dotted path of the value spec.
        name: String,
        /// Compiler message.
        reason: String,
    },
}

impl SchemaError {
    /// Wrap a regex compile failure for the value spec at `name`.
    #[must_use]
    pub fn invalid_pattern(name: impl Into<String>, error: &regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFieldName { parent } if parent.is_empty() => {
                formatter.write_str("field names must be non-empty")
            },
            Self::EmptyFieldName { parent } => {
                write!(formatter, "field names under `{parent}` must be non-empty")
            },
            Self::DuplicateField { name } => write!(formatter, "field `{name}` is declared twice"),
            Self::DefaultOnRequired { name } => {
                write!(formatter, "required field `{name}` cannot declare a default")
            },
            Self::InvalidDefault { name, reason } => {
                write!(formatter, "default for `{name}` is invalid: {reason}")
            },
            Self::InvalidBounds { name, min, max } => write!(
                formatter,
                "bounds for `{name}` are invalid (min {}, max {})",
                bound_text(*min),
                bound_text(*max)
            ),
            Self::EmptyChoices { name } => {
                write!(formatter, "`{name}` must declare at least one choice")
            },
            Self::DuplicateAlternative { name, tag } => {
                write!(formatter, "`{name}` declares alternative `{tag}` twice")
            },
            Self::InvalidPattern { name, reason } => {
                write!(formatter, "pattern for `{name}` is invalid: {reason}")
            },
        }
    }
}

fn bound_text(bound: Option<f64>) -> String {
    bound.map_or_else(|| "unset".to_string(), |bound| bound.to_string())
}

impl std::error::Error for SchemaError {}

impl From<SchemaError> for ErrorEnvelope {
    fn from(error: SchemaError) -> Self {
        let envelope =
            Self::invariant(ErrorCode::new("config", "invalid_schema"), error.to_string());
        match error {
            SchemaError::EmptyFieldName { parent } => envelope.with_metadata("parent", parent),
            SchemaError::DuplicateField { name }
            | SchemaError::DefaultOnRequired { name }
            | SchemaError::InvalidDefault { name, .. }
            | SchemaError::InvalidBounds { name, .. }
            | SchemaError::EmptyChoices { name }
            | SchemaError::DuplicateAlternative { name, .. }
            | SchemaError::InvalidPattern { name, .. } => {
                envelope.with_metadata("field", name)
            },
        }
    }
}

/// Inconsistencies between a schema and its transform rules.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleChainError {
    /// The schema itself is inconsistent.
    Schema(SchemaError),
    /// A shape rule appears after another rule.
    ShapeNotFirst {
        /// Position of the misplaced rule.
        position: usize,
    },
    /// A shape rule declares no fields.
    EmptyShape,
    /// A shape rule lists a field twice.
    DuplicateShapeField {
        /// Repeated field name.
        name: String,
    },
    /// A pack reads a key the shape rule does not produce.
    UnknownPackSource {
        /// Pack target.
        target: String,
        /// Offending source key.
        source: String,
    },
    /// A rule writes a key the schema does not declare.
    UndeclaredTarget {
        /// Rule label.
        rule: &'static str,
        /// Target key.
        key: String,
    },
    /// A rename maps a key onto itself.
    SelfRename {
        /// Key name.
        key: String,
    },
    /// A rename source is still a declared field.
    DeprecatedKeyDeclared {
        /// Key name.
        key: String,
    },
    /// A default-fill value fails its target field.
    InvalidFill {
        /// Target key.
        key: String,
        /// Validation failure.
        reason: String,
    },
}

impl RuleChainError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Schema(_) => ErrorCode::new("config", "invalid_schema"),
            _ => ErrorCode::new("config", "invalid_rule_chain"),
        }
    }
}

impl fmt::Display for RuleChainError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(error) => write!(formatter, "{error}"),
            Self::ShapeNotFirst { position } => write!(
                formatter,
                "shape rule at position {position} must be the first rule"
            ),
            Self::EmptyShape => formatter.write_str("shape rule must declare at least one field"),
            Self::DuplicateShapeField { name } => {
                write!(formatter, "shape rule lists field `{name}` twice")
            },
            Self::UnknownPackSource { target, source } => write!(
                formatter,
                "pack `{target}` reads `{source}`, which the shape rule does not produce"
            ),
            Self::UndeclaredTarget { rule, key } => {
                write!(formatter, "{rule} rule writes undeclared field `{key}`")
            },
            Self::SelfRename { key } => write!(formatter, "rename of `{key}` onto itself"),
            Self::DeprecatedKeyDeclared { key } => write!(
                formatter,
                "renamed key `{key}` is still declared by the schema"
            ),
            Self::InvalidFill { key, reason } => {
                write!(formatter, "default fill for `{key}` is invalid: {reason}")
            },
        }
    }
}

impl std::error::Error for RuleChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SchemaError> for RuleChainError {
    fn from(error: SchemaError) -> Self {
        Self::Schema(error)
    }
}

impl From<RuleChainError> for ErrorEnvelope {
    fn from(error: RuleChainError) -> Self {
        let envelope = Self::invariant(error.error_code(), error.to_string());
        match error {
            RuleChainError::Schema(inner) => inner.into(),
            RuleChainError::UnknownPackSource { target, source } => envelope
                .with_metadata("field", target)
                .with_metadata("source", source),
            RuleChainError::UndeclaredTarget { rule, key } => envelope
                .with_metadata("rule", rule)
                .with_metadata("field", key),
            RuleChainError::DuplicateShapeField { name: key }
            | RuleChainError::SelfRename { key }
            | RuleChainError::DeprecatedKeyDeclared { key }
            | RuleChainError::InvalidFill { key, .. } => envelope.with_metadata("field", key),
            RuleChainError::ShapeNotFirst { position } => {
                envelope.with_metadata("position", position.to_string())
            },
            RuleChainError::EmptyShape => envelope,
        }
    }
}

/// Failures of a value mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    /// The mapper needs a sequence.
    ExpectedSequence {
        /// Type name of the value received.
        found: &'static str,
    },
    /// A sequence element is not an integer.
    ExpectedInteger {
        /// Element position.
        index: usize,
        /// Type name of the element.
        found: &'static str,
    },
    /// Scaling overflowed the integer range.
    Overflow {
        /// Element position.
        index: usize,
    },
}

impl fmt::Display for MapperError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedSequence { found } => {
                write!(formatter, "expected a sequence, found {found}")
            },
            Self::ExpectedInteger { index, found } => {
                write!(formatter, "element {index} must be an integer, found {found}")
            },
            Self::Overflow { index } => write!(formatter, "element {index} overflows when scaled"),
        }
    }
}

impl std::error::Error for MapperError {}

#[cfg(test)]
mod tests {
    use super::*;
    use checkconf_shared::{ErrorClass, ErrorKind};

    #[test]
    fn normalization_errors_map_to_expected_envelopes() {
        let envelope = ErrorEnvelope::from(NormalizationError::UnknownField {
            name: "bogus_key".to_string(),
        });
        assert_eq!(envelope.kind, ErrorKind::Expected);
        assert_eq!(envelope.class, ErrorClass::NonRetriable);
        assert_eq!(envelope.code.to_string(), "config:unknown_field");
        assert_eq!(
            envelope.metadata.get("field").map(String::as_str),
            Some("bogus_key")
        );

        let envelope = ErrorEnvelope::from(NormalizationError::ShapeMismatch {
            expected: "sequence of 5 elements".to_string(),
            found: "sequence of 3 elements".to_string(),
        });
        assert_eq!(envelope.code.to_string(), "config:shape_mismatch");
        assert_eq!(
            envelope.metadata.get("found").map(String::as_str),
            Some("sequence of 3 elements")
        );
    }

    #[test]
    fn rule_chain_errors_are_invariants() {
        let envelope = ErrorEnvelope::from(RuleChainError::SelfRename {
            key: "ssl".to_string(),
        });
        assert_eq!(envelope.kind, ErrorKind::Invariant);
        assert_eq!(envelope.code.to_string(), "config:invalid_rule_chain");

        let envelope = ErrorEnvelope::from(RuleChainError::Schema(SchemaError::DuplicateField {
            name: "port".to_string(),
        }));
        assert_eq!(envelope.code.to_string(), "config:invalid_schema");
    }

    #[test]
    fn display_names_the_field() {
        let error = NormalizationError::violation("optional.timeout", "must be >= 1");
        assert_eq!(
            error.to_string(),
            "invalid value for `optional.timeout`: must be >= 1"
        );
        assert_eq!(error.field(), Some("optional.timeout"));
    }
}
