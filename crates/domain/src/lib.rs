//! # checkconf-domain
//!
//! Schema model and normalizer for versioned check configurations.
//!
//! This crate contains the pure configuration model and the migration engine:
//!
//! - **Schema** - `Schema`, `FieldSpec`, `ValueSpec`, `ValueKind`, `Constraints`
//! - **Rules** - `TransformRule` (shape, rename, default fill) and `ValueMapper`
//! - **Values** - `RawConfig`, `NormalizedConfig`
//! - **Normalizer** - `normalize`, `RuleChain`
//! - **Errors** - `NormalizationError`, `SchemaError`, `RuleChainError`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - Pure logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

// Re-export shared types for convenience
pub use checkconf_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod chain;
pub mod error;
pub mod normalize;
pub mod redact;
pub mod rules;
pub mod schema;
pub mod validate;
pub mod value;

pub use chain::RuleChain;
pub use error::{MapperError, NormalizationError, RuleChainError, SchemaError};
pub use normalize::{deprecated_keys, normalize};
pub use redact::mask_secrets;
pub use rules::{
    DefaultFillRule, PackSpec, RenameRule, ShapeRule, TransformRule, ValueMapper,
};
pub use schema::{
    CascadingChoice, Constraints, FieldSpec, Pattern, Schema, SchemaVersion, ValueKind, ValueSpec,
};
pub use validate::{validate_fields, validate_value};
pub use value::{NormalizedConfig, RawConfig};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
