//! CLI command handlers.

pub mod definitions_schema;
pub mod kinds;
pub mod normalize;
pub mod schema;

pub use definitions_schema::run_definitions_schema;
pub use kinds::run_kinds;
pub use normalize::{ValueInputArgs, run_check, run_normalize};
pub use schema::run_schema;
