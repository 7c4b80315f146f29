//! Configuration schema, generation, and the persisted artifact

pub mod artifact;
pub mod generator;
pub mod schema;

pub use artifact::{discard_staging, write_atomic, ConfigValue, ConfigurationValues};
pub use generator::{EntryOutcome, GenerationReport, Generator};
pub use schema::{BoundSchema, ConfigurationEntry, Schema, SchemaSource, ValueKind};
