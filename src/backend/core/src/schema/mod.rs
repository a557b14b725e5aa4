//! Schema registry: per-entity field descriptors built once and cached.
//!
//! Entities describe their fields statically through the [`Entity`] trait
//! (name, declared type, accessor). The [`SchemaRegistry`] turns that into a
//! shared, immutable [`EntitySchema`] on first use, which the predicate
//! compiler consults to resolve property names, convert criterion values and
//! pick text fields for free-text search.

pub mod field;
pub mod registry;

pub use field::{Accessor, ConversionError, FieldDescriptor, FieldType, FieldValue};
pub use registry::{Entity, EntitySchema, FieldSummary, SchemaRegistry, SchemaSummary};
