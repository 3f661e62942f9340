//! AST generator - Schema
//!
//! This crate holds everything that happens before emission:
//! - Field Descriptor Parser: `Expr *left` -> typed field with ownership kind
//! - Schema Registry: ordered families, variants and the global discriminator list
//! - Loaders for text and JSON schema files
//! - The built-in schema of the interpreter front end

pub mod builtin;
pub mod field;
pub mod loader;
pub mod naming;
pub mod registry;

pub use builtin::builtin_registry;
pub use field::{parse_field, parse_field_list, Field, Ownership, TypeSpec};
pub use loader::{load_schema, parse_schema_json, parse_schema_text};
pub use registry::{
    registry_from_tables, Discriminator, Family, PreludeEnum, Record, Registry, RegistryBuilder,
    Variant, DISCRIMINATOR_TYPE, HEADER_MEMBER, NODE_HEADER_TYPE,
};
