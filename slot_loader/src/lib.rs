//! Schema File Loading and Import Resolution
//!
//! This crate loads packed-layout schema files from disk, resolves path
//! imports between them, expands shared field references and hands the
//! layout compiler an ordered list of concrete struct declarations.

pub mod error;
pub mod file;
pub mod flatten;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use error::{LoadError, LoadResult};
pub use file::{Filenames, ImportSource, SchemaFile, SchemaMetadata, SchemaOptions};
pub use flatten::{
    flatten_with_options, load_schema, load_schema_with_options, load_single, LoadedSchema,
};
pub use resolver::ImportResolver;

// Re-export slot_types for convenience
pub use slot_types;
