//! Layout model: fields, validated structs and the schema generation rules.

pub mod conventions;
pub mod errors;
pub mod field;
pub mod structs;

pub use conventions::{ADDRESS_BITS, Conventions, DEFAULT_GENERATION, MaskStyle, WORD_BITS};
pub use errors::{SchemaError, SchemaResult};
pub use field::{Field, FieldType, FieldVars};
pub use structs::{Struct, StructNames};
