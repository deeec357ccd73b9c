use thiserror::Error;

/// Schema shape and layout errors.
///
/// Field-level variants are raised when a single field is built; the
/// remaining variants are raised while folding a struct's field list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(
        "field '{field}': unsupported type '{type_name}' (expected uint, int, address, bool or a user-defined type with an underlying-type)"
    )]
    UnsupportedType { field: String, type_name: String },

    #[error(
        "field '{field}': type '{type_name}' has unsupported underlying type '{underlying}' (expected uint, int, address or bool)"
    )]
    UnsupportedUnderlyingType {
        field: String,
        type_name: String,
        underlying: String,
    },

    #[error("field '{field}': width must be positive")]
    ZeroWidth { field: String },

    #[error("field '{field}': width {bits} exceeds the 256-bit word")]
    WiderThanWord { field: String, bits: u32 },

    #[error("field '{field}': addresses are 160 bits wide, got {bits}")]
    AddressWidth { field: String, bits: u32 },

    #[error("field '{field}': bools are {expected} bits wide in schema generation {generation}, got {bits}")]
    BoolWidth {
        field: String,
        bits: u32,
        expected: u32,
        generation: u32,
    },

    #[error("field '{field}': '{field}' is not a valid identifier")]
    InvalidName { field: String },

    #[error("field '{field}': name collides with a generated operation or local")]
    ReservedName { field: String },

    #[error("struct '{name}': not a valid identifier")]
    InvalidStructName { name: String },

    #[error("struct '{strukt}': field '{field}' has {bits} bits, not a multiple of 4")]
    Misaligned {
        strukt: String,
        field: String,
        bits: u32,
    },

    #[error("struct '{strukt}': duplicate field '{field}'")]
    DuplicateField { strukt: String, field: String },

    #[error("struct '{strukt}' is too wide: {total} bits, {overflow} over the 256-bit word")]
    TooWide {
        strukt: String,
        total: u64,
        overflow: u64,
    },

    #[error("struct '{strukt}': {error}")]
    InStruct {
        strukt: String,
        error: Box<SchemaError>,
    },

    #[error("unsupported schema generation {generation} (expected 1 or 2)")]
    UnsupportedGeneration { generation: u32 },
}

impl SchemaError {
    /* Strip struct context, exposing the error a field raised */
    pub fn root(&self) -> &SchemaError {
        match self {
            SchemaError::InStruct { error, .. } => error.root(),
            other => other,
        }
    }

    pub(crate) fn in_struct(self, strukt: &str) -> SchemaError {
        SchemaError::InStruct {
            strukt: strukt.to_string(),
            error: Box::new(self),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
