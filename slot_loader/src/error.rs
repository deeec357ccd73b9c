use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading schema files and resolving their contents
#[derive(Debug, Error)]
pub enum LoadError {
    /// Schema file could not be read
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not valid YAML for the schema model
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    /// Path import could not be found
    #[error("import '{import}' not found relative to '{from}' or in include directories")]
    ImportNotFound { import: String, from: PathBuf },

    /// Two files (or one file twice) declare the same struct
    #[error("struct '{name}' declared in '{first}' is declared again in '{second}'")]
    DuplicateStruct {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Two files declare the same shared field
    #[error("shared field '{name}' declared in '{first}' is declared again in '{second}'")]
    DuplicateSharedField {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A struct references a shared field nobody declares
    #[error("struct '{strukt}' references unknown shared field '{target}'")]
    UnknownFieldRef { strukt: String, target: String },

    /// Nothing to load
    #[error("no schema files given")]
    NoFiles,
}

pub type LoadResult<T> = Result<T, LoadError>;
