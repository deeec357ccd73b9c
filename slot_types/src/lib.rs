//! Packed Layout Type Definitions
//!
//! This crate contains the core data model for packed storage-word schemas.
//! It provides pure data structures for describing fields and structs without
//! any file I/O, validation or code generation logic.

pub mod types;

// Re-export commonly used types at the crate root
pub use types::*;
