//! Packed storage-word layout compiler.
//!
//! Turns declarative struct schemas into a bit-exact 256-bit layout, an
//! accessor library for it and round-trip property tests, all expressed in
//! a shared IR that is rendered to Solidity or executed by the interpreter.

pub mod cmds;
pub mod codegen;
pub mod layout;
