//! Schema generations.
//!
//! Two generations of the layout convention exist. They agree on field order,
//! offsets and the values of every mask; they differ in how wide a bool is,
//! whether widths must be whole nibbles, and how the mask constants are
//! written in generated code.

use serde_derive::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// Width of the packed machine word
pub const WORD_BITS: u32 = 256;

/// Width of an address, direct or as the underlying type of a user type
pub const ADDRESS_BITS: u32 = 160;

/// Generation used when neither the schema nor the command line picks one
pub const DEFAULT_GENERATION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskStyle {
    /// Offsets as decimals, masks as 64-nibble hex literals
    Literal,
    /// Offsets and masks as formulas over the width constants
    Formula,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Conventions {
    pub generation: u32,
    pub bool_bits: u32,
    pub nibble_aligned: bool,
    pub mask_style: MaskStyle,
}

impl Conventions {
    pub const GENERATION_1: Conventions = Conventions {
        generation: 1,
        bool_bits: 8,
        nibble_aligned: true,
        mask_style: MaskStyle::Literal,
    };

    pub const GENERATION_2: Conventions = Conventions {
        generation: 2,
        bool_bits: 1,
        nibble_aligned: false,
        mask_style: MaskStyle::Formula,
    };

    pub fn for_generation(generation: u32) -> SchemaResult<Self> {
        match generation {
            1 => Ok(Self::GENERATION_1),
            2 => Ok(Self::GENERATION_2),
            _ => Err(SchemaError::UnsupportedGeneration { generation }),
        }
    }
}

impl Default for Conventions {
    fn default() -> Self {
        Self::GENERATION_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_resolve() {
        assert_eq!(Conventions::for_generation(1).unwrap().bool_bits, 8);
        assert!(Conventions::for_generation(1).unwrap().nibble_aligned);
        assert_eq!(Conventions::for_generation(2).unwrap().bool_bits, 1);
        assert_eq!(
            Conventions::for_generation(DEFAULT_GENERATION).unwrap(),
            Conventions::default()
        );
        assert_eq!(
            Conventions::for_generation(3),
            Err(SchemaError::UnsupportedGeneration { generation: 3 })
        );
    }
}
