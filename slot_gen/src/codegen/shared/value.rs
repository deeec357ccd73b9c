//! Runtime values of the IR interpreter and exact 256-bit word arithmetic.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use super::ir::Ty;
use crate::layout::conventions::{ADDRESS_BITS, WORD_BITS};
use crate::layout::field::low_ones;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Unsigned word, always below 2^256
    Uint(BigUint),
    /// Signed word, always within the two's complement 256-bit range
    Int(BigInt),
    /// Always below 2^160
    Address(BigUint),
    Bool(bool),
    Str(String),
    /// User-defined value type or packed word
    Wrapped { ty: String, inner: Box<Value> },
    Record {
        name: String,
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    pub fn uint(value: impl Into<BigUint>) -> Self {
        Value::Uint(truncate(value.into()))
    }

    pub fn int(value: impl Into<BigInt>) -> Self {
        Value::Int(from_twos(&to_twos(&value.into())))
    }

    pub fn address(value: impl Into<BigUint>) -> Self {
        Value::Address(value.into() & low_ones(ADDRESS_BITS))
    }

    pub fn wrapped(ty: impl Into<String>, inner: Value) -> Self {
        Value::Wrapped {
            ty: ty.into(),
            inner: Box::new(inner),
        }
    }

    /// Packed word value of type `ty`.
    pub fn packed(ty: impl Into<String>, word: impl Into<BigUint>) -> Self {
        Self::wrapped(ty, Self::uint(word))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Address(_) => "address",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Wrapped { .. } => "wrapped",
            Value::Record { .. } => "record",
        }
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            Value::Uint(v) => Some(v),
            _ => None,
        }
    }

    /// Raw word under any number of wrappers.
    pub fn word(&self) -> Option<&BigUint> {
        match self {
            Value::Uint(v) => Some(v),
            Value::Wrapped { inner, .. } => inner.word(),
            _ => None,
        }
    }

    /// Zero value of a type; records need their member list.
    pub fn zero(ty: &Ty, record: &dyn Fn(&str) -> Option<Vec<(String, Ty)>>) -> Option<Self> {
        Some(match ty {
            Ty::Uint => Value::Uint(BigUint::zero()),
            Ty::Int => Value::Int(BigInt::zero()),
            Ty::Address => Value::Address(BigUint::zero()),
            Ty::Bool => Value::Bool(false),
            Ty::Str => Value::Str(String::new()),
            Ty::User { name, underlying } => Value::wrapped(
                name.clone(),
                Value::zero(&Ty::primitive(*underlying), record)?,
            ),
            Ty::Packed { name } => Value::packed(name.clone(), 0u32),
            Ty::Record { name } => {
                let mut fields = IndexMap::new();
                for (field, ty) in record(name)? {
                    let zero = Value::zero(&ty, record)?;
                    fields.insert(field, zero);
                }
                Value::Record {
                    name: name.clone(),
                    fields,
                }
            }
        })
    }

    /// Whether the value inhabits `ty` (record members are not inspected).
    pub fn conforms(&self, ty: &Ty) -> bool {
        match (self, ty) {
            (Value::Uint(_), Ty::Uint)
            | (Value::Int(_), Ty::Int)
            | (Value::Address(_), Ty::Address)
            | (Value::Bool(_), Ty::Bool)
            | (Value::Str(_), Ty::Str) => true,
            (Value::Wrapped { ty: wrapped, inner }, Ty::User { name, underlying }) => {
                wrapped == name && inner.conforms(&Ty::primitive(*underlying))
            }
            (Value::Wrapped { ty: wrapped, inner }, Ty::Packed { name }) => {
                wrapped == name && inner.conforms(&Ty::Uint)
            }
            (Value::Record { name: record, .. }, Ty::Record { name }) => record == name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{:#066x}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Address(v) => write!(f, "{:#042x}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Wrapped { ty, inner } => write!(f, "{}({})", ty, inner),
            Value::Record { name, fields } => {
                write!(f, "{} {{ ", name)?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/* ============================================================================
   Word arithmetic
   ============================================================================ */

pub fn word_modulus() -> BigUint {
    BigUint::one() << WORD_BITS
}

/// Reduce modulo 2^256.
pub fn truncate(value: BigUint) -> BigUint {
    value & low_ones(WORD_BITS)
}

/// Two's complement bit pattern of a signed value, modulo 2^256.
pub fn to_twos(value: &BigInt) -> BigUint {
    let modulus = BigInt::from(word_modulus());
    let reduced = ((value % &modulus) + &modulus) % &modulus;
    reduced.to_biguint().unwrap_or_default()
}

/// Signed reading of a 256-bit pattern.
pub fn from_twos(word: &BigUint) -> BigInt {
    let word = truncate(word.clone());
    if word.bit(u64::from(WORD_BITS - 1)) {
        BigInt::from_biguint(Sign::Plus, word) - BigInt::from(word_modulus())
    } else {
        BigInt::from_biguint(Sign::Plus, word)
    }
}

/* Shift amounts beyond the word collapse to the word width */
pub fn shift_amount(amount: &BigUint) -> u32 {
    amount
        .to_u32()
        .map_or(WORD_BITS, |n| n.min(WORD_BITS))
}

pub fn shl_word(word: &BigUint, amount: &BigUint) -> BigUint {
    let n = shift_amount(amount);
    if n >= WORD_BITS {
        return BigUint::zero();
    }
    truncate(word << n)
}

pub fn shr_word(word: &BigUint, amount: &BigUint) -> BigUint {
    let n = shift_amount(amount);
    if n >= WORD_BITS {
        return BigUint::zero();
    }
    word >> n
}

/// Arithmetic right shift: rounds toward negative infinity.
pub fn sar(value: &BigInt, amount: &BigUint) -> BigInt {
    let n = shift_amount(amount);
    value >> n
}

pub fn not_word(word: &BigUint) -> BigUint {
    low_ones(WORD_BITS) ^ truncate(word.clone())
}

pub fn add_word(left: &BigUint, right: &BigUint) -> BigUint {
    truncate(left + right)
}

pub fn sub_word(left: &BigUint, right: &BigUint) -> BigUint {
    truncate(left + word_modulus() - truncate(right.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twos_complement_round_trips() {
        let minus_one = BigInt::from(-1);
        assert_eq!(to_twos(&minus_one), low_ones(WORD_BITS));
        assert_eq!(from_twos(&low_ones(WORD_BITS)), minus_one);
        assert_eq!(from_twos(&to_twos(&BigInt::from(-100))), BigInt::from(-100));
        assert_eq!(to_twos(&BigInt::from(7)), BigUint::from(7u32));
    }

    #[test]
    fn shifts_past_the_word_are_zero() {
        let one = BigUint::one();
        assert_eq!(shl_word(&one, &BigUint::from(255u32)), one.clone() << 255u32);
        assert_eq!(shl_word(&one, &BigUint::from(256u32)), BigUint::zero());
        assert_eq!(shr_word(&low_ones(256), &BigUint::from(300u32)), BigUint::zero());
        assert_eq!(shl_word(&low_ones(256), &BigUint::from(8u32)), low_ones(256) ^ low_ones(8));
    }

    #[test]
    fn arithmetic_shift_keeps_the_sign() {
        assert_eq!(sar(&BigInt::from(-8), &BigUint::from(2u32)), BigInt::from(-2));
        assert_eq!(sar(&BigInt::from(-1), &BigUint::from(300u32)), BigInt::from(-1));
        assert_eq!(sar(&BigInt::from(8), &BigUint::from(2u32)), BigInt::from(2));
    }

    #[test]
    fn subtraction_wraps() {
        assert_eq!(sub_word(&BigUint::zero(), &BigUint::one()), low_ones(256));
        assert_eq!(add_word(&low_ones(256), &BigUint::one()), BigUint::zero());
        assert_eq!(not_word(&BigUint::zero()), low_ones(256));
    }

    #[test]
    fn display_is_word_oriented() {
        assert_eq!(
            Value::uint(255u32).to_string(),
            format!("0x{}ff", "0".repeat(62))
        );
        assert_eq!(Value::int(-3).to_string(), "-3");
        assert_eq!(
            Value::wrapped("Tick", Value::int(5)).to_string(),
            "Tick(5)"
        );
    }

    #[test]
    fn conformance() {
        let tick = Ty::User {
            name: "Tick".into(),
            underlying: crate::codegen::shared::ir::Primitive::Int,
        };
        assert!(Value::wrapped("Tick", Value::int(1)).conforms(&tick));
        assert!(!Value::int(1).conforms(&tick));
        assert!(Value::packed("Offer", 3u32).conforms(&Ty::Packed { name: "Offer".into() }));
    }
}
