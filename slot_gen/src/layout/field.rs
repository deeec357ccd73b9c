//! A single named, typed, fixed-width field and the bit arithmetic that
//! reads and writes it inside a packed word.
//!
//! Fields are laid out from the most significant end of the word: the first
//! field of a struct occupies the top `bits` bits. `before` counts the bits
//! above a field and `after` the bits below it.

use num_bigint::BigUint;
use num_traits::One;
use serde_derive::{Deserialize, Serialize};
use slot_types::FieldDef;

use crate::codegen::shared::ir::{CastKind, Expr, Primitive, Ty};

use super::conventions::{ADDRESS_BITS, Conventions, WORD_BITS};
use super::errors::{SchemaError, SchemaResult};

/// Struct-level operations of the accessor library
pub const RESERVED_NAMES: [&str; 5] = ["pack", "unpack", "eq", "to_struct", "t_of_struct"];

/// Stems of generated locals; a field `x` also yields a local `__x`
pub const LOCAL_STEMS: [&str; 8] = [
    "packed", "packed1", "packed2", "s", "original", "modified", "unpacked", "repacked",
];

/// Solidity keywords, reserved words, literals and units
pub const SOLIDITY_KEYWORDS: &[&str] = &[
    "abstract", "address", "after", "alias", "anonymous", "apply", "as", "assembly", "auto",
    "bool", "break", "byte", "bytes", "calldata", "case", "catch", "constant", "constructor",
    "continue", "contract", "copyof", "days", "default", "define", "delete", "do", "else",
    "emit", "enum", "error", "ether", "event", "external", "fallback", "false", "final",
    "fixed", "for", "function", "gwei", "hours", "if", "immutable", "implements", "import",
    "in", "indexed", "inline", "int", "interface", "internal", "is", "let", "library",
    "macro", "mapping", "match", "memory", "minutes", "modifier", "mutable", "new", "null",
    "of", "override", "partial", "payable", "pragma", "private", "promise", "public", "pure",
    "receive", "reference", "relocatable", "return", "returns", "revert", "sealed",
    "seconds", "sizeof", "static", "storage", "string", "struct", "super", "supports",
    "switch", "this", "throw", "true", "try", "type", "typedef", "typeof", "ufixed", "uint",
    "unchecked", "unicode", "using", "var", "view", "virtual", "weeks", "wei", "while",
    "years",
];

/// Keywords plus the sized elementary types (`uint8`, `int256`, `bytes32`, `fixed128x18`).
pub fn is_solidity_keyword(name: &str) -> bool {
    if SOLIDITY_KEYWORDS.contains(&name) {
        return true;
    }
    let sized = |prefix: &str| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| {
                rest.starts_with(|c: char| c.is_ascii_digit())
                    && rest.chars().all(|c| c.is_ascii_digit() || c == 'x')
            })
    };
    ["uint", "int", "bytes", "ufixed", "fixed"].into_iter().any(sized)
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldType {
    UnsignedInt,
    SignedInt,
    Address,
    Bool,
    UserDefined { name: String, underlying: Primitive },
}

impl FieldType {
    fn from_def(def: &FieldDef) -> SchemaResult<Self> {
        if let Some(primitive) = Primitive::parse(&def.type_name) {
            return Ok(Self::from_primitive(primitive));
        }

        let underlying = def.underlying_type.as_deref().ok_or_else(|| SchemaError::UnsupportedType {
            field: def.name.clone(),
            type_name: def.type_name.clone(),
        })?;
        if !is_identifier(&def.type_name) || is_solidity_keyword(&def.type_name) {
            return Err(SchemaError::UnsupportedType {
                field: def.name.clone(),
                type_name: def.type_name.clone(),
            });
        }
        let underlying = Primitive::parse(underlying).ok_or_else(|| {
            SchemaError::UnsupportedUnderlyingType {
                field: def.name.clone(),
                type_name: def.type_name.clone(),
                underlying: underlying.to_string(),
            }
        })?;

        Ok(FieldType::UserDefined {
            name: def.type_name.clone(),
            underlying,
        })
    }

    fn from_primitive(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Uint => FieldType::UnsignedInt,
            Primitive::Int => FieldType::SignedInt,
            Primitive::Address => FieldType::Address,
            Primitive::Bool => FieldType::Bool,
        }
    }

    pub fn underlying(&self) -> Primitive {
        match self {
            FieldType::UnsignedInt => Primitive::Uint,
            FieldType::SignedInt => Primitive::Int,
            FieldType::Address => Primitive::Address,
            FieldType::Bool => Primitive::Bool,
            FieldType::UserDefined { underlying, .. } => *underlying,
        }
    }

    /* Name of the type as written in the schema */
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::UserDefined { name, .. } => name,
            other => other.underlying().keyword(),
        }
    }

    pub fn ir_type(&self) -> Ty {
        match self {
            FieldType::UserDefined { name, underlying } => Ty::User {
                name: name.clone(),
                underlying: *underlying,
            },
            other => Ty::primitive(other.underlying()),
        }
    }
}

/// Identifiers usable for fields, structs and user-defined types.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// `n` trailing one bits.
pub fn low_ones(n: u32) -> BigUint {
    (BigUint::one() << n) - BigUint::one()
}

/// All 256 bits set.
pub fn word_ones() -> BigUint {
    low_ones(WORD_BITS)
}

/// Names of the per-field constants in the accessor library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldVars {
    pub bits: String,
    pub before: String,
    pub mask: String,
    pub mask_inv: String,
    pub cast_mask: String,
    pub size_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    ty: FieldType,
    bits: u32,
    before: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl Field {
    /// Shape-check a field definition. The offset is assigned by the
    /// enclosing struct; a standalone field sits at the top of the word.
    pub fn new(def: &FieldDef, conventions: &Conventions) -> SchemaResult<Self> {
        let name = def.name.clone();
        if !is_identifier(&name) {
            return Err(SchemaError::InvalidName { field: name });
        }
        if RESERVED_NAMES.contains(&name.as_str())
            || LOCAL_STEMS.contains(&name.as_str())
            || is_solidity_keyword(&name)
            || name.starts_with("__")
        {
            return Err(SchemaError::ReservedName { field: name });
        }

        let ty = FieldType::from_def(def)?;
        let bits = def.bits;

        if bits == 0 {
            return Err(SchemaError::ZeroWidth { field: name });
        }
        if bits > WORD_BITS {
            return Err(SchemaError::WiderThanWord { field: name, bits });
        }
        match ty.underlying() {
            Primitive::Address if bits != ADDRESS_BITS => {
                return Err(SchemaError::AddressWidth { field: name, bits });
            }
            Primitive::Bool if bits != conventions.bool_bits => {
                return Err(SchemaError::BoolWidth {
                    field: name,
                    bits,
                    expected: conventions.bool_bits,
                    generation: conventions.generation,
                });
            }
            _ => {}
        }

        Ok(Self {
            name,
            ty,
            bits,
            before: 0,
            comment: def.comment.clone(),
        })
    }

    pub(super) fn placed_at(mut self, before: u32) -> Self {
        self.before = before;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn before(&self) -> u32 {
        self.before
    }

    pub fn after(&self) -> u32 {
        WORD_BITS - self.before - self.bits
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn ir_type(&self) -> Ty {
        self.ty.ir_type()
    }

    /// 1s over the field span, 0s elsewhere.
    pub fn focus_mask(&self) -> BigUint {
        low_ones(self.bits) << self.after()
    }

    /// 0s over the field span, 1s elsewhere.
    pub fn cleanup_mask(&self) -> BigUint {
        word_ones() ^ self.focus_mask()
    }

    /// `bits` trailing 1s.
    pub fn cast_mask(&self) -> BigUint {
        low_ones(self.bits)
    }

    pub fn vars(&self) -> FieldVars {
        let n = &self.name;
        FieldVars {
            bits: format!("{n}_bits"),
            before: format!("{n}_before"),
            mask: format!("{n}_mask"),
            mask_inv: format!("{n}_mask_inv"),
            cast_mask: format!("{n}_cast_mask"),
            size_error: format!("{n}_size_error"),
        }
    }

    /// Raw underlying value of a typed expression.
    pub fn unwrapped(&self, value: Expr) -> Expr {
        match &self.ty {
            FieldType::UserDefined { name, .. } => Expr::unwrap(name.clone(), value),
            _ => value,
        }
    }

    /// Reinterpret a typed value as a word.
    pub fn to_base(&self, value: Expr) -> Expr {
        let raw = self.unwrapped(value);
        match self.ty.underlying() {
            Primitive::Uint => raw,
            Primitive::Int => Expr::cast(CastKind::Uint, raw),
            Primitive::Address => Expr::cast(CastKind::UintOfAddress, raw),
            Primitive::Bool => Expr::cast(CastKind::UintOfBool, raw),
        }
    }

    fn wrapped(&self, raw: Expr) -> Expr {
        match &self.ty {
            FieldType::UserDefined { name, .. } => Expr::wrap(name.clone(), raw),
            _ => raw,
        }
    }

    /// Read the field out of a word. Signed fields sign-extend from `bits`.
    pub fn extract(&self, word: Expr) -> Expr {
        let vars = self.vars();
        let bits = Expr::constant(vars.bits);
        let before = Expr::constant(vars.before);
        let shift_down = || Expr::sub(Expr::literal(WORD_BITS), bits.clone());

        let raw = match self.ty.underlying() {
            Primitive::Bool => Expr::gt(
                Expr::and(word, Expr::constant(vars.mask_inv)),
                Expr::literal(0u32),
            ),
            Primitive::Int => Expr::shr(
                Expr::cast(CastKind::Int, Expr::shl(word, before)),
                shift_down(),
            ),
            Primitive::Uint => Expr::shr(Expr::shl(word, before), shift_down()),
            Primitive::Address => Expr::cast(
                CastKind::Address,
                Expr::shr(Expr::shl(word, before), shift_down()),
            ),
        };
        self.wrapped(raw)
    }

    /// Position a typed value at the field span. Bits outside the span are
    /// zero; nothing is cleared in the destination.
    pub fn inject(&self, value: Expr) -> Expr {
        let vars = self.vars();
        Expr::shr(
            Expr::shl(
                self.to_base(value),
                Expr::sub(Expr::literal(WORD_BITS), Expr::constant(vars.bits)),
            ),
            Expr::constant(vars.before),
        )
    }

    /// True when the value fits the field width without truncation.
    pub fn check(&self, value: Expr) -> Expr {
        let base = self.to_base(value);
        Expr::equals(
            Expr::and(base.clone(), Expr::constant(self.vars().cast_mask)),
            base,
        )
    }
}
