//! Shared layout IR used by the renderer and the interpreter.
//!
//! The IR is a small typed language: pure expressions over 256-bit words,
//! a handful of statements, and functions grouped into modules. One
//! `StructIr` carries everything generated for a packed struct: the
//! accessor library module and the round-trip test module. Only the
//! renderer knows target syntax; only the interpreter knows evaluation.
//!
//! # Example
//! ```
//! use slot_gen::codegen::shared::ir::*;
//!
//! let word = Expr::unwrap("Offer", Expr::var("__packed"));
//! let get = Expr::shr(
//!     Expr::shl(word, Expr::constant("prev_before")),
//!     Expr::sub(Expr::literal(256u32), Expr::constant("prev_bits")),
//! );
//! let json = serde_json::to_string(&get).unwrap();
//! let back: Expr = serde_json::from_str(&json).unwrap();
//! assert_eq!(back, get);
//! ```

use num_bigint::BigUint;
use serde_derive::{Deserialize, Serialize};

/// Schema version used for every serialized IR export.
pub const IR_SCHEMA_VERSION: u32 = 1;

/// Container for the IR of every struct of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutIr {
    /// IR schema version (mirrors `IR_SCHEMA_VERSION`).
    pub version: u32,
    /// Schema generation the IR was built for.
    pub generation: u32,
    pub structs: Vec<StructIr>,
}

impl LayoutIr {
    pub fn new(generation: u32, structs: Vec<StructIr>) -> Self {
        Self {
            version: IR_SCHEMA_VERSION,
            generation,
            structs,
        }
    }
}

/// Everything generated for one packed struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructIr {
    /// Schema name of the struct (e.g. `offerDetail`).
    pub name: String,
    /// Name of the packed word type (e.g. `OfferDetail`).
    pub packed: String,
    /// In-memory record with one member per field.
    pub record: RecordDef,
    /// Resolved layout facts, in declaration order.
    pub layout: Vec<FieldLayout>,
    /// Accessor library.
    pub library: Module,
    /// Round-trip property tests against `library`.
    pub tests: Module,
    /// Verbatim text emitted next to the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_definitions: Option<String>,
}

/// Layout facts of one field, for inspection and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldLayout {
    pub name: String,
    pub ty: Ty,
    pub bits: u32,
    pub before: u32,
    pub after: u32,
}

/// One of the four storage primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    Uint,
    Int,
    Address,
    Bool,
}

impl Primitive {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "uint" => Some(Primitive::Uint),
            "int" => Some(Primitive::Int),
            "address" => Some(Primitive::Address),
            "bool" => Some(Primitive::Bool),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Uint => "uint",
            Primitive::Int => "int",
            Primitive::Address => "address",
            Primitive::Bool => "bool",
        }
    }
}

/// Value types of the IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Ty {
    Uint,
    Int,
    Address,
    Bool,
    Str,
    /// User-defined value type wrapping a primitive
    User { name: String, underlying: Primitive },
    /// Packed word type wrapping a uint
    Packed { name: String },
    /// In-memory record, see `RecordDef`
    Record { name: String },
}

impl Ty {
    pub fn primitive(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Uint => Ty::Uint,
            Primitive::Int => Ty::Int,
            Primitive::Address => Ty::Address,
            Primitive::Bool => Ty::Bool,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Empty for unnamed return values
    pub name: String,
    pub ty: Ty,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn unnamed(ty: Ty) -> Self {
        Self {
            name: String::new(),
            ty,
        }
    }
}

/// A group of constants and functions rendered as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub constants: Vec<Constant>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, id: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn tests(&self) -> impl Iterator<Item = &Function> {
        self.functions
            .iter()
            .filter(|f| matches!(f.kind, FunctionKind::Test))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    Library,
    TestSuite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstantGroup {
    Bits,
    Before,
    FocusMask,
    CleanupMask,
    CastMask,
    SizeError,
}

impl ConstantGroup {
    pub const ALL: [ConstantGroup; 6] = [
        ConstantGroup::Bits,
        ConstantGroup::Before,
        ConstantGroup::FocusMask,
        ConstantGroup::CleanupMask,
        ConstantGroup::CastMask,
        ConstantGroup::SizeError,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub ty: Ty,
    pub group: ConstantGroup,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "kebab-case")]
pub enum FunctionKind {
    ToRecord,
    Eq,
    Unpack,
    Getter { field: String },
    Setter { field: String },
    FromRecord,
    Pack,
    Check { field: String },
    Helper,
    Test,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Unique within the module; overloads share `name`
    pub id: String,
    pub name: String,
    pub kind: FunctionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// Assignable locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "place", rename_all = "kebab-case")]
pub enum Place {
    Var { name: String },
    Member { base: String, field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "kebab-case")]
pub enum Stmt {
    /// Declare a local; no value means the zero value of `ty`
    Let {
        name: String,
        ty: Ty,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    /// Declare one local per returned value of a call
    Destructure { targets: Vec<Param>, value: Expr },
    Assign { target: Place, value: Expr },
    OrAssign { target: Place, value: Expr },
    Return { values: Vec<Expr> },
    /// Test assertion; `left` is the observed value
    AssertEq {
        left: Expr,
        right: Expr,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinOp {
    Shl,
    Shr,
    And,
    Or,
    Add,
    Sub,
    Gt,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastKind {
    /// Reinterpret as unsigned (two's complement for signed input)
    Uint,
    /// Reinterpret as signed
    Int,
    /// Truncate a word to its low 160 bits
    Address,
    /// Zero-extend an address
    UintOfAddress,
    /// 0 or 1
    UintOfBool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callee {
    pub module: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Expr {
    Var {
        name: String,
    },
    Const {
        name: String,
    },
    /// Decimal literal
    Literal {
        #[serde(with = "biguint_hex")]
        value: BigUint,
    },
    /// Full-word hex literal
    Hex {
        #[serde(with = "biguint_hex")]
        value: BigUint,
    },
    Str {
        value: String,
    },
    /// All 256 bits set
    Ones,
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not {
        operand: Box<Expr>,
    },
    Cast {
        to: CastKind,
        operand: Box<Expr>,
    },
    Wrap {
        ty: String,
        operand: Box<Expr>,
    },
    Unwrap {
        ty: String,
        operand: Box<Expr>,
    },
    Member {
        base: Box<Expr>,
        field: String,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var { name: name.into() }
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Expr::Const { name: name.into() }
    }

    pub fn literal(value: impl Into<BigUint>) -> Self {
        Expr::Literal {
            value: value.into(),
        }
    }

    pub fn hex(value: BigUint) -> Self {
        Expr::Hex { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn shl(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Shl, left, right)
    }

    pub fn shr(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Shr, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::And, left, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Or, left, right)
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Add, left, right)
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Sub, left, right)
    }

    pub fn gt(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Gt, left, right)
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(BinOp::Eq, left, right)
    }

    pub fn complement(operand: Expr) -> Self {
        Expr::Not {
            operand: Box::new(operand),
        }
    }

    pub fn cast(to: CastKind, operand: Expr) -> Self {
        Expr::Cast {
            to,
            operand: Box::new(operand),
        }
    }

    pub fn wrap(ty: impl Into<String>, operand: Expr) -> Self {
        Expr::Wrap {
            ty: ty.into(),
            operand: Box::new(operand),
        }
    }

    pub fn unwrap(ty: impl Into<String>, operand: Expr) -> Self {
        Expr::Unwrap {
            ty: ty.into(),
            operand: Box::new(operand),
        }
    }

    pub fn member(base: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            field: field.into(),
        }
    }

    pub fn call(callee: Callee, args: Vec<Expr>) -> Self {
        Expr::Call { callee, args }
    }
}

/* Big integers travel as `0x`-prefixed hex strings */
mod biguint_hex {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text.strip_prefix("0x").unwrap_or(&text);
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex integer '{}'", text)))
    }
}
