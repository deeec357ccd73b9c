use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use thiserror::Error;

use super::ir::{BinOp, CastKind, Expr, Function, Module, Place, RecordDef, Stmt, StructIr, Ty};
use super::value::{
    Value, add_word, from_twos, not_word, sar, shl_word, shr_word, sub_word, to_twos,
};
use crate::layout::conventions::ADDRESS_BITS;
use crate::layout::field::{low_ones, word_ones};

/// Errors raised while executing IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown module '{module}'")]
    UnknownModule { module: String },

    #[error("module '{module}' has no function '{id}'")]
    UnknownFunction { module: String, id: String },

    #[error("function '{function}': unknown variable '{name}'")]
    UnknownVariable { function: String, name: String },

    #[error("module '{module}': unknown constant '{name}'")]
    UnknownConstant { module: String, name: String },

    #[error("unknown record type '{name}'")]
    UnknownRecord { name: String },

    #[error("record '{record}' has no member '{field}'")]
    UnknownMember { record: String, field: String },

    #[error("function '{function}': expected {expected} arguments, got {got}")]
    ArityMismatch {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("function '{function}': {context}: expected {expected}, found {found}")]
    TypeMismatch {
        function: String,
        context: String,
        expected: String,
        found: String,
    },

    #[error("function '{function}': call to '{callee}' yields {count} values where one is expected")]
    NotSingleValue {
        function: String,
        callee: String,
        count: usize,
    },

    #[error("function '{function}' ends without returning")]
    MissingReturn { function: String },

    #[error("function '{function}': {message}: expected {expected}, got {actual}")]
    AssertionFailed {
        function: String,
        message: String,
        expected: Value,
        actual: Value,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;

/* Execution state of one function call */
struct Frame<'f> {
    module: &'f str,
    function: &'f str,
    locals: HashMap<String, Value>,
}

impl Frame<'_> {
    fn mismatch(&self, context: impl Into<String>, expected: impl Into<String>, found: &Value) -> EvalError {
        EvalError::TypeMismatch {
            function: self.function.to_string(),
            context: context.into(),
            expected: expected.into(),
            found: found.kind().to_string(),
        }
    }
}

/// Executes accessor and test modules with exact 256-bit word semantics.
pub struct Interpreter<'a> {
    modules: HashMap<&'a str, &'a Module>,
    records: HashMap<&'a str, &'a RecordDef>,
    constants: HashMap<(String, String), Value>,
}

impl<'a> Interpreter<'a> {
    pub fn new(modules: &[&'a Module], records: &[&'a RecordDef]) -> EvalResult<Self> {
        let mut interpreter = Self {
            modules: modules.iter().map(|m| (m.name.as_str(), *m)).collect(),
            records: records.iter().map(|r| (r.name.as_str(), *r)).collect(),
            constants: HashMap::new(),
        };

        /* Constants may refer to earlier constants of the same module */
        for module in modules {
            for constant in &module.constants {
                let mut frame = Frame {
                    module: &module.name,
                    function: &constant.name,
                    locals: HashMap::new(),
                };
                let value = interpreter.eval(&constant.value, &mut frame)?;
                if !value.conforms(&constant.ty) {
                    return Err(frame.mismatch("constant", format!("{:?}", constant.ty), &value));
                }
                interpreter
                    .constants
                    .insert((module.name.clone(), constant.name.clone()), value);
            }
        }

        Ok(interpreter)
    }

    /// Interpreter over the library and test modules of one struct.
    pub fn for_struct(ir: &'a StructIr) -> EvalResult<Self> {
        Self::new(&[&ir.library, &ir.tests], &[&ir.record])
    }

    pub fn constant(&self, module: &str, name: &str) -> Option<&Value> {
        self.constants.get(&(module.to_string(), name.to_string()))
    }

    fn module(&self, module: &str) -> EvalResult<&'a Module> {
        self.modules
            .get(module)
            .copied()
            .ok_or_else(|| EvalError::UnknownModule {
                module: module.to_string(),
            })
    }

    pub fn function(&self, module: &str, id: &str) -> EvalResult<&'a Function> {
        self.module(module)?
            .function(id)
            .ok_or_else(|| EvalError::UnknownFunction {
                module: module.to_string(),
                id: id.to_string(),
            })
    }

    /// Zero value of a type, as held by a fresh local.
    pub fn zero(&self, ty: &Ty) -> EvalResult<Value> {
        let lookup = |name: &str| {
            self.records.get(name).map(|r| {
                r.fields
                    .iter()
                    .map(|p| (p.name.clone(), p.ty.clone()))
                    .collect::<Vec<_>>()
            })
        };
        Value::zero(ty, &lookup).ok_or_else(|| EvalError::UnknownRecord {
            name: format!("{:?}", ty),
        })
    }

    /// Members of a record type, in declaration order.
    pub fn record(&self, name: &str) -> EvalResult<&'a RecordDef> {
        self.records
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownRecord {
                name: name.to_string(),
            })
    }

    /// Call a function by module and id; returns every returned value.
    pub fn call(&self, module: &str, id: &str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
        let function = self.function(module, id)?;
        let mut frame = Frame {
            module: self.module(module)?.name.as_str(),
            function: &function.id,
            locals: HashMap::new(),
        };

        if args.len() != function.params.len() {
            return Err(EvalError::ArityMismatch {
                function: function.id.clone(),
                expected: function.params.len(),
                got: args.len(),
            });
        }
        for (param, arg) in function.params.iter().zip(args) {
            if !arg.conforms(&param.ty) {
                return Err(frame.mismatch(
                    format!("argument '{}'", param.name),
                    format!("{:?}", param.ty),
                    &arg,
                ));
            }
            frame.locals.insert(param.name.clone(), arg);
        }
        for ret in function.returns.iter().filter(|r| !r.name.is_empty()) {
            let zero = self.zero(&ret.ty)?;
            frame.locals.insert(ret.name.clone(), zero);
        }

        if let Some(values) = self.exec_block(&function.body, &mut frame)? {
            return Ok(values);
        }
        if function.returns.iter().any(|r| r.name.is_empty()) {
            return Err(EvalError::MissingReturn {
                function: function.id.clone(),
            });
        }
        function
            .returns
            .iter()
            .map(|r| {
                frame
                    .locals
                    .remove(&r.name)
                    .ok_or_else(|| EvalError::UnknownVariable {
                        function: function.id.clone(),
                        name: r.name.clone(),
                    })
            })
            .collect()
    }

    /// Call a function that returns exactly one value.
    pub fn call_one(&self, module: &str, id: &str, args: Vec<Value>) -> EvalResult<Value> {
        let mut values = self.call(module, id, args)?;
        match values.len() {
            1 => Ok(values.remove(0)),
            count => Err(EvalError::NotSingleValue {
                function: id.to_string(),
                callee: id.to_string(),
                count,
            }),
        }
    }

    fn exec_block(&self, body: &[Stmt], frame: &mut Frame<'_>) -> EvalResult<Option<Vec<Value>>> {
        for stmt in body {
            match stmt {
                Stmt::Let { name, ty, value } => {
                    let value = match value {
                        Some(expr) => self.eval(expr, frame)?,
                        None => self.zero(ty)?,
                    };
                    if !value.conforms(ty) {
                        return Err(frame.mismatch(format!("local '{}'", name), format!("{:?}", ty), &value));
                    }
                    frame.locals.insert(name.clone(), value);
                }
                Stmt::Destructure { targets, value } => {
                    let values = match value {
                        Expr::Call { callee, args } => {
                            let args = self.eval_all(args, frame)?;
                            self.call(&callee.module, &callee.id, args)?
                        }
                        other => vec![self.eval(other, frame)?],
                    };
                    if values.len() != targets.len() {
                        return Err(EvalError::ArityMismatch {
                            function: frame.function.to_string(),
                            expected: targets.len(),
                            got: values.len(),
                        });
                    }
                    for (target, value) in targets.iter().zip(values) {
                        if !value.conforms(&target.ty) {
                            return Err(frame.mismatch(
                                format!("local '{}'", target.name),
                                format!("{:?}", target.ty),
                                &value,
                            ));
                        }
                        frame.locals.insert(target.name.clone(), value);
                    }
                }
                Stmt::Assign { target, value } => {
                    let value = self.eval(value, frame)?;
                    self.store(target, value, frame)?;
                }
                Stmt::OrAssign { target, value } => {
                    let value = self.eval(value, frame)?;
                    let current = self.load(target, frame)?;
                    let merged = self.binary(BinOp::Or, current, value, frame)?;
                    self.store(target, merged, frame)?;
                }
                Stmt::Return { values } => {
                    return Ok(Some(self.eval_all(values, frame)?));
                }
                Stmt::AssertEq {
                    left,
                    right,
                    message,
                } => {
                    let actual = self.eval(left, frame)?;
                    let expected = self.eval(right, frame)?;
                    if actual != expected {
                        return Err(EvalError::AssertionFailed {
                            function: frame.function.to_string(),
                            message: message.clone(),
                            expected,
                            actual,
                        });
                    }
                }
            }
        }
        Ok(None)
    }

    fn load(&self, place: &Place, frame: &Frame<'_>) -> EvalResult<Value> {
        match place {
            Place::Var { name } => self.local(name, frame).cloned(),
            Place::Member { base, field } => {
                member(self.local(base, frame)?, field).cloned()
            }
        }
    }

    fn store(&self, place: &Place, value: Value, frame: &mut Frame<'_>) -> EvalResult<()> {
        let function = frame.function.to_string();
        let unknown = |name: &str| EvalError::UnknownVariable {
            function: function.clone(),
            name: name.to_string(),
        };
        match place {
            Place::Var { name } => {
                let slot = frame.locals.get_mut(name).ok_or_else(|| unknown(name))?;
                *slot = value;
            }
            Place::Member { base, field } => {
                let record = frame.locals.get_mut(base).ok_or_else(|| unknown(base))?;
                match record {
                    Value::Record { name, fields } => {
                        let slot = fields.get_mut(field).ok_or_else(|| EvalError::UnknownMember {
                            record: name.clone(),
                            field: field.clone(),
                        })?;
                        *slot = value;
                    }
                    other => {
                        return Err(EvalError::TypeMismatch {
                            function,
                            context: format!("member store '{}.{}'", base, field),
                            expected: "record".to_string(),
                            found: other.kind().to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn local<'f>(&self, name: &str, frame: &'f Frame<'_>) -> EvalResult<&'f Value> {
        frame
            .locals
            .get(name)
            .ok_or_else(|| EvalError::UnknownVariable {
                function: frame.function.to_string(),
                name: name.to_string(),
            })
    }

    fn eval_all(&self, exprs: &[Expr], frame: &mut Frame<'_>) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, frame)).collect()
    }

    fn eval(&self, expr: &Expr, frame: &mut Frame<'_>) -> EvalResult<Value> {
        match expr {
            Expr::Var { name } => self.local(name, frame).cloned(),
            Expr::Const { name } => self
                .constants
                .get(&(frame.module.to_string(), name.clone()))
                .cloned()
                .ok_or_else(|| EvalError::UnknownConstant {
                    module: frame.module.to_string(),
                    name: name.clone(),
                }),
            Expr::Literal { value } | Expr::Hex { value } => Ok(Value::uint(value.clone())),
            Expr::Str { value } => Ok(Value::Str(value.clone())),
            Expr::Ones => Ok(Value::Uint(word_ones())),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, frame)?;
                let right = self.eval(right, frame)?;
                self.binary(*op, left, right, frame)
            }
            Expr::Not { operand } => match self.eval(operand, frame)? {
                Value::Uint(v) => Ok(Value::Uint(not_word(&v))),
                other => Err(frame.mismatch("operand of ~", "uint", &other)),
            },
            Expr::Cast { to, operand } => {
                let value = self.eval(operand, frame)?;
                cast(*to, value).map_err(|value| {
                    frame.mismatch(format!("cast to {:?}", to), "castable value", &value)
                })
            }
            Expr::Wrap { ty, operand } => Ok(Value::wrapped(ty.clone(), self.eval(operand, frame)?)),
            Expr::Unwrap { ty, operand } => match self.eval(operand, frame)? {
                Value::Wrapped { ty: wrapped, inner } if &wrapped == ty => Ok(*inner),
                other => Err(frame.mismatch(format!("unwrap of {}", ty), ty.clone(), &other)),
            },
            Expr::Member { base, field } => {
                let base = self.eval(base, frame)?;
                member(&base, field).cloned()
            }
            Expr::Call { callee, args } => {
                let args = self.eval_all(args, frame)?;
                let mut values = self.call(&callee.module, &callee.id, args)?;
                match values.len() {
                    1 => Ok(values.remove(0)),
                    count => Err(EvalError::NotSingleValue {
                        function: frame.function.to_string(),
                        callee: callee.id.clone(),
                        count,
                    }),
                }
            }
        }
    }

    fn binary(&self, op: BinOp, left: Value, right: Value, frame: &Frame<'_>) -> EvalResult<Value> {
        let value = match (op, left, right) {
            (BinOp::Shl, Value::Uint(a), Value::Uint(n)) => Value::Uint(shl_word(&a, &n)),
            (BinOp::Shl, Value::Int(a), Value::Uint(n)) => {
                Value::Int(from_twos(&shl_word(&to_twos(&a), &n)))
            }
            (BinOp::Shr, Value::Uint(a), Value::Uint(n)) => Value::Uint(shr_word(&a, &n)),
            (BinOp::Shr, Value::Int(a), Value::Uint(n)) => Value::Int(sar(&a, &n)),
            (BinOp::And, Value::Uint(a), Value::Uint(b)) => Value::Uint(a & b),
            (BinOp::Or, Value::Uint(a), Value::Uint(b)) => Value::Uint(a | b),
            (BinOp::Add, Value::Uint(a), Value::Uint(b)) => Value::Uint(add_word(&a, &b)),
            (BinOp::Sub, Value::Uint(a), Value::Uint(b)) => Value::Uint(sub_word(&a, &b)),
            (BinOp::Gt, Value::Uint(a), Value::Uint(b)) => Value::Bool(a > b),
            (BinOp::Gt, Value::Int(a), Value::Int(b)) => Value::Bool(a > b),
            (BinOp::Eq, a, b) if a.kind() == b.kind() => Value::Bool(a == b),
            (op, left, right) => {
                return Err(frame.mismatch(
                    format!("{:?} with {} on the right", op, right.kind()),
                    "operands of matching word types",
                    &left,
                ));
            }
        };
        Ok(value)
    }
}

fn member<'v>(base: &'v Value, field: &str) -> EvalResult<&'v Value> {
    match base {
        Value::Record { name, fields } => fields.get(field).ok_or_else(|| EvalError::UnknownMember {
            record: name.clone(),
            field: field.to_string(),
        }),
        other => Err(EvalError::UnknownMember {
            record: other.kind().to_string(),
            field: field.to_string(),
        }),
    }
}

/* Returns the value back when it cannot be cast */
fn cast(to: CastKind, value: Value) -> Result<Value, Value> {
    Ok(match (to, value) {
        (CastKind::Uint, Value::Uint(v)) => Value::Uint(v),
        (CastKind::Uint, Value::Int(v)) => Value::Uint(to_twos(&v)),
        (CastKind::Int, Value::Int(v)) => Value::Int(v),
        (CastKind::Int, Value::Uint(v)) => Value::Int(from_twos(&v)),
        (CastKind::Address, Value::Uint(v)) => Value::Address(v & low_ones(ADDRESS_BITS)),
        (CastKind::UintOfAddress, Value::Address(v)) => Value::Uint(v),
        (CastKind::UintOfBool, Value::Bool(b)) => Value::Uint(if b {
            BigUint::one()
        } else {
            BigUint::zero()
        }),
        (_, other) => return Err(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::accessors::{AccessorOptions, build_library, record_def};
    use crate::layout::{Conventions, Struct};
    use num_bigint::BigInt;
    use slot_types::FieldDef;

    fn offer() -> Struct {
        Struct::from_fields(
            "offer",
            vec![
                FieldDef::new("prev", 32, "uint"),
                FieldDef::new("next", 32, "uint"),
                FieldDef::new("logPrice", 24, "int"),
                FieldDef::new("gives", 96, "uint"),
            ],
            Conventions::GENERATION_1,
        )
        .unwrap()
    }

    #[test]
    fn pack_then_unpack_returns_inputs() {
        let s = offer();
        let library = build_library(&s, &AccessorOptions::default());
        let record = record_def(&s);
        let interpreter = Interpreter::new(&[&library], &[&record]).unwrap();

        let packed = interpreter
            .call_one(
                "OfferLib",
                "pack",
                vec![
                    Value::uint(5u32),
                    Value::uint(9u32),
                    Value::int(-100),
                    Value::uint(123_456_789u32),
                ],
            )
            .unwrap();
        let unpacked = interpreter.call("OfferLib", "unpack", vec![packed]).unwrap();
        assert_eq!(
            unpacked,
            vec![
                Value::uint(5u32),
                Value::uint(9u32),
                Value::Int(BigInt::from(-100)),
                Value::uint(123_456_789u32),
            ]
        );
    }

    #[test]
    fn arity_and_type_errors_are_reported() {
        let s = offer();
        let library = build_library(&s, &AccessorOptions::default());
        let interpreter = Interpreter::new(&[&library], &[]).unwrap();

        assert!(matches!(
            interpreter.call("OfferLib", "get_prev", vec![]),
            Err(EvalError::ArityMismatch { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            interpreter.call("OfferLib", "get_prev", vec![Value::uint(1u32)]),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            interpreter.call("OfferLib", "get_nope", vec![]),
            Err(EvalError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn constants_are_evaluated_up_front() {
        let s = offer();
        let library = build_library(&s, &AccessorOptions::default());
        let interpreter = Interpreter::new(&[&library], &[]).unwrap();
        assert_eq!(
            interpreter.constant("OfferLib", "next_cast_mask"),
            Some(&Value::uint(u32::MAX))
        );
        assert_eq!(
            interpreter.constant("OfferLib", "gives_size_error"),
            Some(&Value::Str("slot/config/gives/96bits".to_string()))
        );
    }
}
