//! Randomized execution of a struct's round-trip tests in the interpreter.

use std::fmt;

use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

use super::interpreter::{EvalError, Interpreter};
use super::ir::{StructIr, Ty};
use super::value::Value;
use crate::layout::conventions::{ADDRESS_BITS, WORD_BITS};
use crate::layout::field::low_ones;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteOptions {
    /// Random cases per test
    pub runs: usize,
    pub seed: u64,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self { runs: 256, seed: 0 }
    }
}

/// First failing case of a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTripFailure {
    pub struct_name: String,
    pub test: String,
    pub message: String,
    pub expected: Value,
    pub actual: Value,
    pub inputs: Vec<Value>,
}

impl fmt::Display for RoundTripFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "struct '{}', {}: {} (expected {}, got {}) with inputs [",
            self.struct_name, self.test, self.message, self.expected, self.actual
        )?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", input)?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteError {
    #[error("round-trip failure in {0}")]
    Failed(Box<RoundTripFailure>),

    #[error("struct '{struct_name}', {test}: {error}")]
    Eval {
        struct_name: String,
        test: String,
        error: EvalError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub struct_name: String,
    /// Test names with the number of cases each one ran
    pub tests: Vec<(String, usize)>,
}

impl SuiteReport {
    pub fn total_cases(&self) -> usize {
        self.tests.iter().map(|(_, runs)| runs).sum()
    }
}

/// Run every test of the struct's test module `options.runs` times.
pub fn run_suite(ir: &StructIr, options: &SuiteOptions) -> Result<SuiteReport, SuiteError> {
    let eval_error = |test: &str, error| SuiteError::Eval {
        struct_name: ir.name.clone(),
        test: test.to_string(),
        error,
    };

    let interpreter = Interpreter::for_struct(ir).map_err(|e| eval_error("<constants>", e))?;
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut tests = Vec::new();

    for test in ir.tests.tests() {
        for _ in 0..options.runs {
            let inputs = test
                .params
                .iter()
                .map(|p| random_value(&p.ty, &interpreter, &mut rng))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| eval_error(&test.name, e))?;

            match interpreter.call(&ir.tests.name, &test.id, inputs.clone()) {
                Ok(_) => {}
                Err(EvalError::AssertionFailed {
                    message,
                    expected,
                    actual,
                    ..
                }) => {
                    return Err(SuiteError::Failed(Box::new(RoundTripFailure {
                        struct_name: ir.name.clone(),
                        test: test.name.clone(),
                        message,
                        expected,
                        actual,
                        inputs,
                    })));
                }
                Err(error) => return Err(eval_error(&test.name, error)),
            }
        }
        debug!(struct_name = %ir.name, test = %test.name, runs = options.runs, "test passed");
        tests.push((test.name.clone(), options.runs));
    }

    Ok(SuiteReport {
        struct_name: ir.name.clone(),
        tests,
    })
}

fn full_word(rng: &mut impl RngCore) -> BigUint {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

/* Half the draws use every bit, the rest a random magnitude */
fn random_bits(rng: &mut impl RngCore, max_bits: u32) -> BigUint {
    let width = if rng.gen_bool(0.5) {
        max_bits
    } else {
        rng.gen_range(0..=max_bits)
    };
    full_word(rng) & low_ones(width)
}

/// Arbitrary inhabitant of `ty`, including values wider than any field.
pub fn random_value(ty: &Ty, interpreter: &Interpreter<'_>, rng: &mut ChaCha8Rng) -> Result<Value, EvalError> {
    Ok(match ty {
        Ty::Uint => Value::Uint(random_bits(rng, WORD_BITS)),
        Ty::Int => {
            let magnitude = BigInt::from(random_bits(rng, WORD_BITS - 1));
            Value::int(if rng.gen_bool(0.5) { -magnitude } else { magnitude })
        }
        Ty::Address => Value::Address(random_bits(rng, ADDRESS_BITS)),
        Ty::Bool => Value::Bool(rng.gen_bool(0.5)),
        Ty::Str => Value::Str(String::new()),
        Ty::User { name, underlying } => Value::wrapped(
            name.clone(),
            random_value(&Ty::primitive(*underlying), interpreter, rng)?,
        ),
        /* Packed words are fully random: dirty bits included */
        Ty::Packed { name } => Value::packed(name.clone(), full_word(rng)),
        Ty::Record { name } => {
            let mut fields = IndexMap::new();
            for member in &interpreter.record(name)?.fields {
                fields.insert(member.name.clone(), random_value(&member.ty, interpreter, rng)?);
            }
            Value::Record {
                name: name.clone(),
                fields,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::ir::{Expr, Stmt};
    use crate::codegen::shared::{AccessorOptions, build_struct_ir};
    use crate::layout::{Conventions, Struct};
    use slot_types::FieldDef;

    fn local(conventions: Conventions, bool_bits: u32) -> Struct {
        Struct::from_fields(
            "local",
            vec![
                FieldDef::new("active", bool_bits, "bool"),
                FieldDef::new("fee", 8, "uint"),
                FieldDef::new("density", 12, "Density").with_underlying("uint"),
                FieldDef::new("tick", 24, "Tick").with_underlying("int"),
                FieldDef::new("maker", 160, "address"),
            ],
            conventions,
        )
        .unwrap()
    }

    #[test]
    fn generated_suite_passes_in_both_generations() {
        for (conventions, bool_bits) in [(Conventions::GENERATION_1, 8), (Conventions::GENERATION_2, 1)] {
            let ir = build_struct_ir(&local(conventions, bool_bits), &AccessorOptions::default());
            let report = run_suite(&ir, &SuiteOptions { runs: 64, seed: 7 }).unwrap();
            assert_eq!(report.struct_name, "local");
            assert_eq!(report.tests.len(), 5 + 5);
            assert_eq!(report.total_cases(), 10 * 64);
        }
    }

    #[test]
    fn broken_setter_is_caught() {
        let s = local(Conventions::GENERATION_2, 1);
        let mut ir = build_struct_ir(&s, &AccessorOptions::default());
        /* Sabotage: the fee setter forgets to clear the old value */
        let setter = ir
            .library
            .functions
            .iter_mut()
            .find(|f| f.id == "set_fee")
            .unwrap();
        let fee = s.field("fee").unwrap();
        setter.body = vec![Stmt::Return {
            values: vec![Expr::wrap(
                "Local",
                Expr::or(
                    Expr::unwrap("Local", Expr::var("__packed")),
                    fee.inject(Expr::var("val")),
                ),
            )],
        }];

        match run_suite(&ir, &SuiteOptions { runs: 64, seed: 1 }) {
            Err(SuiteError::Failed(failure)) => {
                assert_eq!(failure.struct_name, "local");
                assert!(failure.test.starts_with("test_"));
                assert!(failure.message.contains("fee"), "{}", failure);
            }
            other => panic!("expected a round-trip failure, got {:?}", other),
        }
    }
}
