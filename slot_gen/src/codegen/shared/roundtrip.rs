//! Round-trip property tests for an accessor library.
//!
//! Every test is a function whose parameters are the fuzzed inputs. Tests
//! only observe the library through its public operations, so the same
//! module checks the rendered code and the interpreted IR.

use tracing::debug;

use crate::layout::{Field, Struct};
use crate::layout::conventions::WORD_BITS;
use crate::codegen::shared::ir::Primitive;

use super::accessors::{
    FROM_RECORD_ID, PACK_ID, TO_RECORD_ID, UNPACK_ID, getter_id, library_callee, packed_ty,
    record_ty, setter_id,
};
use super::ir::{
    Callee, Expr, Function, FunctionKind, Module, ModuleKind, Param, Place, Stmt, Ty,
};

pub const CAST_UINT_ID: &str = "cast_uint";
pub const CAST_INT_ID: &str = "cast_int";

pub fn build_tests(s: &Struct) -> Module {
    let builder = TestBuilder { s };

    let mut functions = vec![builder.cast_uint(), builder.cast_int(), builder.test_pack()];
    functions.extend(s.fields().iter().map(|f| builder.test_set(f)));
    functions.push(builder.test_unpack());
    functions.push(builder.test_inverse_1());
    functions.push(builder.test_inverse_2());
    functions.push(builder.test_repack());

    let module = Module {
        name: s.names().test.clone(),
        kind: ModuleKind::TestSuite,
        constants: Vec::new(),
        functions,
    };
    debug!(
        module = %module.name,
        tests = module.tests().count(),
        "built round-trip tests"
    );
    module
}

struct TestBuilder<'a> {
    s: &'a Struct,
}

impl TestBuilder<'_> {
    fn helper(&self, id: &str) -> Callee {
        Callee {
            module: self.s.names().test.clone(),
            id: id.to_string(),
            name: "cast".to_string(),
        }
    }

    fn get(&self, field: &Field, packed: Expr) -> Expr {
        Expr::call(
            library_callee(self.s, &getter_id(field.name()), field.name()),
            vec![packed],
        )
    }

    fn set(&self, field: &Field, packed: Expr, value: Expr) -> Expr {
        Expr::call(
            library_callee(self.s, &setter_id(field.name()), field.name()),
            vec![packed, value],
        )
    }

    /* Comparable raw value of a getter result or an input */
    fn raw(&self, field: &Field, value: Expr) -> Expr {
        field.unwrapped(value)
    }

    /* What a getter must return after `value` was written */
    fn expected(&self, field: &Field, value: Expr) -> Expr {
        let raw = field.unwrapped(value);
        let width = Expr::literal(field.bits());
        match field.ty().underlying() {
            Primitive::Uint => Expr::call(self.helper(CAST_UINT_ID), vec![raw, width]),
            Primitive::Int => Expr::call(self.helper(CAST_INT_ID), vec![raw, width]),
            Primitive::Address | Primitive::Bool => raw,
        }
    }

    fn values(&self) -> Vec<Param> {
        self.s
            .fields()
            .iter()
            .map(|f| Param::new(f.name(), f.ir_type()))
            .collect()
    }

    fn test(&self, name: impl Into<String>, params: Vec<Param>, body: Vec<Stmt>) -> Function {
        let name = name.into();
        Function {
            id: name.clone(),
            name,
            kind: FunctionKind::Test,
            doc: None,
            params,
            returns: Vec::new(),
            body,
        }
    }

    fn let_packed(&self, name: &str, value: Option<Expr>) -> Stmt {
        Stmt::Let {
            name: name.to_string(),
            ty: packed_ty(self.s),
            value,
        }
    }

    fn cast_uint(&self) -> Function {
        let width = Expr::sub(Expr::literal(WORD_BITS), Expr::var("to"));
        Function {
            id: CAST_UINT_ID.to_string(),
            name: "cast".to_string(),
            kind: FunctionKind::Helper,
            doc: Some("keep the low `to` bits".to_string()),
            params: vec![Param::new("u", Ty::Uint), Param::new("to", Ty::Uint)],
            returns: vec![Param::unnamed(Ty::Uint)],
            body: vec![Stmt::Return {
                values: vec![Expr::and(Expr::var("u"), Expr::shr(Expr::Ones, width))],
            }],
        }
    }

    fn cast_int(&self) -> Function {
        let width = || Expr::sub(Expr::literal(WORD_BITS), Expr::var("to"));
        Function {
            id: CAST_INT_ID.to_string(),
            name: "cast".to_string(),
            kind: FunctionKind::Helper,
            doc: Some("sign-extend from the low `to` bits".to_string()),
            params: vec![Param::new("u", Ty::Int), Param::new("to", Ty::Uint)],
            returns: vec![Param::unnamed(Ty::Int)],
            body: vec![Stmt::Return {
                values: vec![Expr::shr(Expr::shl(Expr::var("u"), width()), width())],
            }],
        }
    }

    fn test_pack(&self) -> Function {
        let args = self
            .s
            .fields()
            .iter()
            .map(|f| Expr::var(f.name()))
            .collect();
        let mut body = vec![self.let_packed(
            "__packed",
            Some(Expr::call(library_callee(self.s, PACK_ID, PACK_ID), args)),
        )];
        body.extend(self.s.fields().iter().map(|f| Stmt::AssertEq {
            left: self.raw(f, self.get(f, Expr::var("__packed"))),
            right: self.expected(f, Expr::var(f.name())),
            message: format!("bad {}", f.name()),
        }));
        self.test("test_pack", self.values(), body)
    }

    fn test_set(&self, field: &Field) -> Function {
        let packed = || Expr::var("__packed");
        let modified = || Expr::var("__modified");

        let mut body = vec![
            self.let_packed(
                "__original",
                Some(self.set(field, packed(), self.get(field, packed()))),
            ),
            Stmt::AssertEq {
                left: self.raw(field, self.get(field, Expr::var("__original"))),
                right: self.raw(field, self.get(field, packed())),
                message: format!("original: bad {}", field.name()),
            },
            self.let_packed(
                "__modified",
                Some(self.set(field, packed(), Expr::var(field.name()))),
            ),
            Stmt::AssertEq {
                left: self.raw(field, self.get(field, modified())),
                right: self.expected(field, Expr::var(field.name())),
                message: format!("modified: bad {}", field.name()),
            },
        ];
        body.extend(
            self.s
                .fields()
                .iter()
                .filter(|other| other.name() != field.name())
                .map(|other| Stmt::AssertEq {
                    left: self.raw(other, self.get(other, modified())),
                    right: self.raw(other, self.get(other, packed())),
                    message: format!("modified: bad {}", other.name()),
                }),
        );

        self.test(
            format!("test_set_{}", field.name()),
            vec![
                Param::new("__packed", packed_ty(self.s)),
                Param::new(field.name(), field.ir_type()),
            ],
            body,
        )
    }

    fn test_unpack(&self) -> Function {
        let mut body = vec![Stmt::Destructure {
            targets: self.values(),
            value: Expr::call(
                library_callee(self.s, UNPACK_ID, UNPACK_ID),
                vec![Expr::var("__packed")],
            ),
        }];
        body.extend(self.s.fields().iter().map(|f| Stmt::AssertEq {
            left: self.raw(f, Expr::var(f.name())),
            right: self.raw(f, self.get(f, Expr::var("__packed"))),
            message: format!("bad {}", f.name()),
        }));
        self.test(
            "test_unpack",
            vec![Param::new("__packed", packed_ty(self.s))],
            body,
        )
    }

    fn test_inverse_1(&self) -> Function {
        let mut body = vec![Stmt::Let {
            name: "__unpacked".to_string(),
            ty: record_ty(self.s),
            value: Some(Expr::call(
                library_callee(self.s, TO_RECORD_ID, TO_RECORD_ID),
                vec![Expr::var("__packed")],
            )),
        }];
        body.extend(self.s.fields().iter().map(|f| Stmt::AssertEq {
            left: self.raw(f, Expr::member(Expr::var("__unpacked"), f.name())),
            right: self.raw(f, self.get(f, Expr::var("__packed"))),
            message: format!("bad {}", f.name()),
        }));
        self.test(
            "test_inverse_1",
            vec![Param::new("__packed", packed_ty(self.s))],
            body,
        )
    }

    fn test_inverse_2(&self) -> Function {
        let mut body = vec![
            self.let_packed(
                "__packed",
                Some(Expr::call(
                    library_callee(self.s, FROM_RECORD_ID, FROM_RECORD_ID),
                    vec![Expr::var("__unpacked")],
                )),
            ),
            self.let_packed("__packed2", None),
        ];
        body.extend(self.s.fields().iter().map(|f| Stmt::Assign {
            target: Place::Var {
                name: "__packed2".to_string(),
            },
            value: self.set(
                f,
                Expr::var("__packed2"),
                Expr::member(Expr::var("__unpacked"), f.name()),
            ),
        }));
        body.extend(self.s.fields().iter().map(|f| Stmt::AssertEq {
            left: self.raw(f, self.get(f, Expr::var("__packed"))),
            right: self.raw(f, self.get(f, Expr::var("__packed2"))),
            message: format!("bad {}", f.name()),
        }));
        self.test(
            "test_inverse_2",
            vec![Param::new("__unpacked", record_ty(self.s))],
            body,
        )
    }

    fn test_repack(&self) -> Function {
        let pack = |args: Vec<Expr>| Expr::call(library_callee(self.s, PACK_ID, PACK_ID), args);
        let fields = self.s.fields();

        let body = vec![
            self.let_packed(
                "__packed",
                Some(pack(fields.iter().map(|f| Expr::var(f.name())).collect())),
            ),
            Stmt::Destructure {
                targets: fields
                    .iter()
                    .map(|f| Param::new(format!("__{}", f.name()), f.ir_type()))
                    .collect(),
                value: Expr::call(
                    library_callee(self.s, UNPACK_ID, UNPACK_ID),
                    vec![Expr::var("__packed")],
                ),
            },
            self.let_packed(
                "__repacked",
                Some(pack(
                    fields
                        .iter()
                        .map(|f| Expr::var(format!("__{}", f.name())))
                        .collect(),
                )),
            ),
            Stmt::AssertEq {
                left: Expr::unwrap(&self.s.names().packed, Expr::var("__repacked")),
                right: Expr::unwrap(&self.s.names().packed, Expr::var("__packed")),
                message: "repack: word changed".to_string(),
            },
        ];
        self.test("test_repack", self.values(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Conventions;
    use slot_types::FieldDef;

    fn offer() -> Struct {
        Struct::from_fields(
            "offer",
            vec![
                FieldDef::new("prev", 32, "uint"),
                FieldDef::new("tick", 21, "Tick").with_underlying("int"),
                FieldDef::new("dead", 1, "bool"),
            ],
            Conventions::GENERATION_2,
        )
        .unwrap()
    }

    #[test]
    fn one_setter_test_per_field() {
        let module = build_tests(&offer());
        assert_eq!(module.name, "OfferTest");
        let tests: Vec<&str> = module.tests().map(|f| f.name.as_str()).collect();
        assert_eq!(
            tests,
            vec![
                "test_pack",
                "test_set_prev",
                "test_set_tick",
                "test_set_dead",
                "test_unpack",
                "test_inverse_1",
                "test_inverse_2",
                "test_repack",
            ]
        );
        assert_eq!(module.function(CAST_INT_ID).unwrap().name, "cast");
    }

    #[test]
    fn setter_test_checks_every_other_field() {
        let module = build_tests(&offer());
        let test = module.function("test_set_tick").unwrap();
        let messages: Vec<&str> = test
            .body
            .iter()
            .filter_map(|s| match s {
                Stmt::AssertEq { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                "original: bad tick",
                "modified: bad tick",
                "modified: bad prev",
                "modified: bad dead",
            ]
        );
    }

    #[test]
    fn expected_values_are_cast_to_the_field_width() {
        let s = offer();
        let module = build_tests(&s);
        let test = module.function("test_pack").unwrap();
        let Stmt::AssertEq { right, .. } = &test.body[2] else {
            panic!("expected an assertion");
        };
        match right {
            Expr::Call { callee, args } => {
                assert_eq!(callee.id, CAST_INT_ID);
                assert_eq!(args[1], Expr::literal(21u32));
                assert_eq!(args[0], Expr::unwrap("Tick", Expr::var("tick")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
