//! Accessor library generation: per-field constants plus the pack, unpack,
//! get, set, record conversion and check operations of one struct.

use tracing::debug;

use crate::layout::{Field, MaskStyle, Struct, WORD_BITS};

use super::ir::{
    Callee, Constant, ConstantGroup, Expr, Function, FunctionKind, Module, ModuleKind, Param,
    Place, RecordDef, Stmt, Ty,
};

pub const TO_RECORD_ID: &str = "to_struct";
pub const EQ_ID: &str = "eq";
pub const UNPACK_ID: &str = "unpack";
pub const FROM_RECORD_ID: &str = "t_of_struct";
pub const PACK_ID: &str = "pack";

pub fn getter_id(field: &str) -> String {
    format!("get_{field}")
}

pub fn setter_id(field: &str) -> String {
    format!("set_{field}")
}

pub fn check_id(field: &str) -> String {
    format!("check_{field}")
}

/* Parameter and local names; fields may not start with `__` */
const PACKED: &str = "__packed";
const RECORD: &str = "__s";
const VALUE: &str = "val";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorOptions {
    /// Leading segment of the `<prefix>/<field>/<bits>bits` size errors
    pub size_error_prefix: String,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        Self {
            size_error_prefix: "slot/config".to_string(),
        }
    }
}

pub fn packed_ty(s: &Struct) -> Ty {
    Ty::Packed {
        name: s.names().packed.clone(),
    }
}

pub fn record_ty(s: &Struct) -> Ty {
    Ty::Record {
        name: s.names().unpacked.clone(),
    }
}

pub fn record_def(s: &Struct) -> RecordDef {
    RecordDef {
        name: s.names().unpacked.clone(),
        fields: s
            .fields()
            .iter()
            .map(|f| Param::new(f.name(), f.ir_type()))
            .collect(),
    }
}

/// Call target inside the accessor library of `s`.
pub fn library_callee(s: &Struct, id: &str, name: &str) -> Callee {
    Callee {
        module: s.names().library.clone(),
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn build_library(s: &Struct, options: &AccessorOptions) -> Module {
    let builder = LibraryBuilder { s };

    let mut functions = vec![builder.to_record(), builder.eq(), builder.unpack()];
    for field in s.fields() {
        functions.push(builder.getter(field));
        functions.push(builder.setter(field));
    }
    functions.push(builder.from_record());
    functions.push(builder.pack());
    functions.extend(s.fields().iter().map(|f| builder.check(f)));

    let module = Module {
        name: s.names().library.clone(),
        kind: ModuleKind::Library,
        constants: build_constants(s, options),
        functions,
    };
    debug!(
        module = %module.name,
        constants = module.constants.len(),
        functions = module.functions.len(),
        "built accessor library"
    );
    module
}

fn build_constants(s: &Struct, options: &AccessorOptions) -> Vec<Constant> {
    let style = s.conventions().mask_style;
    let fields = s.fields();
    let mut constants = Vec::with_capacity(fields.len() * ConstantGroup::ALL.len());

    let uint = |name: String, group, value| Constant {
        name,
        ty: Ty::Uint,
        group,
        value,
    };

    for field in fields {
        constants.push(uint(
            field.vars().bits,
            ConstantGroup::Bits,
            Expr::literal(field.bits()),
        ));
    }

    for (i, field) in fields.iter().enumerate() {
        let value = match (style, i.checked_sub(1).map(|p| &fields[p])) {
            (MaskStyle::Formula, Some(prev)) => {
                let prev = prev.vars();
                Expr::add(Expr::constant(prev.before), Expr::constant(prev.bits))
            }
            _ => Expr::literal(field.before()),
        };
        constants.push(uint(field.vars().before, ConstantGroup::Before, value));
    }

    for field in fields {
        let vars = field.vars();
        let value = match style {
            MaskStyle::Literal => Expr::hex(field.focus_mask()),
            MaskStyle::Formula => Expr::shr(
                Expr::shl(
                    Expr::Ones,
                    Expr::sub(Expr::literal(WORD_BITS), Expr::constant(vars.bits)),
                ),
                Expr::constant(vars.before),
            ),
        };
        constants.push(uint(vars.mask_inv, ConstantGroup::FocusMask, value));
    }

    for field in fields {
        let vars = field.vars();
        let value = match style {
            MaskStyle::Literal => Expr::hex(field.cleanup_mask()),
            MaskStyle::Formula => Expr::complement(Expr::constant(vars.mask_inv)),
        };
        constants.push(uint(vars.mask, ConstantGroup::CleanupMask, value));
    }

    for field in fields {
        let vars = field.vars();
        let value = match style {
            MaskStyle::Literal => Expr::hex(field.cast_mask()),
            MaskStyle::Formula => {
                Expr::complement(Expr::shl(Expr::Ones, Expr::constant(vars.bits)))
            }
        };
        constants.push(uint(vars.cast_mask, ConstantGroup::CastMask, value));
    }

    for field in fields {
        constants.push(Constant {
            name: field.vars().size_error,
            ty: Ty::Str,
            group: ConstantGroup::SizeError,
            value: Expr::string(format!(
                "{}/{}/{}bits",
                options.size_error_prefix,
                field.name(),
                field.bits()
            )),
        });
    }

    constants
}

struct LibraryBuilder<'a> {
    s: &'a Struct,
}

impl LibraryBuilder<'_> {
    fn packed(&self) -> Ty {
        packed_ty(self.s)
    }

    fn packed_name(&self) -> &str {
        &self.s.names().packed
    }

    /* Raw word of a packed variable */
    fn word(&self, var: &str) -> Expr {
        Expr::unwrap(self.packed_name(), Expr::var(var))
    }

    fn function(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        kind: FunctionKind,
        params: Vec<Param>,
        returns: Vec<Param>,
        body: Vec<Stmt>,
    ) -> Function {
        Function {
            id: id.into(),
            name: name.into(),
            kind,
            doc: None,
            params,
            returns,
            body,
        }
    }

    fn field_params(&self, prefix: &str) -> Vec<Param> {
        self.s
            .fields()
            .iter()
            .map(|f| Param::new(format!("{prefix}{}", f.name()), f.ir_type()))
            .collect()
    }

    fn to_record(&self) -> Function {
        let body = self
            .s
            .fields()
            .iter()
            .map(|f| Stmt::Assign {
                target: Place::Member {
                    base: RECORD.to_string(),
                    field: f.name().to_string(),
                },
                value: f.extract(self.word(PACKED)),
            })
            .collect();
        let mut function = self.function(
            TO_RECORD_ID,
            TO_RECORD_ID,
            FunctionKind::ToRecord,
            vec![Param::new(PACKED, self.packed())],
            vec![Param::new(RECORD, record_ty(self.s))],
            body,
        );
        function.doc = Some("packed word to in-memory record".to_string());
        function
    }

    fn eq(&self) -> Function {
        let mut function = self.function(
            EQ_ID,
            EQ_ID,
            FunctionKind::Eq,
            vec![
                Param::new("__packed1", self.packed()),
                Param::new("__packed2", self.packed()),
            ],
            vec![Param::unnamed(Ty::Bool)],
            vec![Stmt::Return {
                values: vec![Expr::equals(self.word("__packed1"), self.word("__packed2"))],
            }],
        );
        function.doc = Some("raw word equality".to_string());
        function
    }

    fn unpack(&self) -> Function {
        let body = self
            .s
            .fields()
            .iter()
            .map(|f| Stmt::Assign {
                target: Place::Var {
                    name: format!("__{}", f.name()),
                },
                value: f.extract(self.word(PACKED)),
            })
            .collect();
        let mut function = self.function(
            UNPACK_ID,
            UNPACK_ID,
            FunctionKind::Unpack,
            vec![Param::new(PACKED, self.packed())],
            self.field_params("__"),
            body,
        );
        function.doc = Some("packed word to tuple".to_string());
        function
    }

    fn getter(&self, field: &Field) -> Function {
        let mut function = self.function(
            getter_id(field.name()),
            field.name(),
            FunctionKind::Getter {
                field: field.name().to_string(),
            },
            vec![Param::new(PACKED, self.packed())],
            vec![Param::unnamed(field.ir_type())],
            vec![Stmt::Return {
                values: vec![field.extract(self.word(PACKED))],
            }],
        );
        function.doc = field.comment().map(str::to_string);
        function
    }

    fn setter(&self, field: &Field) -> Function {
        let cleared = Expr::and(
            self.word(PACKED),
            Expr::constant(field.vars().mask),
        );
        let word = Expr::or(cleared, field.inject(Expr::var(VALUE)));
        self.function(
            setter_id(field.name()),
            field.name(),
            FunctionKind::Setter {
                field: field.name().to_string(),
            },
            vec![
                Param::new(PACKED, self.packed()),
                Param::new(VALUE, field.ir_type()),
            ],
            vec![Param::unnamed(self.packed())],
            vec![Stmt::Return {
                values: vec![Expr::wrap(self.packed_name(), word)],
            }],
        )
    }

    fn from_record(&self) -> Function {
        let args = self
            .s
            .fields()
            .iter()
            .map(|f| Expr::member(Expr::var(RECORD), f.name()))
            .collect();
        let mut function = self.function(
            FROM_RECORD_ID,
            FROM_RECORD_ID,
            FunctionKind::FromRecord,
            vec![Param::new(RECORD, record_ty(self.s))],
            vec![Param::unnamed(self.packed())],
            vec![Stmt::Return {
                values: vec![Expr::call(
                    library_callee(self.s, PACK_ID, PACK_ID),
                    args,
                )],
            }],
        );
        function.doc = Some("in-memory record to packed word".to_string());
        function
    }

    fn pack(&self) -> Function {
        let target = || Place::Var {
            name: PACKED.to_string(),
        };
        let mut body = vec![Stmt::Let {
            name: PACKED.to_string(),
            ty: Ty::Uint,
            value: None,
        }];
        body.extend(self.s.fields().iter().map(|f| Stmt::OrAssign {
            target: target(),
            value: f.inject(Expr::var(format!("__{}", f.name()))),
        }));
        body.push(Stmt::Return {
            values: vec![Expr::wrap(self.packed_name(), Expr::var(PACKED))],
        });

        let mut function = self.function(
            PACK_ID,
            PACK_ID,
            FunctionKind::Pack,
            self.field_params("__"),
            vec![Param::unnamed(self.packed())],
            body,
        );
        function.doc = Some("values to packed word".to_string());
        function
    }

    fn check(&self, field: &Field) -> Function {
        let mut function = self.function(
            check_id(field.name()),
            format!("{}_check", field.name()),
            FunctionKind::Check {
                field: field.name().to_string(),
            },
            vec![Param::new(format!("__{}", field.name()), field.ir_type())],
            vec![Param::unnamed(Ty::Bool)],
            vec![Stmt::Return {
                values: vec![field.check(Expr::var(format!("__{}", field.name())))],
            }],
        );
        function.doc = Some(format!("true when the value fits {} bits", field.bits()));
        function
    }
}
