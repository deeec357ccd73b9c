//! IR to Solidity: types, expressions, statements and function blocks.

use crate::codegen::shared::ir::{
    BinOp, CastKind, Expr, Function, FunctionKind, Param, Place, Stmt, Ty,
};
use crate::codegen::template::{Context, TemplateError, format};

pub fn ty(ty: &Ty) -> String {
    match ty {
        Ty::Uint => "uint".to_string(),
        Ty::Int => "int".to_string(),
        Ty::Address => "address".to_string(),
        Ty::Bool => "bool".to_string(),
        Ty::Str => "string".to_string(),
        Ty::User { name, .. } | Ty::Packed { name } | Ty::Record { name } => name.clone(),
    }
}

/* Reference types need a data location in signatures and locals */
fn located(t: &Ty) -> String {
    match t {
        Ty::Record { .. } | Ty::Str => format!("{} memory", ty(t)),
        other => ty(other),
    }
}

pub fn param(p: &Param) -> String {
    if p.name.is_empty() {
        located(&p.ty)
    } else {
        format!("{} {}", located(&p.ty), p.name)
    }
}

fn params(ps: &[Param]) -> String {
    ps.iter().map(param).collect::<Vec<_>>().join(", ")
}

fn bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::And => "&",
        BinOp::Or => "|",
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Gt => ">",
        BinOp::Eq => "==",
    }
}

pub fn string_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Render an expression; calls into `module` are left unqualified.
pub fn expr(e: &Expr, module: &str) -> String {
    match e {
        Expr::Var { name } | Expr::Const { name } => name.clone(),
        Expr::Literal { value } => value.to_string(),
        Expr::Hex { value } => format!("0x{:0>64}", value.to_str_radix(16)),
        Expr::Str { value } => string_literal(value),
        Expr::Ones => "ONES".to_string(),
        Expr::Binary { op, left, right } => format!(
            "{} {} {}",
            operand(left, module),
            bin_op(*op),
            operand(right, module)
        ),
        Expr::Not { operand: inner } => format!("~{}", operand(inner, module)),
        Expr::Cast { to, operand: inner } => {
            let inner = expr(inner, module);
            match to {
                CastKind::Uint => format!("uint({inner})"),
                CastKind::Int => format!("int({inner})"),
                CastKind::Address => format!("address(uint160({inner}))"),
                CastKind::UintOfAddress => format!("uint(uint160({inner}))"),
                CastKind::UintOfBool => format!("uint_of_bool({inner})"),
            }
        }
        Expr::Wrap { ty, operand: inner } => format!("{}.wrap({})", ty, expr(inner, module)),
        Expr::Unwrap { ty, operand: inner } => format!("{}.unwrap({})", ty, expr(inner, module)),
        Expr::Member { base, field } => format!("{}.{}", operand(base, module), field),
        Expr::Call { callee, args } => {
            let args = args
                .iter()
                .map(|a| expr(a, module))
                .collect::<Vec<_>>()
                .join(", ");
            if callee.module == module {
                format!("{}({})", callee.name, args)
            } else {
                format!("{}.{}({})", callee.module, callee.name, args)
            }
        }
    }
}

/* Operators nest with explicit parentheses; precedence is never relied on */
fn operand(e: &Expr, module: &str) -> String {
    match e {
        Expr::Binary { .. } => format!("({})", expr(e, module)),
        other => expr(other, module),
    }
}

fn place(p: &Place) -> String {
    match p {
        Place::Var { name } => name.clone(),
        Place::Member { base, field } => format!("{base}.{field}"),
    }
}

pub fn stmt(s: &Stmt, module: &str) -> String {
    match s {
        Stmt::Let { name, ty, value } => match value {
            Some(value) => format!("{} {} = {};", located(ty), name, expr(value, module)),
            None => format!("{} {};", located(ty), name),
        },
        Stmt::Destructure { targets, value } => {
            format!("({}) = {};", params(targets), expr(value, module))
        }
        Stmt::Assign { target, value } => format!("{} = {};", place(target), expr(value, module)),
        Stmt::OrAssign { target, value } => format!("{} |= {};", place(target), expr(value, module)),
        Stmt::Return { values } => match values.as_slice() {
            [] => "return;".to_string(),
            [single] => format!("return {};", expr(single, module)),
            many => format!(
                "return ({});",
                many.iter()
                    .map(|v| expr(v, module))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        Stmt::AssertEq {
            left,
            right,
            message,
        } => format!(
            "assertEq({}, {}, {});",
            expr(left, module),
            expr(right, module),
            string_literal(message)
        ),
    }
}

/// Render a function of `module` as a block of lines.
pub fn function(f: &Function, module: &str) -> Result<Vec<String>, TemplateError> {
    let mut signature = format!("function {}({})", f.name, params(&f.params));
    let template = match f.kind {
        FunctionKind::Test => {
            signature.push_str(" public");
            "${doc}${signature} {\n  ${body}\n}"
        }
        FunctionKind::Helper => {
            signature.push_str(" internal pure");
            "${doc}${signature} {\n  ${body}\n}"
        }
        _ => {
            signature.push_str(" internal pure");
            "${doc}${signature} { unchecked {\n  ${body}\n}}"
        }
    };
    if !f.returns.is_empty() {
        signature.push_str(&format!(" returns ({})", params(&f.returns)));
    }

    let doc = f
        .doc
        .as_ref()
        .map(|d| format!("// {d}\n"))
        .unwrap_or_default();
    let body: Vec<String> = f.body.iter().map(|s| stmt(s, module)).collect();
    let context = Context::new()
        .with("doc", doc)
        .with("signature", signature)
        .with("body", body);

    Ok(format(template, &context)?.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::ir::Callee;
    use num_bigint::BigUint;

    #[test]
    fn nested_operators_are_parenthesized() {
        let e = Expr::shr(
            Expr::shl(Expr::unwrap("Offer", Expr::var("__packed")), Expr::constant("prev_before")),
            Expr::sub(Expr::literal(256u32), Expr::constant("prev_bits")),
        );
        assert_eq!(
            expr(&e, "OfferLib"),
            "(Offer.unwrap(__packed) << prev_before) >> (256 - prev_bits)"
        );
    }

    #[test]
    fn hex_literals_fill_the_word() {
        let e = Expr::hex(BigUint::from(0xffu32));
        assert_eq!(expr(&e, "M"), format!("0x{}ff", "0".repeat(62)));
    }

    #[test]
    fn casts_render_as_conversions() {
        let addr = Expr::cast(CastKind::Address, Expr::var("x"));
        assert_eq!(expr(&addr, "M"), "address(uint160(x))");
        let b = Expr::cast(CastKind::UintOfBool, Expr::var("flag"));
        assert_eq!(expr(&b, "M"), "uint_of_bool(flag)");
    }

    #[test]
    fn foreign_calls_are_qualified() {
        let callee = Callee {
            module: "OfferLib".into(),
            id: "get_prev".into(),
            name: "prev".into(),
        };
        let call = Expr::call(callee, vec![Expr::var("__packed")]);
        assert_eq!(expr(&call, "OfferTest"), "OfferLib.prev(__packed)");
        assert_eq!(expr(&call, "OfferLib"), "prev(__packed)");
    }

    #[test]
    fn record_locals_live_in_memory() {
        let s = Stmt::Let {
            name: "__unpacked".into(),
            ty: Ty::Record {
                name: "OfferUnpacked".into(),
            },
            value: None,
        };
        assert_eq!(stmt(&s, "M"), "OfferUnpacked memory __unpacked;");
    }

    #[test]
    fn library_functions_are_unchecked() {
        let f = Function {
            id: "eq".into(),
            name: "eq".into(),
            kind: FunctionKind::Eq,
            doc: Some("raw word equality".into()),
            params: vec![Param::new("a", Ty::Uint)],
            returns: vec![Param::unnamed(Ty::Bool)],
            body: vec![Stmt::Return {
                values: vec![Expr::var("a")],
            }],
        };
        assert_eq!(
            function(&f, "OfferLib").unwrap(),
            vec![
                "// raw word equality",
                "function eq(uint a) internal pure returns (bool) { unchecked {",
                "  return a;",
                "}}",
            ]
        );
    }
}
