use std::collections::BTreeSet;

use indoc::indoc;

use crate::codegen::shared::ir::{ConstantGroup, Module, StructIr, Ty};
use crate::codegen::solidity::SolidityGeneratorOptions;
use crate::codegen::template::{Context, TemplateError, format, tabulate};

use super::expr;

const LIBRARY_TEMPLATE: &str = indoc! {r#"
    // SPDX-License-Identifier: ${license}

    pragma solidity ${pragma};

    ${preamble}

    ${utilities}

    struct ${unpacked} {
      ${record_fields}
    }

    type ${packed} is uint;
    using ${library} for ${packed} global;

    // additional definitions
    ${additional}
    // end of additional definitions

    library ${library} {

      // field widths
      ${bits}

      // offsets: bits above each field
      ${before}

      // focus masks: 1s over the field, 0s elsewhere
      ${mask_inv}

      // cleanup masks: 0s over the field, 1s elsewhere
      ${mask}

      // cast masks: one trailing 1 per field bit
      ${cast_mask}

      // size error messages
      ${size_error}

      ${functions}
    }
"#};

const UTILITIES: &str = indoc! {r#"
    function uint_of_bool(bool b) pure returns (uint u) {
      assembly ("memory-safe") {
        u := b
      }
    }

    uint constant ONES = type(uint).max;"#};

pub fn preamble(options: &SolidityGeneratorOptions) -> String {
    format!(
        "// Generated by slot-gen from schema '{}'. Do not edit.",
        options.package
    )
}

/// User-defined value types of a struct's fields, sorted and deduplicated.
pub fn user_types(ir: &StructIr) -> Vec<String> {
    let names: BTreeSet<&str> = ir
        .record
        .fields
        .iter()
        .filter_map(|p| match &p.ty {
            Ty::User { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    names.into_iter().map(str::to_string).collect()
}

fn constant_lines(module: &Module, group: ConstantGroup) -> Vec<String> {
    let rows: Vec<Vec<String>> = module
        .constants
        .iter()
        .filter(|c| c.group == group)
        .map(|c| {
            vec![
                expr::ty(&c.ty),
                "constant".to_string(),
                c.name.clone(),
                "=".to_string(),
                format!("{};", expr::expr(&c.value, &module.name)),
            ]
        })
        .collect();
    tabulate(&rows)
}

/// Functions separated by blank lines.
pub fn function_lines(module: &Module) -> Result<Vec<String>, TemplateError> {
    let mut lines = Vec::new();
    for (i, function) in module.functions.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(expr::function(function, &module.name)?);
    }
    Ok(lines)
}

pub fn render_library(ir: &StructIr, options: &SolidityGeneratorOptions) -> Result<String, TemplateError> {
    let library = &ir.library;

    let record_fields = tabulate(
        &ir.record
            .fields
            .iter()
            .map(|p| vec![expr::ty(&p.ty), format!("{};", p.name)])
            .collect::<Vec<_>>(),
    );
    let additional = ir.additional_definitions.as_deref().unwrap_or_default();
    let additional = additional.strip_suffix('\n').unwrap_or(additional);

    let mut context = Context::new()
        .with("license", options.license.as_str())
        .with("pragma", options.pragma.as_str())
        .with("preamble", preamble(options))
        .with("utilities", UTILITIES)
        .with("unpacked", ir.record.name.as_str())
        .with("packed", ir.packed.as_str())
        .with("library", library.name.as_str())
        .with("record_fields", record_fields)
        .with("additional", additional)
        .with("functions", function_lines(library)?);

    for (placeholder, group) in [
        ("bits", ConstantGroup::Bits),
        ("before", ConstantGroup::Before),
        ("mask_inv", ConstantGroup::FocusMask),
        ("mask", ConstantGroup::CleanupMask),
        ("cast_mask", ConstantGroup::CastMask),
        ("size_error", ConstantGroup::SizeError),
    ] {
        context.set(placeholder, constant_lines(library, group));
    }

    format(LIBRARY_TEMPLATE, &context)
}
