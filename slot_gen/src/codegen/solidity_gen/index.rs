use indoc::indoc;

use crate::codegen::shared::ir::StructIr;
use crate::codegen::solidity::SolidityGeneratorOptions;
use crate::codegen::template::{Context, TemplateError, format};

use super::library::preamble;

const INDEX_TEMPLATE: &str = indoc! {r#"
    // SPDX-License-Identifier: ${license}

    pragma solidity ${pragma};

    ${preamble}

    ${imports}
"#};

/// One import line per struct, pointing at its library file.
pub fn render_index(
    structs: &[(&StructIr, String)],
    options: &SolidityGeneratorOptions,
) -> Result<String, TemplateError> {
    let imports: Vec<String> = structs
        .iter()
        .map(|(ir, file)| {
            format!(
                "import {{{}, {}, {}}} from \"./{}\";",
                ir.packed, ir.record.name, ir.library.name, file
            )
        })
        .collect();

    let context = Context::new()
        .with("license", options.license.as_str())
        .with("pragma", options.pragma.as_str())
        .with("preamble", preamble(options))
        .with("imports", imports);

    format(INDEX_TEMPLATE, &context)
}
