use indoc::indoc;

use crate::codegen::shared::ir::StructIr;
use crate::codegen::solidity::SolidityGeneratorOptions;
use crate::codegen::template::{Context, TemplateError, format};

use super::library::{function_lines, preamble, user_types};

const TEST_TEMPLATE: &str = indoc! {r#"
    // SPDX-License-Identifier: ${license}

    pragma solidity ${pragma};

    ${preamble}

    import {Test} from "${test_import}";
    import {${symbols}} from "${src_import}";

    contract ${contract} is Test {

      ${functions}
    }
"#};

/* Names the test contract needs from the library file */
fn imported_symbols(ir: &StructIr) -> Vec<String> {
    let mut symbols = vec![
        ir.packed.clone(),
        ir.record.name.clone(),
        ir.library.name.clone(),
        "ONES".to_string(),
    ];
    symbols.extend(user_types(ir));
    symbols
}

pub fn render_tests(
    ir: &StructIr,
    src_import: &str,
    options: &SolidityGeneratorOptions,
) -> Result<String, TemplateError> {
    let context = Context::new()
        .with("license", options.test_license.as_str())
        .with("pragma", options.pragma.as_str())
        .with("preamble", preamble(options))
        .with("test_import", options.test_import.as_str())
        .with("symbols", imported_symbols(ir).join(", "))
        .with("src_import", src_import)
        .with("contract", ir.tests.name.as_str())
        .with("functions", function_lines(&ir.tests)?);

    format(TEST_TEMPLATE, &context)
}
