//! Debug library: a `toString` overload for every packed word and record.
//!
//! Values are formatted with the forge cheatcode `vm.toString`. Fields of a
//! user-defined value type are unwrapped first.

use std::collections::BTreeSet;

use indoc::indoc;

use crate::codegen::shared::ir::{StructIr, Ty};
use crate::codegen::solidity::SolidityGeneratorOptions;
use crate::codegen::template::{Context, TemplateError, format};

use super::library::{preamble, user_types};

const TO_STRING_TEMPLATE: &str = indoc! {r#"
    // SPDX-License-Identifier: ${license}

    pragma solidity ${pragma};

    ${preamble}

    import {Vm} from "${vm_import}";

    address constant VM_ADDRESS = address(uint160(uint(keccak256("hevm cheat code"))));
    Vm constant vm = Vm(VM_ADDRESS);

    ${structs}
"#};

const STRUCT_TEMPLATE: &str = indoc! {r#"
    import {${symbols}} from "./${src_file}";

    function toString(${packed} __packed) pure returns (string memory) {
      return toString(__packed.to_struct());
    }

    function toString(${unpacked} memory __unpacked) pure returns (string memory) {
      return string.concat(
        ${parts}
      );
    }"#};

/* Arguments of `string.concat`, one line per field */
fn concat_parts(ir: &StructIr) -> Vec<String> {
    let fields = &ir.record.fields;
    let mut parts = vec![format!("\"{}{{\",", ir.packed)];
    for (i, p) in fields.iter().enumerate() {
        let value = match &p.ty {
            Ty::User { name, .. } => format!("vm.toString({name}.unwrap(__unpacked.{}))", p.name),
            _ => format!("vm.toString(__unpacked.{})", p.name),
        };
        let separator = if i + 1 < fields.len() { " \", \"," } else { "" };
        parts.push(format!("\"{}: \", {value},{separator}", p.name));
    }
    parts.push("\"}\"".to_string());
    parts
}

/// One block per struct; each user type is imported once, from the first
/// library that mentions it.
pub fn render_to_string(
    structs: &[(&StructIr, String)],
    options: &SolidityGeneratorOptions,
) -> Result<String, TemplateError> {
    let mut imported: BTreeSet<String> = BTreeSet::new();
    let mut blocks: Vec<String> = Vec::new();

    for (ir, src_file) in structs {
        let mut symbols = vec![ir.packed.clone(), ir.record.name.clone()];
        for name in user_types(ir) {
            if imported.insert(name.clone()) {
                symbols.push(name);
            }
        }

        let context = Context::new()
            .with("symbols", symbols.join(", "))
            .with("src_file", src_file.as_str())
            .with("packed", ir.packed.as_str())
            .with("unpacked", ir.record.name.as_str())
            .with("parts", concat_parts(ir));

        if !blocks.is_empty() {
            blocks.push(String::new());
        }
        blocks.extend(format(STRUCT_TEMPLATE, &context)?.lines().map(str::to_string));
    }

    let context = Context::new()
        .with("license", options.license.as_str())
        .with("pragma", options.pragma.as_str())
        .with("preamble", preamble(options))
        .with("vm_import", options.vm_import.as_str())
        .with("structs", blocks);

    format(TO_STRING_TEMPLATE, &context)
}
