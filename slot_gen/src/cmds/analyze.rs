/* Analyze command - layout report per struct */

use super::common::{CompiledSchema, load_and_validate};
use crate::codegen::shared::build_layout_ir;
use crate::codegen::template::tabulate;
use crate::layout::{Struct, WORD_BITS};
use anyhow::anyhow;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum IrOutputFormat {
  Json,
  Yaml,
}

/* Execute the analyze command */
pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  generation: Option<u32>,
  print_ir: bool,
  ir_format: IrOutputFormat,
  struct_filter: Option<String>,
) -> anyhow::Result<()> {
  println!("Slot Generator - Layout Analysis Tool");
  println!("=====================================\n");

  let compiled = load_and_validate(&files, &include_dirs, generation, true)?;

  let selected: Vec<Struct> = match struct_filter.as_deref() {
    Some(name) => {
      let s = compiled
        .structs
        .iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| anyhow!("struct '{}' not found in schema '{}'", name, compiled.package()))?;
      vec![s.clone()]
    }
    None => compiled.structs.clone(),
  };

  for s in &selected {
    print_layout_table(s);
  }

  if print_ir {
    print_layout_ir(&compiled, &selected, ir_format)?;
  }

  Ok(())
}

/* Rows of the layout table, header first */
pub fn layout_rows(s: &Struct) -> Vec<Vec<String>> {
  let mut rows = vec![
    ["field", "type", "bits", "before", "after", "focus mask"]
      .iter()
      .map(|h| h.to_string())
      .collect::<Vec<_>>(),
  ];
  for field in s.fields() {
    rows.push(vec![
      field.name().to_string(),
      field.ty().type_name().to_string(),
      field.bits().to_string(),
      field.before().to_string(),
      field.after().to_string(),
      format!("0x{:0>64}", field.focus_mask().to_str_radix(16)),
    ]);
  }
  rows
}

fn print_layout_table(s: &Struct) {
  let names = s.names();
  println!(
    "\n[~] {} ({}, {}, {}): {} of {} bits used",
    names.name,
    names.packed,
    names.unpacked,
    names.library,
    s.total_bits(),
    WORD_BITS
  );
  for line in tabulate(&layout_rows(s)) {
    println!("    {}", line);
  }
}

fn print_layout_ir(compiled: &CompiledSchema, structs: &[Struct], format: IrOutputFormat) -> anyhow::Result<()> {
  let layout_ir = build_layout_ir(structs, compiled.generation(), &compiled.accessor_options());

  match format {
    IrOutputFormat::Json => {
      println!("\n[~] Layout IR (JSON)");
      println!("====================");
      println!("{}", serde_json::to_string_pretty(&layout_ir)?);
    }
    IrOutputFormat::Yaml => {
      println!("\n[~] Layout IR (YAML)");
      println!("====================");
      println!("{}", serde_yml::to_string(&layout_ir)?);
    }
  }
  println!();

  Ok(())
}
