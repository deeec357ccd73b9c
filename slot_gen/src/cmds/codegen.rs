/* Codegen command - generate Solidity libraries and tests from a schema */

use super::common::load_and_validate;
use crate::codegen::shared::build_layout_ir;
use crate::codegen::solidity::{SolidityCodeGenerator, SolidityGeneratorOptions};
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  output_dir: PathBuf,
  generation: Option<u32>,
  skip_tests: bool,
  verbose: bool,
) -> anyhow::Result<()> {
  if verbose {
    println!("Slot Generator - Code Generation Tool");
    println!("=====================================\n");
    println!("[~] Configuration:");
    println!("  Output directory: {}", output_dir.display());
    println!("  Input files: {}", files.len());
    for file in &files {
      println!("    - {}", file.display());
    }
    println!();
  }

  let compiled = load_and_validate(&files, &include_dirs, generation, verbose)?;
  let layout = build_layout_ir(&compiled.structs, compiled.generation(), &compiled.accessor_options());

  let mut options = SolidityGeneratorOptions::from_schema(compiled.package(), &compiled.schema.metadata.options);
  options.emit_tests = !skip_tests;

  /* Render everything before writing anything */
  let generated = SolidityCodeGenerator::new(options)
    .emit_code(&layout)
    .context("failed to render Solidity sources")?;

  for file in &generated {
    let path = output_dir.join(&file.path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, &file.contents)
      .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), kind = ?file.kind, "wrote file");
    if verbose {
      println!("[~] Wrote {}", path.display());
    }
  }

  println!(
    "[✓] Generated {} file(s) for {} struct(s) in {}",
    generated.len(),
    compiled.structs.len(),
    output_dir.display()
  );

  Ok(())
}
