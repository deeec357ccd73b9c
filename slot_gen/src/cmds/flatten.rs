/* Flatten command - fold a schema and its imports into one self-contained file */

use super::common::load_and_validate;
use anyhow::{Context, bail};
use slot_loader::load_schema_with_options;
use std::path::PathBuf;
use tracing::info;

/* Execute the flatten command */
pub fn run(
  file: PathBuf,
  include_dirs: Vec<PathBuf>,
  output: PathBuf,
  generation: Option<u32>,
  verbose: bool,
) -> anyhow::Result<()> {
  if verbose {
    println!("[~] Flattening {}", file.display());
  }

  /* Only schemas that compile are flattened */
  let compiled = load_and_validate(std::slice::from_ref(&file), &include_dirs, generation, verbose)?;

  let mut flat = compiled.schema.to_schema_file();
  flat.schema.generation = Some(compiled.generation());

  let yaml = serde_yml::to_string(&flat).context("failed to serialize flattened schema")?;
  std::fs::write(&output, &yaml)
    .with_context(|| format!("failed to write {}", output.display()))?;

  let reloaded = load_schema_with_options(std::slice::from_ref(&output), &[], false)
    .with_context(|| format!("failed to reload {}", output.display()))?;
  if reloaded.structs != compiled.schema.structs {
    let _ = std::fs::remove_file(&output);
    bail!("flattened schema {} does not reproduce the input structs", output.display());
  }

  info!(path = %output.display(), structs = reloaded.structs.len(), "wrote flattened schema");
  println!(
    "[✓] Flattened {} file(s) into {} ({} struct(s), generation {})",
    compiled.schema.file_count,
    output.display(),
    reloaded.structs.len(),
    compiled.generation()
  );

  Ok(())
}
