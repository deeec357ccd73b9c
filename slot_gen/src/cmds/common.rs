/* Common utilities shared between the analyze, codegen and verify commands */

use crate::codegen::shared::AccessorOptions;
use crate::layout::{Conventions, DEFAULT_GENERATION, Struct};
use anyhow::Context;
use slot_loader::{LoadedSchema, load_schema_with_options};
use std::path::PathBuf;
use tracing::debug;

/* A loaded schema whose structs all passed validation */
pub struct CompiledSchema {
  pub schema: LoadedSchema,
  pub conventions: Conventions,
  pub structs: Vec<Struct>,
}

impl CompiledSchema {
  pub fn package(&self) -> &str {
    &self.schema.metadata.package
  }

  pub fn generation(&self) -> u32 {
    self.conventions.generation
  }

  pub fn accessor_options(&self) -> AccessorOptions {
    AccessorOptions {
      size_error_prefix: self.schema.metadata.options.size_error_prefix.clone(),
    }
  }
}

/* Command line generation wins over the schema's, which wins over the default */
pub fn choose_conventions(cli: Option<u32>, schema: Option<u32>) -> anyhow::Result<Conventions> {
  let generation = cli.or(schema).unwrap_or(DEFAULT_GENERATION);
  Ok(Conventions::for_generation(generation)?)
}

/* Load schema files with their imports and validate every struct */
pub fn load_and_validate(
  files: &[PathBuf],
  include_dirs: &[PathBuf],
  generation: Option<u32>,
  verbose: bool,
) -> anyhow::Result<CompiledSchema> {
  if verbose {
    println!("[~] Loading schema files and resolving imports...");
    if !include_dirs.is_empty() {
      println!("    Include directories:");
      for dir in include_dirs {
        println!("      - {}", dir.display());
      }
    }
  }

  let schema = load_schema_with_options(files, include_dirs, verbose)
    .context("failed to load schema")?;

  let conventions = choose_conventions(generation, schema.metadata.generation)?;
  if verbose {
    println!(
      "[~] Package '{}', generation {}",
      schema.metadata.package, conventions.generation
    );
  }

  let mut structs = Vec::with_capacity(schema.structs.len());
  for decl in &schema.structs {
    let s = Struct::new(decl, conventions)?;
    debug!(strukt = %s.name(), bits = s.total_bits(), "validated struct");
    if verbose {
      println!("  - {} ({} fields, {} bits)", s.name(), s.fields().len(), s.total_bits());
    }
    structs.push(s);
  }

  if verbose {
    println!("[✓] {} struct(s) validated", structs.len());
  }

  Ok(CompiledSchema {
    schema,
    conventions,
    structs,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn command_line_generation_wins() {
    assert_eq!(choose_conventions(Some(1), Some(2)).unwrap(), Conventions::GENERATION_1);
    assert_eq!(choose_conventions(None, Some(1)).unwrap(), Conventions::GENERATION_1);
    assert_eq!(choose_conventions(None, None).unwrap(), Conventions::default());
    assert!(choose_conventions(Some(7), None).is_err());
  }
}
