/* Verify command - run every struct's round-trip tests in the interpreter */

use super::common::load_and_validate;
use crate::codegen::shared::{SuiteOptions, build_struct_ir, run_suite};
use std::path::PathBuf;

pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  generation: Option<u32>,
  runs: usize,
  seed: u64,
  verbose: bool,
) -> anyhow::Result<()> {
  let compiled = load_and_validate(&files, &include_dirs, generation, verbose)?;
  let accessor_options = compiled.accessor_options();
  let options = SuiteOptions { runs, seed };

  println!(
    "[~] Running round-trip tests ({} runs per test, seed {})",
    runs, seed
  );

  let mut total = 0;
  for s in &compiled.structs {
    let ir = build_struct_ir(s, &accessor_options);
    let report = run_suite(&ir, &options)?;
    if verbose {
      for (test, cases) in &report.tests {
        println!("    {}.{}: {} case(s)", ir.tests.name, test, cases);
      }
    }
    println!("[✓] {}: {} test(s), {} case(s)", report.struct_name, report.tests.len(), report.total_cases());
    total += report.total_cases();
  }

  println!("[✓] All {} struct(s) passed ({} cases)", compiled.structs.len(), total);
  Ok(())
}
