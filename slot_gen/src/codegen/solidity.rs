use crate::codegen::shared::ir::{LayoutIr, StructIr};
use crate::codegen::solidity_gen::{render_index, render_library, render_tests, render_to_string};
use crate::codegen::template::TemplateError;
use slot_loader::{Filenames, SchemaOptions};
use std::path::PathBuf;
use tracing::debug;

pub struct SolidityCodeGenerator {
  options: SolidityGeneratorOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityGeneratorOptions {
  pub package: String,
  pub pragma: String,
  pub license: String,
  pub test_license: String,
  pub test_import: String,
  pub vm_import: String,
  pub filenames: Filenames,
  pub emit_tests: bool,
  pub emit_index: bool,
  pub emit_to_string: bool,
}

impl Default for SolidityGeneratorOptions {
  fn default() -> Self {
    Self::from_schema("slot", &SchemaOptions::default())
  }
}

impl SolidityGeneratorOptions {
  pub fn from_schema(package: &str, options: &SchemaOptions) -> Self {
    Self {
      package: package.to_string(),
      pragma: options.pragma.clone(),
      license: options.license.clone(),
      test_license: options.test_license.clone(),
      test_import: options.test_import.clone(),
      vm_import: options.vm_import.clone(),
      filenames: options.filenames.clone(),
      emit_tests: true,
      emit_index: true,
      emit_to_string: true,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GeneratedKind {
  Library,
  Test,
  Index,
  ToString,
}

/* One output file, path relative to the output directory */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  pub path: PathBuf,
  pub contents: String,
  pub kind: GeneratedKind,
}

impl SolidityCodeGenerator {
  pub fn new(options: SolidityGeneratorOptions) -> Self {
    Self { options }
  }

  /* Render every file in memory; nothing touches the disk */
  pub fn emit_code(&self, layout: &LayoutIr) -> Result<Vec<GeneratedFile>, TemplateError> {
    let filenames = &self.options.filenames;
    let mut files = Vec::new();
    let mut index_entries: Vec<(&StructIr, String)> = Vec::with_capacity(layout.structs.len());

    for ir in &layout.structs {
      let src_file = filenames.src_for(&ir.name);
      debug!(strukt = %ir.name, file = %src_file, "rendering library");

      files.push(GeneratedFile {
        path: PathBuf::from("src").join(&src_file),
        contents: render_library(ir, &self.options)?,
        kind: GeneratedKind::Library,
      });

      if self.options.emit_tests {
        let src_import = format!("{}{}", filenames.src_import_prefix, src_file);
        files.push(GeneratedFile {
          path: PathBuf::from("test").join(filenames.test_for(&ir.name)),
          contents: render_tests(ir, &src_import, &self.options)?,
          kind: GeneratedKind::Test,
        });
      }

      index_entries.push((ir, src_file));
    }

    if self.options.emit_index && !index_entries.is_empty() {
      files.push(GeneratedFile {
        path: PathBuf::from("src").join(&filenames.index),
        contents: render_index(&index_entries, &self.options)?,
        kind: GeneratedKind::Index,
      });
    }

    if self.options.emit_to_string && !index_entries.is_empty() {
      files.push(GeneratedFile {
        path: PathBuf::from("src").join(&filenames.to_string_lib),
        contents: render_to_string(&index_entries, &self.options)?,
        kind: GeneratedKind::ToString,
      });
    }

    Ok(files)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codegen::shared::{AccessorOptions, build_layout_ir};
  use crate::layout::{Conventions, Struct};
  use slot_types::{FieldDef, StructDecl};

  fn offer_ir() -> LayoutIr {
    let decl = StructDecl::new(
      "offer",
      vec![
        FieldDef::new("prev", 32, "uint"),
        FieldDef::new("next", 32, "uint"),
        FieldDef::new("tick", 24, "int"),
        FieldDef::new("gives", 96, "uint"),
      ],
    );
    let s = Struct::new(&decl, Conventions::default()).unwrap();
    build_layout_ir(&[s], 2, &AccessorOptions::default())
  }

  #[test]
  fn emits_library_test_index_and_debug_strings() {
    let files = SolidityCodeGenerator::new(SolidityGeneratorOptions::default())
      .emit_code(&offer_ir())
      .unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
    assert_eq!(
      paths,
      vec![
        "src/Offer.post.sol",
        "test/OfferTest.post.sol",
        "src/Structs.post.sol",
        "src/StructsToString.post.sol"
      ]
    );
    assert!(files[0].contents.contains("type Offer is uint;"));
    assert!(files[1].contents.contains("from \"../src/Offer.post.sol\";"));
    assert!(files[2].contents.contains("import {Offer, OfferUnpacked, OfferLib} from \"./Offer.post.sol\";"));
    assert_eq!(files[3].kind, GeneratedKind::ToString);
    assert!(files[3].contents.contains("function toString(Offer __packed) pure returns (string memory) {"));
  }

  #[test]
  fn tests_and_index_can_be_skipped() {
    let options = SolidityGeneratorOptions {
      emit_tests: false,
      emit_index: false,
      emit_to_string: false,
      ..SolidityGeneratorOptions::default()
    };
    let files = SolidityCodeGenerator::new(options).emit_code(&offer_ir()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].kind, GeneratedKind::Library);
  }
}
