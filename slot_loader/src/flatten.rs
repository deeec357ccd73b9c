use crate::error::{LoadError, LoadResult};
use crate::file::{SchemaFile, SchemaMetadata};
use crate::resolver::ImportResolver;
use indexmap::IndexMap;
use slot_types::{FieldEntry, StructDecl, StructDef};
use std::path::{Path, PathBuf};
use tracing::info;

/// A fully resolved schema: the root file's metadata plus every struct of
/// every loaded file, imports first, with shared field references expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSchema {
    pub metadata: SchemaMetadata,
    pub structs: Vec<StructDecl>,
    pub file_count: usize,
}

impl LoadedSchema {
    pub fn find(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// A self-contained schema file: no imports, no shared fields, every
    /// field written out in full.
    pub fn to_schema_file(&self) -> SchemaFile {
        let structs: IndexMap<String, StructDef> = self
            .structs
            .iter()
            .map(|decl| {
                let def = StructDef {
                    fields: decl.fields.iter().cloned().map(FieldEntry::Def).collect(),
                    additional_definitions: decl.additional_definitions.clone(),
                    comment: decl.comment.clone(),
                };
                (decl.name.clone(), def)
            })
            .collect();

        SchemaFile {
            schema: self.metadata.clone(),
            fields: IndexMap::new(),
            structs,
        }
    }
}

/// Load the given schema files and their imports.
/// The first file is the root: its `schema` section governs the run.
pub fn load_schema(files: &[PathBuf], include_dirs: &[PathBuf]) -> LoadResult<LoadedSchema> {
    load_schema_with_options(files, include_dirs, false)
}

/// Load schema files with verbose output option.
pub fn load_schema_with_options(
    files: &[PathBuf],
    include_dirs: &[PathBuf],
    verbose: bool,
) -> LoadResult<LoadedSchema> {
    let (root_path, rest) = files.split_first().ok_or(LoadError::NoFiles)?;

    let mut resolver = ImportResolver::new(include_dirs.to_vec());
    resolver.load_file_with_imports(root_path, verbose)?;

    /* The root file is pushed after its imports */
    let mut metadata = match resolver.get_all_files().last() {
        Some(root) => root.schema.clone(),
        None => return Err(LoadError::NoFiles),
    };
    metadata.imports.clear();

    for path in rest {
        resolver.load_file_with_imports(path, verbose)?;
    }

    let structs = resolver.resolve_structs()?;
    let file_count = resolver.loaded_file_count();

    info!(
        package = %metadata.package,
        files = file_count,
        structs = structs.len(),
        "resolved schema"
    );
    if verbose {
        println!(
            "[~] Resolved {} files into {} structs",
            file_count,
            structs.len()
        );
    }

    Ok(LoadedSchema {
        metadata,
        structs,
        file_count,
    })
}

/// Load a root file and fold it and its imports into one schema file.
pub fn flatten_with_options(
    file: &Path,
    include_dirs: &[PathBuf],
    verbose: bool,
) -> LoadResult<SchemaFile> {
    let schema = load_schema_with_options(&[file.to_path_buf()], include_dirs, verbose)?;
    Ok(schema.to_schema_file())
}

/// Convenience wrapper for a single root file.
pub fn load_single(file: &Path, include_dirs: &[PathBuf]) -> LoadResult<LoadedSchema> {
    load_schema(&[file.to_path_buf()], include_dirs)
}
