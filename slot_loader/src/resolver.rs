use indexmap::IndexMap;
use slot_types::{FieldEntry, SharedFieldDef, StructDecl, StructDef};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LoadError, LoadResult};
use crate::file::SchemaFile;

/* Import resolver for loading and merging imported schema files */
pub struct ImportResolver {
    /* Track loaded files to cut import cycles */
    loaded_files: HashSet<PathBuf>,

    /* Include directories for searching imports */
    include_dirs: Vec<PathBuf>,

    /* All loaded schema files, imports before importers */
    all_files: Vec<SchemaFile>,

    /* Shared field shapes with the file that declared them */
    shared_fields: IndexMap<String, (SharedFieldDef, PathBuf)>,

    /* Struct declarations with the file that declared them */
    structs: IndexMap<String, (StructDef, PathBuf)>,
}

impl ImportResolver {
    /* Create a new import resolver with the given include directories */
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashSet::new(),
            include_dirs,
            all_files: Vec::new(),
            shared_fields: IndexMap::new(),
            structs: IndexMap::new(),
        }
    }

    /* Resolve an import path relative to a base file or include directories */
    fn resolve_import_path(&self, import_path: &str, base_file: &Path) -> LoadResult<PathBuf> {
        let candidates = base_file
            .parent()
            .map(|parent| parent.join(import_path))
            .into_iter()
            .chain(self.include_dirs.iter().map(|dir| dir.join(import_path)));

        for candidate in candidates {
            if candidate.exists() {
                return candidate.canonicalize().map_err(|source| LoadError::Io {
                    path: candidate.clone(),
                    source,
                });
            }
        }

        Err(LoadError::ImportNotFound {
            import: import_path.to_string(),
            from: base_file.to_path_buf(),
        })
    }

    /* Load a schema file and recursively load its imports */
    pub fn load_file_with_imports(&mut self, file_path: &Path, verbose: bool) -> LoadResult<()> {
        let canonical_path = file_path.canonicalize().map_err(|source| LoadError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;

        if self.loaded_files.contains(&canonical_path) {
            if verbose {
                println!("    [~] Skipping already loaded file: {}", file_path.display());
            }
            return Ok(());
        }

        /* Mark as loaded before processing imports so cycles terminate */
        self.loaded_files.insert(canonical_path.clone());

        if verbose {
            println!("[~] Loading schema file: {}", file_path.display());
        }

        let contents = std::fs::read_to_string(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let schema_file: SchemaFile =
            serde_yml::from_str(&contents).map_err(|source| LoadError::Parse {
                path: file_path.to_path_buf(),
                source,
            })?;

        debug!(
            file = %file_path.display(),
            package = schema_file.package(),
            structs = schema_file.structs.len(),
            imports = schema_file.imports().len(),
            "parsed schema file"
        );

        for import in schema_file.imports().to_vec() {
            if verbose {
                println!("    [~] Resolving path import: {}", import.path);
            }
            let import_path = self.resolve_import_path(&import.path, file_path)?;
            self.load_file_with_imports(&import_path, verbose)?;
        }

        self.register(&schema_file, &canonical_path)?;
        self.all_files.push(schema_file);

        Ok(())
    }

    /* Add a file's shared fields and structs to the global namespace */
    fn register(&mut self, file: &SchemaFile, path: &Path) -> LoadResult<()> {
        for (name, shared) in &file.fields {
            if let Some((_, first)) = self.shared_fields.get(name) {
                return Err(LoadError::DuplicateSharedField {
                    name: name.clone(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            self.shared_fields
                .insert(name.clone(), (shared.clone(), path.to_path_buf()));
        }

        for (name, def) in &file.structs {
            if let Some((_, first)) = self.structs.get(name) {
                return Err(LoadError::DuplicateStruct {
                    name: name.clone(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            self.structs
                .insert(name.clone(), (def.clone(), path.to_path_buf()));
        }

        Ok(())
    }

    /* Expand every struct's shared field references, in load order */
    pub fn resolve_structs(&self) -> LoadResult<Vec<StructDecl>> {
        self.structs
            .iter()
            .map(|(name, (def, _))| self.resolve_struct(name, def))
            .collect()
    }

    fn resolve_struct(&self, name: &str, def: &StructDef) -> LoadResult<StructDecl> {
        let fields = def
            .fields
            .iter()
            .map(|entry| match entry {
                FieldEntry::Def(field) => Ok(field.clone()),
                FieldEntry::Ref(field_ref) => self
                    .shared_fields
                    .get(&field_ref.target)
                    .map(|(shared, _)| shared.instantiate(field_ref.field_name()))
                    .ok_or_else(|| LoadError::UnknownFieldRef {
                        strukt: name.to_string(),
                        target: field_ref.target.clone(),
                    }),
            })
            .collect::<LoadResult<Vec<_>>>()?;

        Ok(StructDecl {
            name: name.to_string(),
            fields,
            additional_definitions: def.additional_definitions.clone(),
            comment: def.comment.clone(),
        })
    }

    /* Get all loaded schema files */
    pub fn get_all_files(&self) -> &[SchemaFile] {
        &self.all_files
    }

    /* Get the number of loaded files */
    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }

    /* Get the declared struct names in load order */
    pub fn struct_names(&self) -> Vec<&str> {
        self.structs.keys().map(String::as_str).collect()
    }
}
