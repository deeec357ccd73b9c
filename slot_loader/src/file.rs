use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use slot_types::{SharedFieldDef, StructDef};

/* ============================================================================
   Schema Metadata
   ============================================================================ */

/* Path import, resolved relative to the importing file first and then
   against each include directory */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImportSource {
    pub path: String,
}

/* Output file name patterns; `{Name}` and `{name}` are substituted */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Filenames {
    pub src: String,
    pub test: String,
    pub index: String,
    /* Debug library with `toString` overloads for every struct */
    #[serde(rename = "to-string")]
    pub to_string_lib: String,
    /* Prefix the test files use to import the library files */
    pub src_import_prefix: String,
}

impl Default for Filenames {
    fn default() -> Self {
        Self {
            src: "{Name}.post.sol".to_string(),
            test: "{Name}Test.post.sol".to_string(),
            index: "Structs.post.sol".to_string(),
            to_string_lib: "StructsToString.post.sol".to_string(),
            src_import_prefix: "../src/".to_string(),
        }
    }
}

impl Filenames {
    /* Substitute the struct name into a pattern */
    pub fn expand(pattern: &str, name: &str) -> String {
        pattern
            .replace("{Name}", &capitalize(name))
            .replace("{name}", name)
    }

    pub fn src_for(&self, name: &str) -> String {
        Self::expand(&self.src, name)
    }

    pub fn test_for(&self, name: &str) -> String {
        Self::expand(&self.test, name)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/* Code generation options carried by the root schema file */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchemaOptions {
    pub pragma: String,
    pub license: String,
    pub test_license: String,
    /* Leading segment of the `<prefix>/<field>/<bits>bits` size error strings */
    pub size_error_prefix: String,
    pub test_import: String,
    /* Cheatcode interface imported by the debug library */
    pub vm_import: String,
    pub filenames: Filenames,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            pragma: "^0.8.10".to_string(),
            license: "UNLICENSED".to_string(),
            test_license: "UNLICENSED".to_string(),
            size_error_prefix: "slot/config".to_string(),
            test_import: "forge-std/Test.sol".to_string(),
            vm_import: "forge-std/Vm.sol".to_string(),
            filenames: Filenames::default(),
        }
    }
}

/* The `schema:` section of a schema file */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaMetadata {
    pub package: String,
    /* Schema generation (1 or 2); absent means the compiler default */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportSource>,
    #[serde(default)]
    pub options: SchemaOptions,
}

/* ============================================================================
   Schema File
   ============================================================================ */

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    pub schema: SchemaMetadata,
    /* Shared field shapes, referenced from structs with `ref` */
    #[serde(default)]
    pub fields: IndexMap<String, SharedFieldDef>,
    /* Struct declarations in layout-compiler order */
    #[serde(default)]
    pub structs: IndexMap<String, StructDef>,
}

impl SchemaFile {
    pub fn package(&self) -> &str {
        &self.schema.package
    }

    pub fn imports(&self) -> &[ImportSource] {
        &self.schema.imports
    }

    pub fn generation(&self) -> Option<u32> {
        self.schema.generation
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.schema.options
    }
}
