use slot_loader::{flatten_with_options, load_schema, load_single, LoadError, SchemaFile};
use slot_types::{FieldDef, FieldEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/* Write a schema file into the temp dir and return its path */
fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

const COMMON: &str = r#"
schema:
  package: demo.common
fields:
  id: { bits: 32, type: uint }
structs:
  header:
    fields:
      - { name: version, bits: 8, type: uint }
"#;

const ROOT: &str = r#"
schema:
  package: demo.root
  generation: 2
  imports:
    - path: common.yaml
  options:
    size-error-prefix: demo/config
structs:
  offer:
    comment: linked list node
    fields:
      - { ref: id, name: prev }
      - { ref: id, name: next }
      - { name: tick, bits: 21, type: Tick, underlying-type: int }
    additional-definitions: |
      import "./Tick.sol";
"#;

#[test]
fn imports_are_loaded_before_the_root() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.yaml", COMMON);
    let root = write(dir.path(), "root.yaml", ROOT);

    let schema = load_single(&root, &[]).expect("load should succeed");

    assert_eq!(schema.file_count, 2);
    assert_eq!(schema.metadata.package, "demo.root");
    assert_eq!(schema.metadata.generation, Some(2));
    assert!(schema.metadata.imports.is_empty());
    assert_eq!(schema.metadata.options.size_error_prefix, "demo/config");

    let names: Vec<&str> = schema.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["header", "offer"]);
}

#[test]
fn shared_field_refs_expand_in_place() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.yaml", COMMON);
    let root = write(dir.path(), "root.yaml", ROOT);

    let schema = load_single(&root, &[]).unwrap();
    let offer = schema.find("offer").unwrap();

    assert_eq!(
        offer.fields,
        vec![
            FieldDef::new("prev", 32, "uint"),
            FieldDef::new("next", 32, "uint"),
            FieldDef::new("tick", 21, "Tick").with_underlying("int"),
        ]
    );
    assert_eq!(
        offer.additional_definitions.as_deref(),
        Some("import \"./Tick.sol\";\n")
    );
}

#[test]
fn imports_fall_back_to_include_dirs() {
    let dir = TempDir::new().unwrap();
    let lib = dir.path().join("lib");
    write(&lib, "common.yaml", COMMON);
    let root = write(dir.path(), "root.yaml", ROOT);

    let schema = load_single(&root, &[lib]).unwrap();
    assert_eq!(schema.structs.len(), 2);
}

#[test]
fn missing_import_is_reported() {
    let dir = TempDir::new().unwrap();
    let root = write(dir.path(), "root.yaml", ROOT);

    match load_single(&root, &[]) {
        Err(LoadError::ImportNotFound { import, .. }) => assert_eq!(import, "common.yaml"),
        other => panic!("expected ImportNotFound, got {:?}", other),
    }
}

#[test]
fn import_cycles_terminate() {
    let dir = TempDir::new().unwrap();
    let a = write(
        dir.path(),
        "a.yaml",
        "schema:\n  package: a\n  imports:\n    - path: b.yaml\nstructs:\n  alpha:\n    fields:\n      - { name: x, bits: 8, type: uint }\n",
    );
    write(
        dir.path(),
        "b.yaml",
        "schema:\n  package: b\n  imports:\n    - path: a.yaml\nstructs:\n  beta:\n    fields:\n      - { name: y, bits: 8, type: uint }\n",
    );

    let schema = load_single(&a, &[]).unwrap();
    assert_eq!(schema.file_count, 2);
    assert_eq!(schema.metadata.package, "a");
    let names: Vec<&str> = schema.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["beta", "alpha"]);
}

#[test]
fn duplicate_structs_across_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let one = write(
        dir.path(),
        "one.yaml",
        "schema:\n  package: one\nstructs:\n  offer:\n    fields:\n      - { name: x, bits: 8, type: uint }\n",
    );
    let two = write(
        dir.path(),
        "two.yaml",
        "schema:\n  package: two\nstructs:\n  offer:\n    fields:\n      - { name: y, bits: 8, type: uint }\n",
    );

    match load_schema(&[one, two], &[]) {
        Err(LoadError::DuplicateStruct { name, .. }) => assert_eq!(name, "offer"),
        other => panic!("expected DuplicateStruct, got {:?}", other),
    }
}

#[test]
fn unknown_ref_is_rejected() {
    let dir = TempDir::new().unwrap();
    let root = write(
        dir.path(),
        "root.yaml",
        "schema:\n  package: demo\nstructs:\n  offer:\n    fields:\n      - { ref: gives }\n",
    );

    match load_single(&root, &[]) {
        Err(LoadError::UnknownFieldRef { strukt, target }) => {
            assert_eq!(strukt, "offer");
            assert_eq!(target, "gives");
        }
        other => panic!("expected UnknownFieldRef, got {:?}", other),
    }
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let root = write(dir.path(), "root.yaml", "schema: [not, a, map]\n");

    assert!(matches!(
        load_single(&root, &[]),
        Err(LoadError::Parse { .. })
    ));
}

#[test]
fn empty_file_list_is_rejected() {
    assert!(matches!(load_schema(&[], &[]), Err(LoadError::NoFiles)));
}

#[test]
fn flattened_schema_reloads_to_the_same_structs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.yaml", COMMON);
    let root = write(dir.path(), "root.yaml", ROOT);

    let flat = flatten_with_options(&root, &[], false).unwrap();
    assert!(flat.fields.is_empty());
    assert!(flat.schema.imports.is_empty());
    assert!(flat.structs["offer"]
        .fields
        .iter()
        .all(|entry| matches!(entry, FieldEntry::Def(_))));

    let yaml = serde_yml::to_string(&flat).unwrap();
    let reparsed: SchemaFile = serde_yml::from_str(&yaml).unwrap();
    assert_eq!(reparsed, flat);

    let flat_path = write(dir.path(), "flat/flat.yaml", &yaml);
    let reloaded = load_single(&flat_path, &[]).unwrap();
    let original = load_single(&root, &[]).unwrap();
    assert_eq!(reloaded.structs, original.structs);
    assert_eq!(reloaded.file_count, 1);

    assert_eq!(flat.structs["offer"].comment.as_deref(), Some("linked list node"));
    let comments: Vec<Option<&str>> = reloaded.structs.iter().map(|s| s.comment.as_deref()).collect();
    assert_eq!(comments, vec![None, Some("linked list node")]);
}
