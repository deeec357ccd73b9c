use slot_gen::cmds;
use std::path::PathBuf;

fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemas")
}

#[test]
fn codegen_writes_every_file_of_the_sample_schema() {
    let out = tempfile::tempdir().unwrap();
    cmds::codegen::run(
        vec![schema_dir().join("mangrove.yaml")],
        vec![],
        out.path().to_path_buf(),
        None,
        false,
        false,
    )
    .unwrap();

    for name in ["Offer", "OfferDetail", "Global", "Local"] {
        assert!(out.path().join("src").join(format!("{name}.post.sol")).is_file(), "{name}");
        assert!(out.path().join("test").join(format!("{name}Test.post.sol")).is_file(), "{name}");
    }

    let index = std::fs::read_to_string(out.path().join("src/MgvStructs.post.sol")).unwrap();
    assert!(index.starts_with("// SPDX-License-Identifier: Unlicense\n"));
    assert!(index.contains("import {OfferDetail, OfferDetailUnpacked, OfferDetailLib} from \"./OfferDetail.post.sol\";"));

    let local = std::fs::read_to_string(out.path().join("src/Local.post.sol")).unwrap();
    assert!(local.contains("import {Density, DensityLib} from \"@mgv/lib/core/DensityLib.sol\";"));
    assert!(local.contains("\"mgv/config/last/32bits\""));

    let offer_test = std::fs::read_to_string(out.path().join("test/OfferTest.post.sol")).unwrap();
    assert!(offer_test.starts_with("// SPDX-License-Identifier: AGPL-3.0\n"));

    let debug = std::fs::read_to_string(out.path().join("src/MgvStructsToString.post.sol")).unwrap();
    assert!(debug.contains("import {Local, LocalUnpacked, Density, Field} from \"./Local.post.sol\";"));
    assert!(debug.contains("\"density: \", vm.toString(Density.unwrap(__unpacked.density)), \", \","));
}

#[test]
fn codegen_writes_nothing_when_a_struct_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("bad.yaml");
    std::fs::write(
        &schema,
        "schema:\n  package: bad\nstructs:\n  ok:\n    fields:\n      - { name: a, bits: 8, type: uint }\n  wide:\n    fields:\n      - { name: a, bits: 200, type: uint }\n      - { name: b, bits: 60, type: uint }\n",
    )
    .unwrap();
    let out = dir.path().join("out");

    let err = cmds::codegen::run(vec![schema], vec![], out.clone(), None, false, false).unwrap_err();
    assert!(format!("{err:#}").contains("wide"));
    assert!(!out.exists());
}

#[test]
fn generation_override_applies_generation_one_rules() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("flags.yaml");
    std::fs::write(
        &schema,
        "schema:\n  package: flags\nstructs:\n  flags:\n    fields:\n      - { name: on, bits: 1, type: bool }\n",
    )
    .unwrap();

    assert!(cmds::verify::run(vec![schema.clone()], vec![], None, 4, 0, false).is_ok());
    assert!(cmds::verify::run(vec![schema], vec![], Some(1), 4, 0, false).is_err());
}

#[test]
fn verify_passes_on_the_sample_schema() {
    cmds::verify::run(vec![schema_dir().join("mangrove.yaml")], vec![], None, 16, 3, false).unwrap();
}

#[test]
fn analyze_rejects_unknown_struct_filter() {
    let err = cmds::analyze::run(
        vec![schema_dir().join("mangrove.yaml")],
        vec![],
        None,
        false,
        cmds::analyze::IrOutputFormat::Json,
        Some("nope".to_string()),
    )
    .unwrap_err();
    assert!(err.to_string().contains("nope"));
}

#[test]
fn flatten_writes_a_self_contained_schema() {
    let out = tempfile::tempdir().unwrap();
    let flat = out.path().join("flat.yaml");
    cmds::flatten::run(schema_dir().join("mangrove.yaml"), vec![], flat.clone(), None, false).unwrap();

    let text = std::fs::read_to_string(&flat).unwrap();
    assert!(!text.contains("ref:"));
    assert!(text.contains("comment: doubly linked list pointers plus price and volume"));

    let reloaded = slot_loader::load_single(&flat, &[]).unwrap();
    let original = slot_loader::load_single(&schema_dir().join("mangrove.yaml"), &[]).unwrap();
    assert_eq!(reloaded.file_count, 1);
    assert_eq!(reloaded.metadata.generation, Some(2));
    assert_eq!(reloaded.structs, original.structs);

    let regenerated = out.path().join("gen");
    cmds::codegen::run(vec![flat], vec![], regenerated.clone(), None, true, false).unwrap();
    assert!(regenerated.join("src/Local.post.sol").is_file());
}

#[test]
fn flatten_refuses_a_schema_that_does_not_compile() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("flags.yaml");
    std::fs::write(
        &schema,
        "schema:\n  package: flags\nstructs:\n  flags:\n    fields:\n      - { name: on, bits: 1, type: bool }\n",
    )
    .unwrap();
    let flat = dir.path().join("flat.yaml");

    assert!(cmds::flatten::run(schema.clone(), vec![], flat.clone(), Some(1), false).is_err());
    assert!(!flat.exists());

    cmds::flatten::run(schema, vec![], flat.clone(), None, false).unwrap();
    let reloaded = slot_loader::load_single(&flat, &[]).unwrap();
    assert_eq!(reloaded.metadata.generation, Some(2));
}
