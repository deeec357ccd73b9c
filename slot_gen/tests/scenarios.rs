use num_bigint::{BigInt, BigUint};
use slot_gen::codegen::shared::{AccessorOptions, Interpreter, Value, build_struct_ir, run_suite, SuiteOptions};
use slot_gen::layout::{Conventions, SchemaError, Struct};
use slot_types::FieldDef;

fn offer_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("prev", 32, "uint"),
        FieldDef::new("next", 32, "uint"),
        FieldDef::new("logPrice", 24, "int"),
        FieldDef::new("gives", 96, "uint"),
    ]
}

fn offer(conventions: Conventions) -> Struct {
    Struct::from_fields("offer", offer_fields(), conventions).unwrap()
}

fn pack_args() -> Vec<Value> {
    vec![
        Value::uint(5u32),
        Value::uint(9u32),
        Value::int(-100),
        Value::uint(123_456_789u32),
    ]
}

#[test]
fn pack_then_unpack_is_identity_in_both_generations() {
    for conventions in [Conventions::GENERATION_1, Conventions::GENERATION_2] {
        let ir = build_struct_ir(&offer(conventions), &AccessorOptions::default());
        let interpreter = Interpreter::for_struct(&ir).unwrap();

        let packed = interpreter.call_one("OfferLib", "pack", pack_args()).unwrap();
        let unpacked = interpreter.call("OfferLib", "unpack", vec![packed]).unwrap();
        assert_eq!(unpacked, pack_args(), "generation {}", conventions.generation);
    }
}

#[test]
fn packed_word_has_fields_from_the_top() {
    let ir = build_struct_ir(&offer(Conventions::default()), &AccessorOptions::default());
    let interpreter = Interpreter::for_struct(&ir).unwrap();
    let packed = interpreter.call_one("OfferLib", "pack", pack_args()).unwrap();

    let log_price = BigUint::from((1u32 << 24) - 100);
    let expected = (BigUint::from(5u32) << 224u32)
        | (BigUint::from(9u32) << 192u32)
        | (log_price << 168u32)
        | (BigUint::from(123_456_789u32) << 72u32);
    assert_eq!(packed.word(), Some(&expected));
}

#[test]
fn setter_only_touches_its_field() {
    let ir = build_struct_ir(&offer(Conventions::default()), &AccessorOptions::default());
    let interpreter = Interpreter::for_struct(&ir).unwrap();

    let packed = interpreter.call_one("OfferLib", "pack", pack_args()).unwrap();
    let updated = interpreter
        .call_one("OfferLib", "set_next", vec![packed, Value::uint(42u32)])
        .unwrap();
    let unpacked = interpreter.call("OfferLib", "unpack", vec![updated]).unwrap();
    assert_eq!(
        unpacked,
        vec![
            Value::uint(5u32),
            Value::uint(42u32),
            Value::Int(BigInt::from(-100)),
            Value::uint(123_456_789u32),
        ]
    );
}

#[test]
fn record_round_trip_matches_tuple_round_trip() {
    let ir = build_struct_ir(&offer(Conventions::default()), &AccessorOptions::default());
    let interpreter = Interpreter::for_struct(&ir).unwrap();

    let packed = interpreter.call_one("OfferLib", "pack", pack_args()).unwrap();
    let record = interpreter.call_one("OfferLib", "to_struct", vec![packed.clone()]).unwrap();
    let repacked = interpreter.call_one("OfferLib", "t_of_struct", vec![record]).unwrap();
    assert_eq!(repacked, packed);

    let same = interpreter
        .call_one("OfferLib", "eq", vec![packed.clone(), repacked])
        .unwrap();
    assert_eq!(same, Value::Bool(true));
}

#[test]
fn check_reports_whether_a_value_fits() {
    let ir = build_struct_ir(&offer(Conventions::default()), &AccessorOptions::default());
    let interpreter = Interpreter::for_struct(&ir).unwrap();

    let fits = interpreter
        .call_one("OfferLib", "check_prev", vec![Value::uint(u32::MAX)])
        .unwrap();
    assert_eq!(fits, Value::Bool(true));
    let overflows = interpreter
        .call_one("OfferLib", "check_prev", vec![Value::uint(1u64 << 32)])
        .unwrap();
    assert_eq!(overflows, Value::Bool(false));
}

#[test]
fn oversized_struct_is_rejected() {
    let mut fields = offer_fields();
    fields.push(FieldDef::new("extra", 76, "uint"));
    let err = Struct::from_fields("offer", fields, Conventions::default()).unwrap_err();
    assert_eq!(
        err,
        SchemaError::TooWide {
            strukt: "offer".into(),
            total: 260,
            overflow: 4,
        }
    );
}

#[test]
fn narrow_address_is_rejected() {
    let err = Struct::from_fields(
        "config",
        vec![FieldDef::new("monitor", 128, "address")],
        Conventions::default(),
    )
    .unwrap_err();
    assert!(matches!(err.root(), SchemaError::AddressWidth { .. }));
}

#[test]
fn user_types_survive_the_round_trip_suite() {
    let s = Struct::from_fields(
        "local",
        vec![
            FieldDef::new("active", 1, "bool"),
            FieldDef::new("fee", 8, "uint"),
            FieldDef::new("density", 9, "Density").with_underlying("uint"),
            FieldDef::new("binPosInLeaf", 2, "uint"),
            FieldDef::new("root", 2, "Field").with_underlying("uint"),
            FieldDef::new("tickTreeIndex", 21, "Tick").with_underlying("int"),
            FieldDef::new("last", 32, "uint"),
            FieldDef::new("monitor", 160, "address"),
        ],
        Conventions::default(),
    )
    .unwrap();
    let ir = build_struct_ir(&s, &AccessorOptions::default());
    let report = run_suite(&ir, &SuiteOptions { runs: 32, seed: 7 }).unwrap();
    assert_eq!(report.struct_name, "local");
    assert!(report.total_cases() > 0);
}
