pub mod accessors;
pub mod interpreter;
pub mod ir;
pub mod roundtrip;
pub mod suite;
pub mod value;

pub use accessors::AccessorOptions;
pub use interpreter::{EvalError, EvalResult, Interpreter};
pub use ir::{LayoutIr, StructIr};
pub use suite::{RoundTripFailure, SuiteError, SuiteOptions, SuiteReport, run_suite};
pub use value::Value;

use crate::layout::Struct;

use ir::FieldLayout;

/// Build the accessor library and the round-trip tests of one struct.
pub fn build_struct_ir(s: &Struct, options: &AccessorOptions) -> StructIr {
    StructIr {
        name: s.name().to_string(),
        packed: s.names().packed.clone(),
        record: accessors::record_def(s),
        layout: s
            .fields()
            .iter()
            .map(|f| FieldLayout {
                name: f.name().to_string(),
                ty: f.ir_type(),
                bits: f.bits(),
                before: f.before(),
                after: f.after(),
            })
            .collect(),
        library: accessors::build_library(s, options),
        tests: roundtrip::build_tests(s),
        additional_definitions: s.additional_definitions().map(str::to_string),
    }
}

/// Build the IR of every struct, in schema order.
pub fn build_layout_ir(structs: &[Struct], generation: u32, options: &AccessorOptions) -> LayoutIr {
    LayoutIr::new(
        generation,
        structs.iter().map(|s| build_struct_ir(s, options)).collect(),
    )
}
