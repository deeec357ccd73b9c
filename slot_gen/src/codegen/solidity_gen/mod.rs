pub mod expr;
pub mod index;
pub mod library;
pub mod test_suite;
pub mod to_string;

pub use index::render_index;
pub use library::render_library;
pub use test_suite::render_tests;
pub use to_string::render_to_string;
