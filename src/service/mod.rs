//! Student lifecycle rules and field validation, independent of transport.

mod lifecycle;
pub mod validation;
pub use lifecycle::StudentService;
pub use validation::{into_fields, validate};
