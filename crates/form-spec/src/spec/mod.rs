pub mod field;
pub mod form;

pub use field::{FieldKind, FieldSpec, Rule};
pub use form::{FormPresentation, FormSpec, SpecError};
