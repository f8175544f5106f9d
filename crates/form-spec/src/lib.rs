#![allow(missing_docs)]

pub mod meta;
pub mod render;
pub mod schema;
pub mod spec;
pub mod state;
pub mod submit;
pub mod template;
pub mod validate;
pub mod values;

pub use meta::{ERROR_SEPARATOR, FieldMeta};
pub use render::{
    ActionKind, ActionVariant, RenderAction, RenderField, RenderPayload, RenderStatus,
    build_render_payload, render_card, render_json_ui, render_text,
};
pub use schema::{spec_schema, values_schema};
pub use spec::{FieldKind, FieldSpec, FormPresentation, FormSpec, Rule, SpecError};
pub use state::{FormCommand, FormError, FormEvent, FormState, ListenerId, SubmitOutcome};
pub use submit::{LogSubmitHandler, SubmitError, SubmitHandler};
pub use validate::{ValidationError, ValidationResult, validate, validate_field};
pub use values::{FormValues, RegistrationValues, Submission};
