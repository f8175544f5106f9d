use serde::{Deserialize, Serialize};

/// Separator used when several messages are shown as one hint.
///
/// A bare `,` would glue messages together in the text and card renders,
/// so a space follows the comma.
pub const ERROR_SEPARATOR: &str = ", ";

/// Interaction and validation state of one field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Set after the first change or blur.
    pub touched: bool,
    /// Value differs from the field's initial value.
    pub dirty: bool,
    pub errors: Vec<String>,
}

impl FieldMeta {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Message shown to the user: only for touched fields with errors.
    pub fn display_error(&self) -> Option<String> {
        if self.touched && self.has_errors() {
            Some(self.errors.join(ERROR_SEPARATOR))
        } else {
            None
        }
    }
}
