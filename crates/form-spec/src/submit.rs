use thiserror::Error;
use tracing::info;

use crate::spec::form::FormSpec;
use crate::values::{FormValues, Submission};

/// Failure reported by a submit handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submit handler failed: {message}")]
pub struct SubmitError {
    pub message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Collaborator invoked with the final values of a valid form.
pub trait SubmitHandler {
    fn on_submit(&mut self, submission: &Submission) -> Result<(), SubmitError>;
}

impl<F> SubmitHandler for F
where
    F: FnMut(&Submission) -> Result<(), SubmitError>,
{
    fn on_submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
        self(submission)
    }
}

/// Default handler: records the submission as a log event and nothing else.
#[derive(Debug, Clone)]
pub struct LogSubmitHandler {
    spec: FormSpec,
    submitted: usize,
}

impl LogSubmitHandler {
    pub fn for_spec(spec: &FormSpec) -> Self {
        Self {
            spec: spec.clone(),
            submitted: 0,
        }
    }

    /// Number of submissions logged so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    fn describe(&self, values: &FormValues) -> String {
        crate::values::redact(values, &self.spec).to_value().to_string()
    }
}

impl SubmitHandler for LogSubmitHandler {
    fn on_submit(&mut self, submission: &Submission) -> Result<(), SubmitError> {
        self.submitted += 1;
        info!(
            form_id = %submission.form_id,
            version = %submission.spec_version,
            values = %self.describe(&submission.values),
            "form submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_handlers() {
        let spec = FormSpec::registration();
        let mut seen = Vec::new();
        let mut handler = |submission: &Submission| {
            seen.push(submission.values.value("username").to_string());
            Ok::<(), SubmitError>(())
        };
        let submission = Submission::new(
            &spec,
            [("username", "alice")].into_iter().collect(),
        );
        handler.on_submit(&submission).expect("submit");
        assert_eq!(seen, vec!["alice"]);
    }

    #[test]
    fn log_handler_masks_secret_fields() {
        let spec = FormSpec::registration();
        let handler = LogSubmitHandler::for_spec(&spec);
        let values: FormValues = [("username", "alice"), ("password", "longenough")]
            .into_iter()
            .collect();
        let described = handler.describe(&values);
        assert!(described.contains("alice"));
        assert!(!described.contains("longenough"));
    }
}
