use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::meta::FieldMeta;
use crate::spec::form::{FormSpec, SpecError};
use crate::submit::{SubmitError, SubmitHandler};
use crate::validate::{ValidationResult, validate, validate_field};
use crate::values::{FormValues, Submission};

/// Failures of form operations. Field validation problems are not errors;
/// they live in [`FieldMeta::errors`].
#[derive(Debug, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Notification sent to listeners after each state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FormEvent {
    Changed { field: String },
    Blurred { field: String },
    Reset,
    SubmitRejected { invalid_fields: usize },
    Submitted,
}

/// Input accepted by [`FormState::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FormCommand {
    Change { field: String, value: String },
    Blur { field: String },
    Reset,
    Submit,
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler ran with this snapshot.
    Submitted(Submission),
    /// Validation failed; the handler was not called.
    Rejected(ValidationResult),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// Handle returned by [`FormState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&FormEvent, &FormState)>;

/// Values and per-field metadata of one live form instance.
pub struct FormState {
    spec: FormSpec,
    values: FormValues,
    meta: BTreeMap<String, FieldMeta>,
    submission_attempts: usize,
    submitted: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl FormState {
    pub fn new(spec: FormSpec) -> Result<Self, SpecError> {
        spec.check()?;
        let values = FormValues::initial(&spec);
        let meta = initial_meta(&spec);
        Ok(Self {
            spec,
            values,
            meta,
            submission_attempts: 0,
            submitted: false,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// State for the built-in registration form.
    pub fn registration() -> Result<Self, SpecError> {
        Self::new(FormSpec::registration())
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field)
    }

    pub fn meta(&self, field: &str) -> Option<&FieldMeta> {
        self.meta.get(field)
    }

    /// Error hint for `field` under the display policy.
    pub fn display_error(&self, field: &str) -> Option<String> {
        self.meta(field).and_then(FieldMeta::display_error)
    }

    /// Fresh whole-record validation of the current values.
    pub fn validation(&self) -> ValidationResult {
        validate(&self.spec, &self.values)
    }

    pub fn submission_attempts(&self) -> usize {
        self.submission_attempts
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Stores `value` and re-validates that field alone.
    pub fn handle_change(
        &mut self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let spec_field = self
            .spec
            .field(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))?;
        let value = value.into();

        let errors: Vec<String> = validate_field(spec_field, &value)
            .into_iter()
            .map(|error| error.message)
            .collect();
        let error_count = errors.len();
        let meta = self.meta.entry(field.to_string()).or_default();
        meta.touched = true;
        meta.dirty = value != spec_field.initial_value();
        meta.errors = errors;
        self.values.set(field, value);

        debug!(form_id = %self.spec.id, field, errors = error_count, "field changed");
        self.notify(FormEvent::Changed {
            field: field.to_string(),
        });
        Ok(())
    }

    pub fn handle_blur(&mut self, field: &str) -> Result<(), FormError> {
        let meta = self
            .meta
            .get_mut(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))?;
        meta.touched = true;

        debug!(form_id = %self.spec.id, field, "field blurred");
        self.notify(FormEvent::Blurred {
            field: field.to_string(),
        });
        Ok(())
    }

    /// Applies every known entry of `values` as a change, in field order.
    pub fn fill(&mut self, values: &FormValues) -> Result<(), FormError> {
        if let Some(unknown) = values.keys().find(|key| self.spec.field(key).is_none()) {
            return Err(FormError::UnknownField(unknown.to_string()));
        }
        let ids: Vec<String> = self.spec.field_ids().map(String::from).collect();
        for id in ids {
            if let Some(value) = values.get(&id) {
                self.handle_change(&id, value)?;
            }
        }
        Ok(())
    }

    /// Restores initial values and clears all field metadata.
    pub fn reset(&mut self) {
        self.values = FormValues::initial(&self.spec);
        self.meta = initial_meta(&self.spec);
        self.submission_attempts = 0;
        self.submitted = false;

        debug!(form_id = %self.spec.id, "form reset");
        self.notify(FormEvent::Reset);
    }

    /// Validates the whole record and hands it to `handler` when valid.
    ///
    /// Every field is marked touched so rejected submits surface all errors.
    pub fn submit<H>(&mut self, handler: &mut H) -> Result<SubmitOutcome, FormError>
    where
        H: SubmitHandler + ?Sized,
    {
        self.submission_attempts += 1;
        let result = validate(&self.spec, &self.values);

        let mut messages = result.messages_by_field();
        for field in &self.spec.fields {
            let meta = self.meta.entry(field.id.clone()).or_default();
            meta.touched = true;
            meta.errors = messages.remove(&field.id).unwrap_or_default();
        }

        if !result.valid {
            let invalid_fields = result.invalid_field_count();
            debug!(form_id = %self.spec.id, invalid_fields, "submit rejected");
            self.notify(FormEvent::SubmitRejected { invalid_fields });
            return Ok(SubmitOutcome::Rejected(result));
        }

        let submission = Submission::new(&self.spec, self.values.clone());
        handler.on_submit(&submission)?;
        self.submitted = true;
        self.notify(FormEvent::Submitted);
        Ok(SubmitOutcome::Submitted(submission))
    }

    /// Single entry point for hosts that drive the form with commands.
    pub fn apply<H>(
        &mut self,
        command: FormCommand,
        handler: &mut H,
    ) -> Result<Option<SubmitOutcome>, FormError>
    where
        H: SubmitHandler + ?Sized,
    {
        match command {
            FormCommand::Change { field, value } => self.handle_change(&field, value).map(|_| None),
            FormCommand::Blur { field } => self.handle_blur(&field).map(|_| None),
            FormCommand::Reset => {
                self.reset();
                Ok(None)
            }
            FormCommand::Submit => self.submit(handler).map(Some),
        }
    }

    /// Registers `listener` for every subsequent [`FormEvent`].
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&FormEvent, &FormState) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// JSON view of values, field metadata and submission counters.
    pub fn to_value(&self) -> Value {
        let fields = self
            .meta
            .iter()
            .map(|(id, meta)| {
                (
                    id.clone(),
                    json!({
                        "touched": meta.touched,
                        "dirty": meta.dirty,
                        "errors": meta.errors,
                        "display_error": meta.display_error(),
                    }),
                )
            })
            .collect::<serde_json::Map<_, _>>();

        json!({
            "form_id": self.spec.id,
            "values": self.values.to_value(),
            "fields": fields,
            "submission_attempts": self.submission_attempts,
            "submitted": self.submitted,
        })
    }

    fn notify(&mut self, event: FormEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            listener(&event, self);
        }
        self.listeners = listeners;
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("form_id", &self.spec.id)
            .field("values", &self.values)
            .field("meta", &self.meta)
            .field("submission_attempts", &self.submission_attempts)
            .field("submitted", &self.submitted)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn initial_meta(spec: &FormSpec) -> BTreeMap<String, FieldMeta> {
    spec.fields
        .iter()
        .map(|field| (field.id.clone(), FieldMeta::default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn listeners_see_events_and_state() {
        let mut form = FormState::registration().expect("spec");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        form.subscribe(move |event, state| {
            sink.borrow_mut()
                .push((event.clone(), state.value("username").map(String::from)));
        });

        form.handle_change("username", "alice").expect("change");
        form.handle_blur("username").expect("blur");
        form.reset();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[0],
            (
                FormEvent::Changed {
                    field: "username".into()
                },
                Some("alice".into())
            )
        );
        assert_eq!(seen[2], (FormEvent::Reset, Some(String::new())));
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let mut form = FormState::registration().expect("spec");
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = form.subscribe(move |_, _| *sink.borrow_mut() += 1);

        form.handle_change("email", "a").expect("change");
        assert!(form.unsubscribe(id));
        assert!(!form.unsubscribe(id));
        form.handle_change("email", "b").expect("change");

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut form = FormState::registration().expect("spec");
        assert!(matches!(
            form.handle_change("nickname", "al"),
            Err(FormError::UnknownField(field)) if field == "nickname"
        ));
        assert!(matches!(
            form.handle_blur("nickname"),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn dirty_tracks_distance_from_initial_value() {
        let mut form = FormState::registration().expect("spec");
        form.handle_change("username", "alice").expect("change");
        assert!(form.meta("username").expect("meta").dirty);
        form.handle_change("username", "").expect("change");
        assert!(!form.meta("username").expect("meta").dirty);
    }

    #[test]
    fn handler_failure_leaves_form_unsubmitted() {
        let mut form = FormState::registration().expect("spec");
        form.handle_change("username", "alice").expect("change");
        form.handle_change("email", "alice@example.com").expect("change");
        form.handle_change("password", "longenough").expect("change");

        let mut failing = |_: &Submission| Err::<(), _>(SubmitError::new("offline"));
        let err = form.submit(&mut failing).expect_err("handler error");
        assert!(matches!(err, FormError::Submit(_)));
        assert!(!form.is_submitted());
        assert_eq!(form.submission_attempts(), 1);
    }
}
