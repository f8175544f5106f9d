use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    FormCommand, FormError, FormSpec, FormState, FormValues, LogSubmitHandler, RenderPayload,
    SpecError, Submission, SubmitError, SubmitOutcome, ValidationResult, build_render_payload,
    render_card as form_render_card, render_json_ui as form_render_json_ui,
    render_text as form_render_text, validate, values_schema,
};

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse values: {0}")]
    Values(#[source] serde_json::Error),
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("invalid form spec: {0}")]
    Spec(#[from] SpecError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error("invalid events: {0}")]
    Events(#[source] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_spec_json: Option<String>,
}

fn load_form_spec(config_json: &str) -> Result<FormSpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    match config.form_spec_json.as_deref() {
        Some(spec_json) => serde_json::from_str(spec_json).map_err(ComponentError::ConfigParse),
        None => Ok(FormSpec::registration()),
    }
}

fn ensure_form(form_id: &str, config_json: &str) -> Result<FormSpec, ComponentError> {
    let spec = load_form_spec(config_json)?;
    if spec.id != form_id {
        Err(ComponentError::FormUnavailable(form_id.to_string()))
    } else {
        spec.check()?;
        Ok(spec)
    }
}

fn parse_values(values_json: &str) -> FormValues {
    serde_json::from_str::<Value>(values_json)
        .map(|value| FormValues::from_json(&value))
        .unwrap_or_default()
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(
        ensure_form(form_id, config_json)
            .and_then(|spec| serde_json::to_value(spec).map_err(ComponentError::JsonEncode)),
    )
}

pub fn get_values_schema(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|spec| values_schema(&spec)))
}

pub fn validate_values(form_id: &str, config_json: &str, values_json: &str) -> String {
    let validation = ensure_form(form_id, config_json).and_then(|spec| {
        let values: Value =
            serde_json::from_str(values_json).map_err(ComponentError::Values)?;
        serde_json::to_value(validate(&spec, &FormValues::from_json(&values)))
            .map_err(ComponentError::JsonEncode)
    });
    respond(validation)
}

/// Builds a form whose fields are filled from `values_json`.
///
/// Entries naming unknown fields are dropped here; `validate_values` is the
/// place that reports them. With `attempt_submit` the form is submitted once
/// to a handler that discards the record, leaving every field touched with
/// its errors computed.
fn filled_form(
    form_id: &str,
    config_json: &str,
    values_json: &str,
    attempt_submit: bool,
) -> Result<FormState, ComponentError> {
    let spec = ensure_form(form_id, config_json)?;
    let mut form = FormState::new(spec)?;
    let values = parse_values(values_json);
    let known: FormValues = values
        .iter()
        .filter(|(key, _)| form.spec().field(key).is_some())
        .collect();
    form.fill(&known)?;
    if attempt_submit {
        let mut discard = |_: &Submission| Ok::<(), SubmitError>(());
        form.submit(&mut discard)?;
    }
    Ok(form)
}

fn render_payload(
    form_id: &str,
    config_json: &str,
    values_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let form = filled_form(form_id, config_json, values_json, false)?;
    Ok(build_render_payload(&form))
}

pub fn render_text(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond_string(
        render_payload(form_id, config_json, values_json)
            .map(|payload| form_render_text(&payload)),
    )
}

pub fn render_json_ui(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        render_payload(form_id, config_json, values_json)
            .map(|payload| form_render_json_ui(&payload)),
    )
}

pub fn render_card(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        render_payload(form_id, config_json, values_json).map(|payload| form_render_card(&payload)),
    )
}

fn build_error_response(
    form: &FormState,
    validation: &ValidationResult,
) -> Result<Value, ComponentError> {
    let validation_value = serde_json::to_value(validation).map_err(ComponentError::JsonEncode)?;
    Ok(json!({
        "status": "error",
        "form": form.to_value(),
        "ui": form_render_json_ui(&build_render_payload(form)),
        "validation": validation_value,
    }))
}

fn build_state_response(form: &FormState, outcome: Option<&SubmitOutcome>) -> Value {
    let status = match outcome {
        Some(SubmitOutcome::Submitted(_)) => "submitted",
        Some(SubmitOutcome::Rejected(_)) => "error",
        None => build_render_payload(form).status.as_str(),
    };

    let mut response = Map::new();
    response.insert("status".into(), Value::String(status.into()));
    response.insert("form".into(), form.to_value());
    response.insert(
        "ui".into(),
        form_render_json_ui(&build_render_payload(form)),
    );
    if let Some(SubmitOutcome::Submitted(submission)) = outcome {
        response.insert(
            "submission".into(),
            json!({
                "form_id": submission.form_id,
                "spec_version": submission.spec_version,
                "values": submission.redacted(form.spec()).to_value(),
            }),
        );
    }
    Value::Object(response)
}

/// Replays a list of form commands against a fresh form and reports the
/// resulting state. Submits go through the logging handler.
pub fn apply_events(form_id: &str, config_json: &str, events_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|spec| {
        let commands: Vec<FormCommand> =
            serde_json::from_str(events_json).map_err(ComponentError::Events)?;
        let mut handler = LogSubmitHandler::for_spec(&spec);
        let mut form = FormState::new(spec)?;
        debug!(form_id, events = commands.len(), "replaying form events");

        let mut last_outcome = None;
        for command in commands {
            if let Some(outcome) = form.apply(command, &mut handler)? {
                last_outcome = Some(outcome);
            }
        }

        if let Some(SubmitOutcome::Rejected(validation)) = &last_outcome {
            return build_error_response(&form, validation);
        }
        Ok(build_state_response(&form, last_outcome.as_ref()))
    }))
}

/// Fills the form from `values_json` and submits it in one step.
pub fn submit(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        filled_form(form_id, config_json, values_json, false).and_then(|mut form| {
            let mut handler = LogSubmitHandler::for_spec(form.spec());
            let outcome = form.submit(&mut handler)?;
            match &outcome {
                SubmitOutcome::Rejected(validation) => build_error_response(&form, validation),
                SubmitOutcome::Submitted(_) => Ok(build_state_response(&form, Some(&outcome))),
            }
        }),
    )
}

/// Renders the form as it looks after a submit attempt: every field touched
/// and every failing rule shown. The record itself is not delivered anywhere.
pub fn render_touched_json_ui(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        filled_form(form_id, config_json, values_json, true)
            .map(|form| form_render_json_ui(&build_render_payload(&form))),
    )
}
