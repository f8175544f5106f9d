use serde_json::{Map, Value, json};

use crate::{spec::field::FieldKind, state::FormState, values::MASK};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// At least one field is still invalid.
    NeedInput,
    /// Every field passes validation; the form can be submitted.
    Ready,
    /// The handler accepted the last submit.
    Submitted,
}

impl RenderStatus {
    /// Human-friendly label that matches the renderer requirements.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Ready => "ready",
            RenderStatus::Submitted => "submitted",
        }
    }
}

/// Visual weight of an action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVariant {
    Default,
    Outline,
}

impl ActionVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionVariant::Default => "default",
            ActionVariant::Outline => "outline",
        }
    }
}

/// What an action does when triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Reset,
    Submit,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Reset => "reset",
            ActionKind::Submit => "submit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderAction {
    pub kind: ActionKind,
    pub title: String,
    pub variant: ActionVariant,
}

/// Describes a single input for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
    pub value: String,
    pub touched: bool,
    pub error: Option<String>,
}

impl RenderField {
    /// Value safe to show to a person; secret values are masked.
    pub fn display_value(&self) -> &str {
        if self.kind.is_secret() && !self.value.is_empty() {
            MASK
        } else {
            &self.value
        }
    }
}

/// Collected payload used by the text, JSON and card renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub form_version: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub fields: Vec<RenderField>,
    pub actions: Vec<RenderAction>,
}

impl RenderPayload {
    pub fn field(&self, id: &str) -> Option<&RenderField> {
        self.fields.iter().find(|field| field.id == id)
    }
}

/// Build the renderer payload from a live form.
pub fn build_render_payload(form: &FormState) -> RenderPayload {
    let spec = form.spec();

    let fields = spec
        .fields
        .iter()
        .map(|field| RenderField {
            id: field.id.clone(),
            label: field.label.clone(),
            kind: field.kind,
            placeholder: field.placeholder.clone(),
            value: form.value(&field.id).unwrap_or_default().to_string(),
            touched: form.meta(&field.id).map(|meta| meta.touched).unwrap_or(false),
            error: form.display_error(&field.id),
        })
        .collect::<Vec<_>>();

    let help = spec
        .presentation
        .as_ref()
        .and_then(|presentation| presentation.intro.clone())
        .or_else(|| spec.description.clone());

    let status = if form.is_submitted() {
        RenderStatus::Submitted
    } else if form.validation().valid {
        RenderStatus::Ready
    } else {
        RenderStatus::NeedInput
    };

    let actions = vec![
        RenderAction {
            kind: ActionKind::Reset,
            title: spec.reset_label().to_string(),
            variant: ActionVariant::Outline,
        },
        RenderAction {
            kind: ActionKind::Submit,
            title: spec.submit_label().to_string(),
            variant: ActionVariant::Default,
        },
    ];

    RenderPayload {
        form_id: spec.id.clone(),
        form_title: spec.title.clone(),
        form_version: spec.version.clone(),
        help,
        status,
        fields,
        actions,
    }
}

/// Render the payload as a structured JSON-friendly value.
///
/// Secret values never leave the renderer; only whether they are filled.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert(
                "type".into(),
                Value::String(field.kind.input_type().to_string()),
            );
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if field.kind.is_secret() {
                map.insert("filled".into(), Value::Bool(!field.value.is_empty()));
            } else {
                map.insert("value".into(), Value::String(field.value.clone()));
            }
            map.insert("touched".into(), Value::Bool(field.touched));
            map.insert(
                "error".into(),
                field.error.clone().map(Value::String).unwrap_or(Value::Null),
            );
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let actions = payload
        .actions
        .iter()
        .map(|action| {
            json!({
                "type": action.kind.as_str(),
                "title": action.title,
                "variant": action.variant.as_str(),
            })
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "form_version": payload.form_version,
        "status": payload.status.as_str(),
        "help": payload.help,
        "fields": fields,
        "actions": actions,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    lines.push(format!("Status: {}", payload.status.as_str()));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    lines.push("Fields:".to_string());
    for field in &payload.fields {
        let mut entry = format!(" - {} [{}]", field.label, field.kind.input_type());
        if field.value.is_empty() {
            if let Some(placeholder) = &field.placeholder {
                entry.push_str(&format!(" ({})", placeholder));
            }
        } else {
            entry.push_str(&format!(" = {}", field.display_value()));
        }
        lines.push(entry);
        if let Some(error) = &field.error {
            lines.push(format!("   ! {}", error));
        }
    }

    let actions = payload
        .actions
        .iter()
        .map(|action| format!("[{}]", action.title))
        .collect::<Vec<_>>();
    lines.push(format!("Actions: {}", actions.join(" ")));

    lines.join("\n")
}

/// Render the payload as an Adaptive Card v1.3 transport.
pub fn render_card(payload: &RenderPayload) -> Value {
    let mut body = Vec::new();

    body.push(json!({
        "type": "TextBlock",
        "text": payload.form_title,
        "weight": "Bolder",
        "size": "Large",
        "horizontalAlignment": "Center",
        "wrap": true,
    }));

    if let Some(help) = &payload.help {
        body.push(json!({
            "type": "TextBlock",
            "text": help,
            "isSubtle": true,
            "horizontalAlignment": "Center",
            "wrap": true,
        }));
    }

    for field in &payload.fields {
        body.push(field_input(field));
        if let Some(error) = &field.error {
            body.push(json!({
                "type": "TextBlock",
                "text": error,
                "color": "Attention",
                "size": "Small",
                "spacing": "None",
                "wrap": true,
            }));
        }
    }

    let actions = payload
        .actions
        .iter()
        .map(|action| {
            json!({
                "type": "Action.Submit",
                "title": action.title,
                "style": match action.variant {
                    ActionVariant::Default => "positive",
                    ActionVariant::Outline => "default",
                },
                "data": {
                    "form": {
                        "formId": payload.form_id,
                        "action": action.kind.as_str(),
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.3",
        "body": body,
        "actions": actions,
    })
}

fn field_input(field: &RenderField) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::String("Input.Text".into()));
    map.insert("id".into(), Value::String(field.id.clone()));
    map.insert("label".into(), Value::String(field.label.clone()));
    let style = match field.kind {
        // Card 1.3 has no masked input style (`password` arrives in 1.5), so
        // secret fields render as plain text and never carry their value.
        FieldKind::Text | FieldKind::Password => "text",
        FieldKind::Email => "email",
    };
    map.insert("style".into(), Value::String(style.into()));
    if let Some(placeholder) = &field.placeholder {
        map.insert("placeholder".into(), Value::String(placeholder.clone()));
    }
    if !field.kind.is_secret() && !field.value.is_empty() {
        map.insert("value".into(), Value::String(field.value.clone()));
    }
    Value::Object(map)
}
