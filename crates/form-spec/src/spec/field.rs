use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Supported input kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Password,
}

impl FieldKind {
    /// HTML-style input type used by renderers.
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
        }
    }

    /// Password values are never echoed back in human-facing output.
    pub fn is_secret(&self) -> bool {
        matches!(self, FieldKind::Password)
    }
}

/// Single validation rule attached to a field.
///
/// `message` is a Handlebars template; `{{label}}` and the rule parameters
/// (`{{min}}`, `{{max}}`, `{{pattern}}`) are available to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinLen {
        min: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxLen {
        max: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Rule {
    /// Stable machine-readable code reported alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Rule::Required { .. } => "required",
            Rule::Email { .. } => "invalid_email",
            Rule::MinLen { .. } => "min_length",
            Rule::MaxLen { .. } => "max_length",
            Rule::Pattern { .. } => "pattern_mismatch",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Rule::Required { message }
            | Rule::Email { message }
            | Rule::MinLen { message, .. }
            | Rule::MaxLen { message, .. }
            | Rule::Pattern { message, .. } => message.as_deref(),
        }
    }

    /// Template used when the rule carries no message of its own.
    pub fn default_message(&self) -> &'static str {
        match self {
            Rule::Required { .. } => "{{label}} is required",
            Rule::Email { .. } => "Invalid email address",
            Rule::MinLen { .. } => "{{label}} must be at least {{min}} characters",
            Rule::MaxLen { .. } => "{{label}} must be at most {{max}} characters",
            Rule::Pattern { .. } => "{{label}} has an invalid format",
        }
    }
}

/// One named input slot of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            placeholder: None,
            default_value: None,
            rules: Vec::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Value the field starts with and returns to on reset.
    pub fn initial_value(&self) -> String {
        self.default_value.clone().unwrap_or_default()
    }
}
