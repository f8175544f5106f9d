use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::{FieldKind, FieldSpec, Rule};

/// Presentation hints for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct FormPresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_label: Option<String>,
}

/// Problems found while checking a form definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("form '{0}' declares no fields")]
    NoFields(String),
    #[error("field id '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("field '{0}' has an empty id or label")]
    BlankField(String),
    #[error("field '{field}' has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },
    #[error("field '{field}' requires min length {min} above max length {max}")]
    LengthBounds { field: String, min: usize, max: usize },
}

/// Top-level form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation: Option<FormPresentation>,
    pub fields: Vec<FieldSpec>,
}

impl FormSpec {
    /// Built-in account registration form.
    pub fn registration() -> Self {
        Self {
            id: "registration".into(),
            title: "Register".into(),
            version: "1.0.0".into(),
            description: Some("Create your account".into()),
            presentation: Some(FormPresentation {
                intro: Some("Create your account".into()),
                submit_label: Some("Register".into()),
                reset_label: Some("Reset".into()),
            }),
            fields: vec![
                FieldSpec::new("username", FieldKind::Text, "Username")
                    .with_placeholder("Enter your username")
                    .with_rule(Rule::Required { message: None }),
                FieldSpec::new("email", FieldKind::Email, "Email")
                    .with_placeholder("Enter your email")
                    .with_rule(Rule::Email { message: None }),
                FieldSpec::new("password", FieldKind::Password, "Password")
                    .with_placeholder("Enter your password")
                    .with_rule(Rule::MinLen {
                        min: 8,
                        message: None,
                    }),
            ],
        }
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.id.as_str())
    }

    pub fn submit_label(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|presentation| presentation.submit_label.as_deref())
            .unwrap_or("Submit")
    }

    pub fn reset_label(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|presentation| presentation.reset_label.as_deref())
            .unwrap_or("Reset")
    }

    /// Verifies the definition is usable before any state is built on it.
    pub fn check(&self) -> Result<(), SpecError> {
        if self.fields.is_empty() {
            return Err(SpecError::NoFields(self.id.clone()));
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.id.trim().is_empty() || field.label.trim().is_empty() {
                return Err(SpecError::BlankField(field.id.clone()));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SpecError::DuplicateField(field.id.clone()));
            }
            check_rules(field)?;
        }

        Ok(())
    }
}

fn check_rules(field: &FieldSpec) -> Result<(), SpecError> {
    let mut min_len = None;
    let mut max_len = None;

    for rule in &field.rules {
        match rule {
            Rule::Pattern { pattern, .. } => {
                if let Err(err) = Regex::new(pattern) {
                    return Err(SpecError::InvalidPattern {
                        field: field.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
            Rule::MinLen { min, .. } => min_len = Some(*min),
            Rule::MaxLen { max, .. } => max_len = Some(*max),
            Rule::Required { .. } | Rule::Email { .. } => {}
        }
    }

    if let (Some(min), Some(max)) = (min_len, max_len)
        && min > max
    {
        return Err(SpecError::LengthBounds {
            field: field.id.clone(),
            min,
            max,
        });
    }

    Ok(())
}
