use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::spec::field::{FieldSpec, Rule};
use crate::spec::form::FormSpec;
use crate::template::render_message;
use crate::values::FormValues;

/// Address shape accepted by the `email` rule. A leading dot and `..` are
/// rejected separately in [`is_email`].
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9_'+\-.]*[A-Z0-9_+-]@([A-Z0-9][A-Z0-9-]*\.)+[A-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// A single failed rule for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Outcome of validating a whole record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

impl ValidationResult {
    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |error| error.field == field)
    }

    /// Error messages grouped by field, in rule order.
    pub fn messages_by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped
                .entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        grouped
    }

    /// Number of fields with at least one error.
    pub fn invalid_field_count(&self) -> usize {
        self.messages_by_field().len()
    }
}

/// Validates every field of `spec` against `values`.
///
/// Missing entries count as empty input. Entries that name no field of the
/// spec are reported in `unknown_fields` and make the record invalid.
pub fn validate(spec: &FormSpec, values: &FormValues) -> ValidationResult {
    let errors: Vec<ValidationError> = spec
        .fields
        .iter()
        .flat_map(|field| validate_field(field, values.value(&field.id)))
        .collect();

    let unknown_fields: Vec<String> = values
        .keys()
        .filter(|key| spec.field(key).is_none())
        .map(String::from)
        .collect();

    ValidationResult {
        valid: errors.is_empty() && unknown_fields.is_empty(),
        errors,
        unknown_fields,
    }
}

/// Runs every rule of a single field against its value.
pub fn validate_field(field: &FieldSpec, value: &str) -> Vec<ValidationError> {
    field
        .rules
        .iter()
        .filter(|rule| !rule_passes(rule, value))
        .map(|rule| ValidationError {
            field: field.id.clone(),
            message: render_message(rule, field),
            code: rule.code().to_string(),
        })
        .collect()
}

fn rule_passes(rule: &Rule, value: &str) -> bool {
    match rule {
        Rule::Required { .. } => !value.is_empty(),
        Rule::Email { .. } => is_email(value),
        Rule::MinLen { min, .. } => value.chars().count() >= *min,
        Rule::MaxLen { max, .. } => value.chars().count() <= *max,
        // Patterns are compiled up front by `FormSpec::check`.
        Rule::Pattern { pattern, .. } => Regex::new(pattern)
            .map(|regex| regex.is_match(value))
            .unwrap_or(true),
    }
}

fn is_email(value: &str) -> bool {
    !value.starts_with('.') && !value.contains("..") && EMAIL.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule_matches_common_addresses() {
        let rule = Rule::Email { message: None };
        assert!(rule_passes(&rule, "alice@example.com"));
        assert!(rule_passes(&rule, "a.b+tag@sub.example.org"));
        assert!(!rule_passes(&rule, "bad"));
        assert!(!rule_passes(&rule, "alice@example"));
        assert!(!rule_passes(&rule, "alice @example.com"));
        assert!(!rule_passes(&rule, ""));
        assert!(rule_passes(&rule, "O'Brien_1@Example.COM"));
        assert!(!rule_passes(&rule, "alice@example.c"));
        assert!(!rule_passes(&rule, "a..b@example.com"));
        assert!(!rule_passes(&rule, ".alice@example.com"));
        assert!(!rule_passes(&rule, "alice.@example.com"));
        assert!(!rule_passes(&rule, "alice@-example.com"));
        assert!(!rule_passes(&rule, "alice@exa_mple.com"));
    }

    #[test]
    fn length_rules_count_characters() {
        let rule = Rule::MinLen {
            min: 8,
            message: None,
        };
        assert!(rule_passes(&rule, "pässwörd"));
        assert!(!rule_passes(&rule, "short"));
    }

    #[test]
    fn field_collects_every_failed_rule_in_order() {
        let field = FieldSpec::new("email", crate::spec::field::FieldKind::Email, "Email")
            .with_rule(Rule::Required { message: None })
            .with_rule(Rule::Email { message: None });
        let errors = validate_field(&field, "");
        let codes: Vec<_> = errors.iter().map(|error| error.code.as_str()).collect();
        assert_eq!(codes, vec!["required", "invalid_email"]);
    }
}
