use std::sync::LazyLock;

use handlebars::{Handlebars, no_escape};
use serde_json::{Map, Value};

use crate::spec::field::{FieldSpec, Rule};

static ENGINE: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut engine = Handlebars::new();
    engine.register_escape_fn(no_escape);
    engine
});

/// Renders the message of a failed rule for the given field.
///
/// A template that fails to render is returned verbatim.
pub fn render_message(rule: &Rule, field: &FieldSpec) -> String {
    let template = rule.message().unwrap_or_else(|| rule.default_message());
    let ctx = message_context(rule, field);
    ENGINE
        .render_template(template, &ctx)
        .unwrap_or_else(|_| template.to_string())
}

fn message_context(rule: &Rule, field: &FieldSpec) -> Value {
    let mut map = Map::new();
    map.insert("field".into(), Value::String(field.id.clone()));
    map.insert("label".into(), Value::String(field.label.clone()));
    match rule {
        Rule::MinLen { min, .. } => {
            map.insert("min".into(), Value::from(*min));
        }
        Rule::MaxLen { max, .. } => {
            map.insert("max".into(), Value::from(*max));
        }
        Rule::Pattern { pattern, .. } => {
            map.insert("pattern".into(), Value::String(pattern.clone()));
        }
        Rule::Required { .. } | Rule::Email { .. } => {}
    }
    Value::Object(map)
}
