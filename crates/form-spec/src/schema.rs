use serde_json::{Map, Value, json};

use crate::spec::field::Rule;
use crate::spec::form::FormSpec;

/// JSON Schema describing the value record a form collects.
pub fn values_schema(spec: &FormSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &spec.fields {
        let mut property = Map::new();
        property.insert("type".into(), Value::String("string".into()));
        property.insert("title".into(), Value::String(field.label.clone()));
        if field.kind.is_secret() {
            property.insert("writeOnly".into(), Value::Bool(true));
        }

        for rule in &field.rules {
            match rule {
                Rule::Required { .. } => {
                    required.push(Value::String(field.id.clone()));
                    raise_min_length(&mut property, 1);
                }
                Rule::Email { .. } => {
                    property.insert("format".into(), Value::String("email".into()));
                }
                Rule::MinLen { min, .. } => raise_min_length(&mut property, *min),
                Rule::MaxLen { max, .. } => {
                    property.insert("maxLength".into(), Value::from(*max));
                }
                Rule::Pattern { pattern, .. } => {
                    property.insert("pattern".into(), Value::String(pattern.clone()));
                }
            }
        }

        properties.insert(field.id.clone(), Value::Object(property));
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": spec.title,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// JSON Schema of the [`FormSpec`] document format itself.
pub fn spec_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FormSpec)).unwrap_or(Value::Null)
}

fn raise_min_length(property: &mut Map<String, Value>, min: usize) {
    let current = property
        .get("minLength")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if (min as u64) > current {
        property.insert("minLength".into(), Value::from(min));
    }
}
