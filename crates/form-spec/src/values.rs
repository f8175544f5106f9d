use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::form::FormSpec;

/// Current string value of every field, keyed by field id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    /// Values every field of `spec` starts with.
    pub fn initial(spec: &FormSpec) -> Self {
        Self(
            spec.fields
                .iter()
                .map(|field| (field.id.clone(), field.initial_value()))
                .collect(),
        )
    }

    /// Reads string values out of a JSON object.
    ///
    /// Non-string scalars are stringified; anything that is not an object
    /// yields an empty set.
    pub fn from_json(value: &Value) -> Self {
        let map = value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), json_to_text(value)))
                    .collect()
            })
            .unwrap_or_default();
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Value of `field`, treating an absent entry as empty input.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Snapshot handed to the submit handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub form_id: String,
    pub spec_version: String,
    pub values: FormValues,
}

impl Submission {
    pub fn new(spec: &FormSpec, values: FormValues) -> Self {
        Self {
            form_id: spec.id.clone(),
            spec_version: spec.version.clone(),
            values,
        }
    }

    /// Decodes the values into a typed record such as [`RegistrationValues`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.values.to_value())
    }

    /// Values with every secret field of `spec` replaced by a mask.
    pub fn redacted(&self, spec: &FormSpec) -> FormValues {
        redact(&self.values, spec)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

pub(crate) const MASK: &str = "********";

pub(crate) fn redact(values: &FormValues, spec: &FormSpec) -> FormValues {
    values
        .iter()
        .map(|(key, value)| {
            let secret = spec
                .field(key)
                .map(|field| field.kind.is_secret())
                .unwrap_or(false);
            if secret && !value.is_empty() {
                (key, MASK)
            } else {
                (key, value)
            }
        })
        .collect()
}

/// Typed record collected by the built-in registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationValues {
    pub username: String,
    pub email: String,
    pub password: String,
}
