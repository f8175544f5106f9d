use serde_json::json;

use form_spec::{FieldKind, FieldSpec, FormSpec, FormValues, Rule, validate};

fn fixture_spec() -> FormSpec {
    serde_json::from_str(include_str!("fixtures/registration_form.json")).expect("deserialize")
}

fn values(username: &str, email: &str, password: &str) -> FormValues {
    [
        ("username", username),
        ("email", email),
        ("password", password),
    ]
    .into_iter()
    .collect()
}

#[test]
fn fixture_matches_builtin_registration_spec() {
    let fixture = fixture_spec();
    let builtin = FormSpec::registration();
    assert_eq!(fixture.id, builtin.id);
    assert_eq!(
        fixture.field_ids().collect::<Vec<_>>(),
        builtin.field_ids().collect::<Vec<_>>()
    );

    let bad = values("", "bad", "short");
    assert_eq!(validate(&fixture, &bad), validate(&builtin, &bad));
}

#[test]
fn invalid_record_reports_one_error_per_field() {
    let result = validate(&FormSpec::registration(), &values("", "bad", "short"));
    assert!(!result.valid);

    let grouped = result.messages_by_field();
    assert_eq!(grouped["username"], vec!["Username is required"]);
    assert_eq!(grouped["email"], vec!["Invalid email address"]);
    assert_eq!(
        grouped["password"],
        vec!["Password must be at least 8 characters"]
    );
}

#[test]
fn valid_record_passes() {
    let result = validate(
        &FormSpec::registration(),
        &values("alice", "alice@example.com", "longenough"),
    );
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn missing_entries_count_as_empty() {
    let result = validate(&FormSpec::registration(), &FormValues::default());
    assert!(!result.valid);
    assert_eq!(result.invalid_field_count(), 3);
}

#[test]
fn unknown_fields_invalidate_record() {
    let input = FormValues::from_json(&json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "longenough",
        "nickname": "al"
    }));
    let result = validate(&FormSpec::registration(), &input);
    assert!(!result.valid);
    assert!(result.errors.is_empty());
    assert_eq!(result.unknown_fields, vec!["nickname"]);
}

#[test]
fn pattern_and_max_rules_apply() {
    let mut spec = FormSpec::registration();
    spec.fields.push(
        FieldSpec::new("handle", FieldKind::Text, "Handle")
            .with_rule(Rule::Pattern {
                pattern: "^[a-z]+$".into(),
                message: None,
            })
            .with_rule(Rule::MaxLen {
                max: 4,
                message: None,
            }),
    );
    let mut input = values("alice", "alice@example.com", "longenough");
    input.set("handle", "Alice9");

    let result = validate(&spec, &input);
    let codes: Vec<_> = result
        .errors_for("handle")
        .map(|error| error.code.as_str())
        .collect();
    assert_eq!(codes, vec!["pattern_mismatch", "max_length"]);
    assert_eq!(
        result.errors_for("handle").nth(1).map(|error| error.message.as_str()),
        Some("Handle must be at most 4 characters")
    );
}
