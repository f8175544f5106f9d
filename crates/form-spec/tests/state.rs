use std::collections::BTreeMap;

use form_spec::{
    FieldMeta, FormCommand, FormState, FormValues, RegistrationValues, Submission, SubmitError,
    SubmitOutcome,
};

const FIELDS: [&str; 3] = ["username", "email", "password"];

fn registration() -> FormState {
    FormState::registration().expect("built-in spec is valid")
}

fn all_meta(form: &FormState) -> BTreeMap<&'static str, FieldMeta> {
    FIELDS
        .iter()
        .map(|field| (*field, form.meta(field).cloned().expect("meta")))
        .collect()
}

fn fill(form: &mut FormState, username: &str, email: &str, password: &str) {
    form.handle_change("username", username).expect("change");
    form.handle_change("email", email).expect("change");
    form.handle_change("password", password).expect("change");
}

#[test]
fn changing_one_field_never_touches_other_errors() {
    let mut form = registration();
    fill(&mut form, "", "bad", "short");
    let before = all_meta(&form);

    for candidate in ["alice", "", "x", "a much longer name"] {
        form.handle_change("username", candidate).expect("change");
        let after = all_meta(&form);
        assert_eq!(after["email"], before["email"]);
        assert_eq!(after["password"], before["password"]);
    }
}

#[test]
fn invalid_submit_surfaces_all_errors_and_skips_handler() {
    let mut form = registration();
    fill(&mut form, "", "bad", "short");

    let mut calls = 0;
    let mut handler = |_: &Submission| {
        calls += 1;
        Ok::<(), SubmitError>(())
    };
    let outcome = form.submit(&mut handler).expect("submit");

    let SubmitOutcome::Rejected(result) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(result.invalid_field_count(), 3);
    for field in FIELDS {
        let meta = form.meta(field).expect("meta");
        assert!(meta.touched);
        assert!(!meta.errors.is_empty());
        assert!(form.display_error(field).is_some());
    }
    assert_eq!(calls, 0);
    assert!(!form.is_submitted());
}

#[test]
fn submit_without_any_input_marks_everything_touched() {
    let mut form = registration();
    assert!(form.display_error("username").is_none());

    let outcome = form
        .submit(&mut |_: &Submission| Ok::<(), SubmitError>(()))
        .expect("submit");
    assert!(!outcome.is_submitted());
    assert_eq!(
        form.display_error("username").as_deref(),
        Some("Username is required")
    );
    assert_eq!(
        form.display_error("email").as_deref(),
        Some("Invalid email address")
    );
}

#[test]
fn valid_submit_invokes_handler_once_with_exact_record() {
    let mut form = registration();
    fill(&mut form, "alice", "alice@example.com", "longenough");

    let mut received = Vec::new();
    let mut handler = |submission: &Submission| {
        received.push(submission.clone());
        Ok::<(), SubmitError>(())
    };
    let outcome = form.submit(&mut handler).expect("submit");
    assert!(outcome.is_submitted());

    assert_eq!(received.len(), 1);
    let record: RegistrationValues = received[0].decode().expect("decode");
    assert_eq!(
        record,
        RegistrationValues {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "longenough".into(),
        }
    );
    for field in FIELDS {
        assert!(form.meta(field).expect("meta").errors.is_empty());
    }
    assert!(form.is_submitted());
    assert_eq!(form.submission_attempts(), 1);
}

#[test]
fn reset_restores_initial_state() {
    let mut form = registration();
    fill(&mut form, "alice", "bad", "short");
    form.handle_blur("email").expect("blur");
    form.submit(&mut |_: &Submission| Ok::<(), SubmitError>(()))
        .expect("submit");

    form.reset();

    for field in FIELDS {
        assert_eq!(form.value(field), Some(""));
        assert_eq!(form.meta(field), Some(&FieldMeta::default()));
    }
    assert_eq!(form.submission_attempts(), 0);
    assert!(!form.is_submitted());
}

#[test]
fn errors_hidden_until_field_is_touched() {
    let mut form = registration();
    let mut values = FormValues::default();
    values.set("email", "bad");
    form.fill(&values).expect("fill");

    // Change marks touched, so only untouched fields stay silent.
    assert!(form.display_error("email").is_some());
    assert!(form.display_error("password").is_none());
    assert!(!form.meta("password").expect("meta").touched);

    form.handle_blur("password").expect("blur");
    assert!(form.display_error("password").is_none());
    assert!(form.meta("password").expect("meta").touched);
}

#[test]
fn blur_alone_reveals_nothing_until_errors_exist() {
    let mut form = registration();
    form.handle_blur("username").expect("blur");
    assert!(form.meta("username").expect("meta").touched);
    assert!(form.display_error("username").is_none());

    form.handle_change("username", "").expect("change");
    assert_eq!(
        form.display_error("username").as_deref(),
        Some("Username is required")
    );
}

#[test]
fn handle_change_is_idempotent() {
    for (field, value) in [("username", ""), ("email", "bad"), ("password", "longenough")] {
        let mut once = registration();
        once.handle_change(field, value).expect("change");

        let mut twice = registration();
        twice.handle_change(field, value).expect("change");
        twice.handle_change(field, value).expect("change");

        assert_eq!(all_meta(&once), all_meta(&twice));
        assert_eq!(once.values(), twice.values());
    }
}

#[test]
fn commands_drive_the_same_transitions() {
    let mut form = registration();
    let commands: Vec<FormCommand> = serde_json::from_value(serde_json::json!([
        { "action": "change", "field": "username", "value": "alice" },
        { "action": "change", "field": "email", "value": "alice@example.com" },
        { "action": "blur", "field": "email" },
        { "action": "change", "field": "password", "value": "longenough" },
        { "action": "submit" }
    ]))
    .expect("commands");

    let mut submitted = 0;
    let mut handler = |_: &Submission| {
        submitted += 1;
        Ok::<(), SubmitError>(())
    };
    let mut last = None;
    for command in commands {
        last = form.apply(command, &mut handler).expect("apply");
    }

    assert!(matches!(last, Some(SubmitOutcome::Submitted(_))));
    assert_eq!(submitted, 1);
}

#[test]
fn snapshot_json_reports_fields_and_counters() {
    let mut form = registration();
    form.handle_change("email", "bad").expect("change");
    let snapshot = form.to_value();

    assert_eq!(snapshot["form_id"], "registration");
    assert_eq!(snapshot["values"]["email"], "bad");
    assert_eq!(snapshot["fields"]["email"]["touched"], true);
    assert_eq!(
        snapshot["fields"]["email"]["display_error"],
        "Invalid email address"
    );
    assert!(snapshot["fields"]["username"]["display_error"].is_null());
    assert_eq!(snapshot["submission_attempts"], 0);
}

#[test]
fn malformed_addresses_keep_the_email_error() {
    let mut form = registration();
    for address in [
        "alice@example.c",
        "a..b@example.com",
        ".alice@example.com",
        "alice@-example.com",
        "alice@exa_mple.com",
    ] {
        form.handle_change("email", address).expect("change");
        assert_eq!(
            form.display_error("email").as_deref(),
            Some("Invalid email address"),
            "{address} should be rejected"
        );
    }

    form.handle_change("email", "alice@example.com").expect("change");
    assert_eq!(form.display_error("email"), None);
}
