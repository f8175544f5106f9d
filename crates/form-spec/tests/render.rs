use form_spec::{
    FormState, RenderStatus, Submission, SubmitError, build_render_payload, render_card,
    render_json_ui, render_text,
};

fn registration() -> FormState {
    FormState::registration().expect("built-in spec is valid")
}

#[test]
fn fresh_form_renders_labels_and_actions() {
    let form = registration();
    let payload = build_render_payload(&form);

    assert_eq!(payload.status, RenderStatus::NeedInput);
    assert_eq!(payload.help.as_deref(), Some("Create your account"));
    assert!(payload.fields.iter().all(|field| field.error.is_none()));

    let text = render_text(&payload);
    assert!(text.contains("Form: Register (registration)"));
    assert!(text.contains("Username [text] (Enter your username)"));
    assert!(text.contains("Actions: [Reset] [Register]"));
}

#[test]
fn text_render_masks_password_and_shows_touched_errors() {
    let mut form = registration();
    form.handle_change("username", "alice").expect("change");
    form.handle_change("password", "short").expect("change");
    let payload = build_render_payload(&form);

    let text = render_text(&payload);
    assert!(text.contains("Username [text] = alice"));
    assert!(text.contains("Password [password] = ********"));
    assert!(!text.contains("short"));
    assert!(text.contains("! Password must be at least 8 characters"));
    assert!(!text.contains("Invalid email address"));
}

#[test]
fn json_ui_exposes_structure_without_secrets() {
    let mut form = registration();
    form.handle_change("email", "bad").expect("change");
    form.handle_change("password", "longenough").expect("change");
    let ui = render_json_ui(&build_render_payload(&form));

    assert_eq!(ui["form_id"], "registration");
    assert_eq!(ui["status"], "need_input");
    let fields = ui["fields"].as_array().expect("fields");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1]["type"], "email");
    assert_eq!(fields[1]["error"], "Invalid email address");
    assert_eq!(fields[2]["filled"], true);
    assert!(fields[2].get("value").is_none());
    assert_eq!(ui["actions"][0]["variant"], "outline");
    assert_eq!(ui["actions"][1]["type"], "submit");
}

#[test]
fn status_follows_validity_and_submission() {
    let mut form = registration();
    form.handle_change("username", "alice").expect("change");
    form.handle_change("email", "alice@example.com").expect("change");
    form.handle_change("password", "longenough").expect("change");
    assert_eq!(build_render_payload(&form).status, RenderStatus::Ready);

    form.submit(&mut |_: &Submission| Ok::<(), SubmitError>(()))
        .expect("submit");
    assert_eq!(build_render_payload(&form).status, RenderStatus::Submitted);
}

#[test]
fn card_uses_text_inputs_and_submit_actions() {
    let mut form = registration();
    form.submit(&mut |_: &Submission| Ok::<(), SubmitError>(()))
        .expect("submit");
    let card = render_card(&build_render_payload(&form));

    assert_eq!(card["version"], "1.3");
    let body = card["body"].as_array().expect("body");
    let inputs = body
        .iter()
        .filter(|item| item["type"] == "Input.Text")
        .count();
    assert_eq!(inputs, 3);
    assert!(body.iter().any(|item| item["color"] == "Attention"));

    let actions = card["actions"].as_array().expect("actions");
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[1]["data"]["form"]["action"], "submit");
}

#[test]
fn card_never_prefills_password_input() {
    let mut form = registration();
    form.handle_change("username", "alice").expect("change");
    form.handle_change("password", "longenough").expect("change");
    let card = render_card(&build_render_payload(&form));

    let body = card["body"].as_array().expect("body");
    let input = |id: &str| {
        body.iter()
            .find(|item| item["type"] == "Input.Text" && item["id"] == id)
            .cloned()
            .expect("input")
    };
    assert_eq!(input("username")["value"], "alice");
    assert!(input("password").get("value").is_none());
    assert!(!card.to_string().contains("longenough"));
}
