use std::fmt::Write;

use form_spec::{FormSpec, RenderField, RenderPayload, Submission};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts and errors only.
    Clean,
    /// Verbose output: status, help text and the field overview.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Words the wizard treats as commands instead of field input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WizardCommand {
    Reset,
    Exit,
}

impl WizardCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            ":reset" => Some(WizardCommand::Reset),
            ":exit" | ":quit" => Some(WizardCommand::Exit),
            _ => None,
        }
    }
}

/// Prints prompts and outcomes while the form is being filled.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_values_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_values_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_values_json,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        println!("Type :reset to start over or :exit to quit.");
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &RenderPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!("Status: {}", payload.status.as_str());
        println!("Fields:");
        for field in &payload.fields {
            let mut entry = format!(" - {} ({})", field.id, field.label);
            if !field.value.is_empty() {
                entry.push_str(&format!(" = {}", field.display_value()));
            }
            if field.error.is_some() {
                entry.push_str(" [invalid]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.label);
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
    }

    pub fn show_field_error(&self, label: &str, error: &str) {
        eprintln!("{}: {}", label, error);
    }

    pub fn show_reset(&self) {
        println!("Form reset.");
    }

    pub fn show_rejected(&self, payload: &RenderPayload) {
        println!("Please fix the highlighted fields:");
        for field in payload.fields.iter().filter(|field| field.error.is_some()) {
            if let Some(error) = &field.error {
                println!(" - {}: {}", field.label, error);
            }
        }
    }

    pub fn show_completion(&self, submission: &Submission, spec: &FormSpec) {
        println!("Registered ✅");
        match submission.to_cbor() {
            Ok(bytes) => {
                println!("Submission (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize submission to CBOR: {}", err);
            }
        }
        if self.show_values_json {
            let redacted = Submission {
                values: submission.redacted(spec),
                ..submission.clone()
            };
            match redacted.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize submission to JSON: {}", err);
                }
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub hint: Option<String>,
}

impl PromptContext {
    pub fn new(field: &RenderField, index: usize, total: usize) -> Self {
        let hint = match (&field.placeholder, field.kind.is_secret()) {
            (Some(placeholder), true) => Some(format!("({}, input is visible)", placeholder)),
            (Some(placeholder), false) => Some(format!("({})", placeholder)),
            (None, true) => Some("(input is visible)".to_string()),
            (None, false) => None,
        };
        Self {
            index: index.max(1),
            total,
            label: field.label.clone(),
            hint,
        }
    }
}

pub fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
