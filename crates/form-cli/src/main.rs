mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::{
    describe as form_describe, render_card, render_json_ui, render_text, render_touched_json_ui,
};
use form_spec::{
    FormSpec, FormState, FormValues, LogSubmitHandler, Submission, SubmitHandler, SubmitOutcome,
    ValidationResult, build_render_payload, spec_schema, validate, values_schema,
};
use serde_json::{Value, json};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{PromptContext, Verbosity, WizardCommand, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "GREENTIC_FORM_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based registration form CLI",
    long_about = "Fills, validates and renders registration forms backed by the form component"
)]
struct Cli {
    /// Show verbose output (statuses, field overview, debug logs).
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Card,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    /// Schema of the values a form collects.
    Values,
    /// Schema of the form definition document.
    Spec,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the form interactively and submit it.
    Run {
        /// Path to a FormSpec JSON; defaults to the built-in registration form.
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// Optional JSON file containing initial values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Also print the submitted values as JSON (secrets masked).
        #[arg(long)]
        values_json: bool,
    },
    /// Validate a values file against a form.
    Validate {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// Path to the values JSON file.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Render the form filled with the given values.
    Render {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Render as after a submit attempt: every field touched, every error shown.
        #[arg(long)]
        touch_all: bool,
    },
    /// Print the form definition as JSON.
    Describe {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
    },
    /// Print a JSON Schema.
    Schema {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SchemaKind::Values)]
        kind: SchemaKind,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Run {
            spec,
            values,
            values_json,
        } => run_form(spec, values, cli.verbose, values_json),
        Command::Validate { spec, values } => run_validate(spec, values),
        Command::Render {
            spec,
            values,
            format,
            touch_all,
        } => run_render(spec, values, format, touch_all),
        Command::Describe { spec } => run_describe(spec),
        Command::Schema { spec, kind } => run_schema(spec, kind),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_spec_source(path: Option<&Path>) -> CliResult<Option<String>> {
    path.map(fs::read_to_string).transpose().map_err(Into::into)
}

fn load_spec(path: Option<&Path>) -> CliResult<FormSpec> {
    let spec = match read_spec_source(path)? {
        Some(contents) => serde_json::from_str(&contents)?,
        None => FormSpec::registration(),
    };
    spec.check()?;
    Ok(spec)
}

fn read_values(path: &Path) -> CliResult<FormValues> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    if !value.is_object() {
        return Err(format!("values file {} must hold a JSON object", path.display()).into());
    }
    Ok(FormValues::from_json(&value))
}

/// Component config pointing at the spec file, or empty for the built-in form.
fn component_config(spec_source: Option<&str>) -> String {
    match spec_source {
        Some(source) => json!({ "form_spec_json": source }).to_string(),
        None => String::new(),
    }
}

fn run_form(
    spec_path: Option<PathBuf>,
    values_path: Option<PathBuf>,
    verbose: bool,
    values_json: bool,
) -> CliResult<()> {
    let spec = load_spec(spec_path.as_deref())?;
    debug!(form_id = %spec.id, fields = spec.fields.len(), "starting form wizard");
    let mut handler = LogSubmitHandler::for_spec(&spec);
    let mut form = FormState::new(spec)?;
    if let Some(path) = values_path {
        form.fill(&read_values(&path)?)?;
    }

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), values_json);
    let stdin = io::stdin();
    let submission = drive_form(&mut form, &mut handler, &mut presenter, &mut stdin.lock())?;
    presenter.show_completion(&submission, form.spec());
    Ok(())
}

/// Prompts for fields until the form submits successfully.
fn drive_form<H, R>(
    form: &mut FormState,
    handler: &mut H,
    presenter: &mut WizardPresenter,
    input: &mut R,
) -> CliResult<Submission>
where
    H: SubmitHandler + ?Sized,
    R: BufRead,
{
    presenter.show_header(&build_render_payload(form));

    loop {
        let Some(field_id) = next_field(form) else {
            match form.submit(handler)? {
                SubmitOutcome::Submitted(submission) => return Ok(submission),
                SubmitOutcome::Rejected(_) => {
                    presenter.show_rejected(&build_render_payload(form));
                    continue;
                }
            }
        };

        let payload = build_render_payload(form);
        presenter.show_status(&payload);
        let (index, field) = payload
            .fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.id == field_id)
            .ok_or_else(|| format!("field '{}' missing from render payload", field_id))?;
        let prompt = PromptContext::new(field, index + 1, payload.fields.len());
        presenter.show_prompt(&prompt);
        print!("> ");
        io::stdout().flush()?;

        let line = read_input_line(input)?
            .ok_or("input ended before the form was submitted")?;
        match WizardCommand::parse(&line) {
            Some(WizardCommand::Exit) => return Err("wizard aborted by user".into()),
            Some(WizardCommand::Reset) => {
                form.reset();
                presenter.show_reset();
                continue;
            }
            None => {}
        }

        form.handle_change(&field_id, line)?;
        form.handle_blur(&field_id)?;
        if let Some(error) = form.display_error(&field_id) {
            presenter.show_field_error(&field.label, &error);
        }
    }
}

/// First field still needing input: never touched, or currently invalid.
fn next_field(form: &FormState) -> Option<String> {
    form.spec()
        .field_ids()
        .find(|id| {
            form.meta(id)
                .map(|meta| !meta.touched || meta.has_errors())
                .unwrap_or(true)
        })
        .map(String::from)
}

/// Reads one line without its terminator; `None` at end of input.
fn read_input_line<R: BufRead>(input: &mut R) -> CliResult<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn run_validate(spec_path: Option<PathBuf>, values_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(spec_path.as_deref())?;
    let values = read_values(&values_path)?;

    let result = validate(&spec, &values);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!("  {} - {}", error.field, error.message);
        }
    }
    if !result.unknown_fields.is_empty() {
        println!("Unknown fields: {}", result.unknown_fields.join(", "));
    }
}

fn run_render(
    spec_path: Option<PathBuf>,
    values_path: Option<PathBuf>,
    format: RenderMode,
    touch_all: bool,
) -> CliResult<()> {
    let spec_source = read_spec_source(spec_path.as_deref())?;
    let spec = load_spec(spec_path.as_deref())?;
    let config_json = component_config(spec_source.as_deref());
    let values_json = match values_path {
        Some(path) => read_values(&path)?.to_value().to_string(),
        None => "{}".to_string(),
    };

    if touch_all && !matches!(format, RenderMode::Json) {
        return Err("--touch-all is only supported with --format json".into());
    }

    let output = match format {
        RenderMode::Text => {
            let text = render_text(&spec.id, &config_json, &values_json);
            ensure_not_error(&text)?;
            text
        }
        RenderMode::Json if touch_all => pretty(&render_touched_json_ui(
            &spec.id,
            &config_json,
            &values_json,
        ))?,
        RenderMode::Json => pretty(&render_json_ui(&spec.id, &config_json, &values_json))?,
        RenderMode::Card => pretty(&render_card(&spec.id, &config_json, &values_json))?,
    };
    println!("{}", output);
    Ok(())
}

fn run_describe(spec_path: Option<PathBuf>) -> CliResult<()> {
    let spec_source = read_spec_source(spec_path.as_deref())?;
    let spec = load_spec(spec_path.as_deref())?;
    let config_json = component_config(spec_source.as_deref());
    println!("{}", pretty(&form_describe(&spec.id, &config_json))?);
    Ok(())
}

fn run_schema(spec_path: Option<PathBuf>, kind: SchemaKind) -> CliResult<()> {
    let schema = match kind {
        SchemaKind::Values => values_schema(&load_spec(spec_path.as_deref())?),
        SchemaKind::Spec => spec_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

/// Text renders are not JSON; only an error envelope is.
fn ensure_not_error(response: &str) -> CliResult<()> {
    if let Ok(value) = serde_json::from_str::<Value>(response)
        && let Some(error) = value.get("error").and_then(Value::as_str)
    {
        return Err(error.into());
    }
    Ok(())
}

fn pretty(response: &str) -> CliResult<String> {
    let value = parse_component_result(response)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
