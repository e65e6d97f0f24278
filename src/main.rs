use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use molt_wizard::config::Config;
use molt_wizard::deploy::{default_secret_mappings, mask_secret, secrets_to_deploy};
use molt_wizard::logging::init_logging;
use molt_wizard::schema::{self, FieldDef, FieldType, OnboardingSchema};
use molt_wizard::store::FileStateStore;
use molt_wizard::wizard::{
    completion_hint, evaluate_depends_on, FieldValue, StepStatus, ValidationResult, WizardAction,
    WizardSession, WizardState,
};

#[derive(Parser)]
#[command(name = "molt-wizard")]
#[command(about = "Schema-driven onboarding wizard for Moltworker")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Schema file (overrides paths.schema)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the schema for consistency problems
    Validate,

    /// Write the effective configuration to .molt-wizard/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the JSON Schema of a wizard document
    JsonSchema {
        #[arg(value_enum)]
        document: SchemaDocument,
    },

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that operate on the persisted wizard session
#[derive(Subcommand)]
enum SessionCommand {
    /// Show steps, the current step and its fields
    Status,

    /// Set a field value (multiselect fields take zero or more values)
    Set {
        field: String,
        values: Vec<String>,
    },

    /// Record the outcome of an external validation for a field
    Validated {
        field: String,

        #[arg(value_enum)]
        outcome: Outcome,

        /// Message reported by the validator
        #[arg(short, long)]
        message: Option<String>,

        /// HTTP status reported by the validator
        #[arg(long)]
        status: Option<u16>,
    },

    /// Confirm a manual_confirm step
    Confirm { step: String },

    /// Withdraw a step confirmation
    Unconfirm { step: String },

    /// Advance to the next step if the current one is complete
    Next,

    /// Go back one step
    Back,

    /// Jump to the current or an earlier step
    Goto { index: usize },

    /// Discard all progress
    Reset {
        /// Delete the saved state instead of writing a fresh one
        #[arg(long)]
        purge: bool,
    },

    /// List the secrets a deployment would push (values masked)
    Secrets,
}

#[derive(Clone, Copy, ValueEnum)]
enum Outcome {
    Ok,
    Fail,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaDocument {
    /// Onboarding schema file
    Schema,
    /// Persisted wizard state
    State,
    /// Wizard action wire form
    Action,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.schema {
        config.paths.schema = path.to_string_lossy().to_string();
    }

    let logging = init_logging(&config, cli.debug)?;
    if let Some(path) = &logging.log_file_path {
        info!("Logging to {}", path.display());
    }

    match cli.command {
        Commands::JsonSchema { document } => print_json_schema(document),
        Commands::Validate => cmd_validate(&load_schema(&config)?),
        Commands::Init { force } => cmd_init(&config, force),
        Commands::Session(command) => {
            let session = open_session(&config)?;
            run_session_command(session, command)
        }
    }
}

fn load_schema(config: &Config) -> Result<OnboardingSchema> {
    let path = config.schema_path();
    schema::load_schema(&path)
        .with_context(|| format!("Failed to load schema from {}", path.display()))
}

fn open_session(config: &Config) -> Result<WizardSession<FileStateStore>> {
    let schema = Arc::new(load_schema(config)?);
    let store = FileStateStore::new(config.state_path());
    Ok(WizardSession::with_storage_key(
        schema,
        store,
        &config.session.storage_key,
    ))
}

fn run_session_command(
    mut session: WizardSession<FileStateStore>,
    command: SessionCommand,
) -> Result<()> {
    match command {
        SessionCommand::Status => {
            print_status(&session);
            return Ok(());
        }
        SessionCommand::Secrets => {
            print_secrets(session.state());
            return Ok(());
        }
        SessionCommand::Reset { purge: true } => {
            session.discard().context("Failed to delete saved wizard state")?;
            println!("Saved wizard state deleted");
            return Ok(());
        }
        SessionCommand::Set { field, values } => {
            let def = session
                .field_def(&field)
                .with_context(|| format!("Unknown field '{}'", field))?;
            let value = field_value(def, values)?;
            session.dispatch(WizardAction::set_field(&field, value))?;
        }
        SessionCommand::Validated {
            field,
            outcome,
            message,
            status,
        } => {
            if session.field_def(&field).is_none() {
                bail!("Unknown field '{}'", field);
            }
            session.dispatch(WizardAction::start_validation(&field))?;
            let result = ValidationResult {
                ok: matches!(outcome, Outcome::Ok),
                message,
                status,
                evidence: None,
            };
            session.dispatch(WizardAction::validation_result(&field, result))?;
        }
        SessionCommand::Confirm { step } => {
            require_step(session.schema(), &step)?;
            session.dispatch(WizardAction::confirm(&step))?;
        }
        SessionCommand::Unconfirm { step } => {
            require_step(session.schema(), &step)?;
            session.dispatch(WizardAction::unconfirm(&step))?;
        }
        SessionCommand::Next => session.dispatch(WizardAction::NextStep)?,
        SessionCommand::Back => session.dispatch(WizardAction::PrevStep)?,
        SessionCommand::Goto { index } => session.dispatch(WizardAction::GoToStep { index })?,
        SessionCommand::Reset { purge: false } => session.reset(),
    }

    print_status(&session);
    Ok(())
}

fn cmd_init(config: &Config, force: bool) -> Result<()> {
    let path = Config::project_config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn require_step(schema: &OnboardingSchema, step_id: &str) -> Result<()> {
    if schema.step(step_id).is_none() {
        bail!("Unknown step '{}'", step_id);
    }
    Ok(())
}

fn field_value(def: &FieldDef, mut values: Vec<String>) -> Result<FieldValue> {
    if def.is_multiselect() {
        return Ok(FieldValue::List(values));
    }
    match values.len() {
        1 => Ok(FieldValue::Text(values.remove(0))),
        0 => Ok(FieldValue::Text(String::new())),
        n => bail!("Field '{}' takes a single value, got {}", def.id, n),
    }
}

fn cmd_validate(schema: &OnboardingSchema) -> Result<()> {
    match schema.validate() {
        Ok(()) => {
            println!(
                "Schema v{} is valid: {} fields, {} steps",
                schema.version,
                schema.fields.len(),
                schema.steps.len()
            );
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("  - {}", error);
            }
            bail!("Schema has {} problem(s)", errors.len())
        }
    }
}

fn print_status(session: &WizardSession<FileStateStore>) {
    let schema = session.schema();
    let state = session.state();

    println!("{}", schema.metadata.product);
    for (index, (step, status)) in session.step_statuses().into_iter().enumerate() {
        let marker = match status {
            StepStatus::Complete => "[x]",
            StepStatus::Current => "[>]",
            StepStatus::Pending => "[ ]",
        };
        let current = if index == state.current_step_index {
            " <"
        } else {
            ""
        };
        println!("  {} {:>2}. {}{}", marker, index, step.title, current);
    }

    let Some(step) = session.current_step() else {
        println!();
        println!("Current step index {} is out of range", state.current_step_index);
        return;
    };

    println!();
    println!("{}: {}", step.title, step.description);
    for item in &step.checklist {
        println!("  * {}", item);
    }
    for link in step.links.iter().filter_map(|l| schema.link(&l.link_ref)) {
        println!("  -> {}: {}", link.label, link.url);
    }

    for field in schema.step_fields(&step.id) {
        if !evaluate_depends_on(field.depends_on.as_ref(), state) {
            continue;
        }
        let value = state
            .value(&field.id)
            .map(|v| display_value(field, v))
            .unwrap_or_else(|| "-".to_string());
        let required = if field.required { "*" } else { "" };
        let deprecated = if field.deprecated { " (deprecated)" } else { "" };
        println!("  {}{} = {}{}", field.id, required, value, deprecated);
        if let Some(result) = state
            .field(&field.id)
            .and_then(|f| f.validation_result.as_ref())
        {
            let verdict = if result.ok { "valid" } else { "invalid" };
            match &result.message {
                Some(message) => println!("      {}: {}", verdict, message),
                None => println!("      {}", verdict),
            }
        }
    }

    let result = session.check_step(state.current_step_index);
    println!();
    if result.completed {
        println!("Step complete.");
    } else {
        println!("{}", completion_hint(step));
    }
    if let Some(warning) = result.warning {
        println!("Warning: {}", warning);
    }
}

fn display_value(field: &FieldDef, value: &FieldValue) -> String {
    match value {
        FieldValue::List(items) if items.is_empty() => "-".to_string(),
        FieldValue::List(items) => items.join(", "),
        FieldValue::Text(text) if text.is_empty() => "-".to_string(),
        FieldValue::Text(text) if field.field_type == FieldType::Secret => mask_secret(text),
        FieldValue::Text(text) => text.clone(),
    }
}

fn print_secrets(state: &WizardState) {
    let secrets = secrets_to_deploy(state, &default_secret_mappings());
    if secrets.is_empty() {
        println!("No secrets to deploy");
        return;
    }
    for secret in secrets {
        println!("{} = {}", secret.secret_name, mask_secret(&secret.value));
    }
}

fn print_json_schema(document: SchemaDocument) -> Result<()> {
    let schema = match document {
        SchemaDocument::Schema => schemars::schema_for!(OnboardingSchema),
        SchemaDocument::State => schemars::schema_for!(WizardState),
        SchemaDocument::Action => schemars::schema_for!(WizardAction),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON Schema")?
    );
    Ok(())
}
