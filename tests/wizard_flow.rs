//! End-to-end wizard flow against the bundled onboarding schema
//!
//! Drives a session through every step with a file-backed store, then checks that a
//! second session restores exactly where the first one stopped.

use std::sync::Arc;

use molt_wizard::deploy::{default_secret_mappings, secrets_to_deploy};
use molt_wizard::schema::loader::from_yaml_str;
use molt_wizard::store::{FileStateStore, StateStore};
use molt_wizard::wizard::{
    NavigationError, ValidationResult, WizardAction, WizardSession, WizardState,
    DEFAULT_STORAGE_KEY,
};
use molt_wizard::OnboardingSchema;
use tempfile::TempDir;

const SCHEMA_YAML: &str = include_str!("../schema/onboarding.schema.yaml");

fn schema() -> Arc<OnboardingSchema> {
    Arc::new(from_yaml_str(SCHEMA_YAML).expect("bundled schema parses"))
}

fn step_index(schema: &OnboardingSchema, id: &str) -> usize {
    schema
        .steps
        .iter()
        .position(|s| s.id == id)
        .unwrap_or_else(|| panic!("step {id} exists"))
}

fn advance(session: &mut WizardSession<FileStateStore>) {
    session
        .dispatch(WizardAction::NextStep)
        .unwrap_or_else(|e| panic!("advance failed: {e}"));
}

#[test]
fn test_full_onboarding_flow() {
    let temp_dir = TempDir::new().unwrap();
    let schema = schema();
    let mut session = WizardSession::new(schema.clone(), FileStateStore::new(temp_dir.path()));

    // welcome
    assert!(session.can_proceed());
    advance(&mut session);

    // cloudflare_account
    assert!(!session.can_proceed());
    session
        .dispatch(WizardAction::set_field("cf_account_id", "0123456789abcdef"))
        .unwrap();
    advance(&mut session);

    // deploy_worker is gated on the URL validation result
    session
        .dispatch(WizardAction::set_field("base_url", "https://molt.example.workers.dev"))
        .unwrap();
    assert!(!session.can_proceed());
    session
        .dispatch(WizardAction::start_validation("base_url"))
        .unwrap();
    assert!(session.state().field("base_url").unwrap().validating);
    session
        .dispatch(WizardAction::validation_result(
            "base_url",
            ValidationResult::success(),
        ))
        .unwrap();
    advance(&mut session);

    // gateway_token
    session
        .dispatch(WizardAction::set_field(
            "moltbot_gateway_token",
            "c2VjcmV0LWdhdGV3YXktdG9rZW4",
        ))
        .unwrap();
    advance(&mut session);

    // llm_provider: only the selected auth method's field is required
    session
        .dispatch(WizardAction::set_field("anthropic_auth_method", "api_key"))
        .unwrap();
    assert!(!session.can_proceed());
    session
        .dispatch(WizardAction::set_field("anthropic_api_key", "sk-ant-api-key"))
        .unwrap();
    advance(&mut session);

    // channels: slack selected and configured, no warning
    session
        .dispatch(WizardAction::set_field(
            "enabled_channels",
            vec!["slack".to_string()],
        ))
        .unwrap();
    session
        .dispatch(WizardAction::set_field("slack_bot_token", "xoxb-bot-token"))
        .unwrap();
    let result = session.check_step(session.state().current_step_index);
    assert!(result.completed);
    assert!(result.warning.is_none());
    advance(&mut session);

    // cloudflare_access and deploy_secrets need manual confirmation
    assert!(!session.can_proceed());
    session
        .dispatch(WizardAction::confirm("cloudflare_access"))
        .unwrap();
    advance(&mut session);

    let secrets = secrets_to_deploy(session.state(), &default_secret_mappings());
    let names: Vec<_> = secrets.iter().map(|s| s.secret_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["MOLTBOT_GATEWAY_TOKEN", "ANTHROPIC_API_KEY", "SLACK_BOT_TOKEN"]
    );

    session.dispatch(WizardAction::confirm("deploy_secrets")).unwrap();
    advance(&mut session);

    // device_pairing is the last step
    assert_eq!(
        session.state().current_step_index,
        step_index(&schema, "device_pairing")
    );
    assert_eq!(
        session.dispatch(WizardAction::NextStep),
        Err(NavigationError::AtLastStep)
    );
}

#[test]
fn test_session_resumes_from_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let schema = schema();

    let saved = {
        let mut session =
            WizardSession::new(schema.clone(), FileStateStore::new(temp_dir.path()));
        advance(&mut session);
        session
            .dispatch(WizardAction::set_field("cf_account_id", "acc-1"))
            .unwrap();
        session
            .dispatch(WizardAction::validation_result(
                "telegram_bot_token",
                ValidationResult::failure("Unauthorized"),
            ))
            .unwrap();
        session.state().clone()
    };

    let resumed = WizardSession::new(schema, FileStateStore::new(temp_dir.path()));
    assert_eq!(resumed.state(), &saved);
    assert_eq!(resumed.state().current_step_index, 1);
}

#[test]
fn test_corrupt_slot_starts_fresh_and_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStateStore::new(temp_dir.path());
    store.save(DEFAULT_STORAGE_KEY, "{\"currentStepIndex\": ").unwrap();

    let schema = schema();
    let session = WizardSession::new(schema.clone(), store.clone());
    assert_eq!(session.state(), &WizardState::initial(&schema));

    let raw = store.load(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert_eq!(WizardState::from_json(&raw).unwrap(), WizardState::initial(&schema));
}

#[test]
fn test_snapshot_from_older_schema_is_discarded() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStateStore::new(temp_dir.path());

    let mut older = (*schema()).clone();
    older.fields.retain(|f| f.id != "cf_access_aud");
    let mut snapshot = WizardState::initial(&older);
    snapshot.current_step_index = 6;
    store
        .save(DEFAULT_STORAGE_KEY, &snapshot.to_json().unwrap())
        .unwrap();

    let session = WizardSession::new(schema(), store);
    assert_eq!(session.state().current_step_index, 0);
    assert!(session.state().field("cf_access_aud").is_some());
}

#[test]
fn test_skipping_channels_returns_warning() {
    let temp_dir = TempDir::new().unwrap();
    let schema = schema();
    let session = WizardSession::new(schema.clone(), FileStateStore::new(temp_dir.path()));

    let result = session.check_step(step_index(&schema, "channels"));
    assert!(result.completed);
    assert_eq!(
        result.warning.as_deref(),
        Some("No channel configured; only the web UI will be reachable.")
    );
}

#[test]
fn test_channel_token_hidden_until_selected() {
    let temp_dir = TempDir::new().unwrap();
    let schema = schema();
    let mut session = WizardSession::new(schema.clone(), FileStateStore::new(temp_dir.path()));
    let channels = step_index(&schema, "channels");

    // a token for an unselected channel is hidden and does not count
    session
        .dispatch(WizardAction::set_field("discord_bot_token", "discord-token"))
        .unwrap();
    assert!(session.check_step(channels).warning.is_some());

    session
        .dispatch(WizardAction::set_field(
            "enabled_channels",
            vec!["discord".to_string()],
        ))
        .unwrap();
    let result = session.check_step(channels);
    assert!(result.completed);
    assert!(result.warning.is_none());
}
