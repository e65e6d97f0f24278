//! Secrets a deploy step would push to the worker
//!
//! Only field values are read here; the deployment itself is done by the caller.

use crate::schema::DependsOn;
use crate::wizard::{evaluate_depends_on, WizardState};

/// Maps a wizard field to the worker secret it is deployed as
#[derive(Debug, Clone, PartialEq)]
pub struct SecretMapping {
    pub field_id: String,
    pub secret_name: String,
    /// Deploy only when this clause holds
    pub condition: Option<DependsOn>,
}

impl SecretMapping {
    pub fn new(field_id: &str, secret_name: &str) -> Self {
        Self {
            field_id: field_id.to_string(),
            secret_name: secret_name.to_string(),
            condition: None,
        }
    }

    pub fn when(mut self, condition: DependsOn) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Secret to deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSecret {
    pub secret_name: String,
    pub value: String,
}

/// Secret mappings for a Moltworker deployment
pub fn default_secret_mappings() -> Vec<SecretMapping> {
    vec![
        SecretMapping::new("moltbot_gateway_token", "MOLTBOT_GATEWAY_TOKEN"),
        SecretMapping::new("anthropic_setup_token", "ANTHROPIC_OAUTH_TOKEN")
            .when(DependsOn::equals("anthropic_auth_method", "setup_token")),
        SecretMapping::new("anthropic_api_key", "ANTHROPIC_API_KEY")
            .when(DependsOn::equals("anthropic_auth_method", "api_key")),
        SecretMapping::new("telegram_bot_token", "TELEGRAM_BOT_TOKEN"),
        SecretMapping::new("discord_bot_token", "DISCORD_BOT_TOKEN"),
        SecretMapping::new("slack_bot_token", "SLACK_BOT_TOKEN"),
        SecretMapping::new("slack_app_token", "SLACK_APP_TOKEN"),
    ]
}

/// Secrets whose condition holds and whose field holds a non-blank scalar value
pub fn secrets_to_deploy(state: &WizardState, mappings: &[SecretMapping]) -> Vec<PlannedSecret> {
    mappings
        .iter()
        .filter(|m| evaluate_depends_on(m.condition.as_ref(), state))
        .filter_map(|m| {
            let value = state.value(&m.field_id)?.as_text()?;
            if value.trim().is_empty() {
                return None;
            }
            Some(PlannedSecret {
                secret_name: m.secret_name.clone(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Mask a secret for display, keeping a short prefix and suffix
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let start: String = chars[..4].iter().collect();
    let end: String = chars[chars.len() - 4..].iter().collect();
    format!("{start}...{end}")
}
