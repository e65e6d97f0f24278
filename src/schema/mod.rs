//! Schema definitions for the onboarding wizard
//!
//! The schema is a static document describing every field the wizard collects and
//! the ordered steps that group them. It is parsed once and never mutated.

use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod loader;

pub use loader::{load_schema, SchemaError};

/// Top-level onboarding schema document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OnboardingSchema {
    /// Schema format version
    pub version: u32,
    /// Product metadata shown on the welcome page
    #[serde(default)]
    pub metadata: SchemaMetadata,
    /// Named external links referenced by steps
    #[serde(default)]
    pub links: BTreeMap<String, LinkDef>,
    /// Provider catalogs keyed by group (e.g. "llm", "channels")
    #[serde(default)]
    pub providers: BTreeMap<String, Vec<Provider>>,
    /// Validator catalog referenced by field validator ids
    #[serde(default)]
    pub validators: Vec<ValidatorDef>,
    /// Every field the wizard collects
    pub fields: Vec<FieldDef>,
    /// Ordered wizard steps
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaMetadata {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub source_repo: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkDef {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Provider {
    pub id: String,
    pub label: String,
    /// Environment variable the provider's credential is deployed as
    pub env: String,
}

/// Kind of validator implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorKind {
    Builtin,
    Http,
}

/// Validator definition; executed by the validation collaborator, never by the engine
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidatorDef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ValidatorKind,
    /// Rule name for builtin validators
    #[serde(default)]
    pub rule: Option<String>,
    /// Request template for http validators
    #[serde(default)]
    pub request: Option<ValidatorRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidatorRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Types of fields supported in the onboarding schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// URL input
    Url,
    /// Masked credential input
    Secret,
    /// Single choice from options
    Select,
    /// Multiple choices from options; value is always a list
    Multiselect,
}

/// Visibility condition on another field's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DependsOn {
    /// Referenced field id
    pub field: String,
    /// Referenced list value must contain this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<String>,
    /// Referenced value must equal this string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
}

impl DependsOn {
    /// Visible when the referenced field holds any value
    pub fn present(field: &str) -> Self {
        Self {
            field: field.to_string(),
            includes: None,
            equals: None,
        }
    }

    pub fn includes(field: &str, value: &str) -> Self {
        Self {
            includes: Some(value.to_string()),
            ..Self::present(field)
        }
    }

    pub fn equals(field: &str, value: &str) -> Self {
        Self {
            equals: Some(value.to_string()),
            ..Self::present(field)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerateKind {
    Random,
}

/// Generator hint for fields the UI can fill automatically
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerateConfig {
    #[serde(rename = "type")]
    pub kind: GenerateKind,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub id: String,
    pub label: String,
}

/// Schema definition for a single field
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldDef {
    /// Unique field identifier
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub help: Option<String>,
    /// Validator ids from the schema's validator catalog
    #[serde(default)]
    pub validators: Vec<String>,
    #[serde(default)]
    pub depends_on: Option<DependsOn>,
    #[serde(default)]
    pub generate: Option<GenerateConfig>,
    /// Static options for select/multiselect fields
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Dynamic option source, e.g. "providers.channels"
    #[serde(default)]
    pub options_from: Option<String>,
    /// Field id whose value names the environment variable for this field
    #[serde(default)]
    pub dynamic_env_from: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

impl FieldDef {
    pub fn is_multiselect(&self) -> bool {
        self.field_type == FieldType::Multiselect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ValidateUrl,
    CheckAccess,
    OpenUrl,
}

/// Action a step offers (validation buttons, external links)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Field whose value the action operates on
    #[serde(default)]
    pub input_field: Option<String>,
    #[serde(default)]
    pub admin_path: Option<String>,
    #[serde(default)]
    pub url_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkRef {
    #[serde(rename = "ref")]
    pub link_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeployButton {
    pub url: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepSummary {
    #[serde(default)]
    pub show_fields: Vec<String>,
}

/// Gating rule deciding when a step is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Completion {
    /// Always satisfied
    Always,
    /// Satisfied once the user confirms the step
    ManualConfirm {
        #[serde(default)]
        label: Option<String>,
    },
    /// Satisfied when the named action's input field validated successfully
    ValidatorSuccess {
        #[serde(default)]
        validator: Option<String>,
    },
    /// Satisfied when every visible required field holds a value
    FieldsPresent {
        #[serde(default)]
        required_fields: Vec<String>,
    },
    /// Satisfied when any visible candidate holds a value, or when none is allowed
    OptionalAnyOf {
        #[serde(default)]
        any_of: Vec<String>,
        #[serde(default)]
        allow_none: bool,
        #[serde(default)]
        none_warning: Option<String>,
    },
    /// Unrecognised completion type; never satisfied
    #[serde(other)]
    Unknown,
}

/// Schema definition for a wizard step
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepDef {
    /// Unique step identifier
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Ordered field ids rendered on this step
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub links: Vec<LinkRef>,
    #[serde(default)]
    pub actions: Vec<StepAction>,
    #[serde(default)]
    pub deploy_button: Option<DeployButton>,
    #[serde(default)]
    pub summary: Option<StepSummary>,
    pub completion: Completion,
}

impl StepDef {
    /// Get action by id
    pub fn action(&self, id: &str) -> Option<&StepAction> {
        self.actions.iter().find(|a| a.id == id)
    }
}

impl OnboardingSchema {
    /// Get field definition by id
    pub fn field(&self, id: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Get step definition by id
    pub fn step(&self, id: &str) -> Option<&StepDef> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Field definitions for a step, in step order. Undeclared ids are skipped.
    pub fn step_fields(&self, step_id: &str) -> Vec<&FieldDef> {
        self.step(step_id)
            .map(|step| step.fields.iter().filter_map(|id| self.field(id)).collect())
            .unwrap_or_default()
    }

    pub fn link(&self, link_ref: &str) -> Option<&LinkDef> {
        self.links.get(link_ref)
    }

    pub fn validator(&self, id: &str) -> Option<&ValidatorDef> {
        self.validators.iter().find(|v| v.id == id)
    }

    /// Resolve a field's options, following `options_from` into the provider catalog
    pub fn resolve_options(&self, field: &FieldDef) -> Vec<FieldOption> {
        let Some(source) = field.options_from.as_deref() else {
            return field.options.clone();
        };

        match source.split_once('.') {
            Some(("providers", group)) if !group.is_empty() && !group.contains('.') => self
                .providers
                .get(group)
                .map(|providers| {
                    providers
                        .iter()
                        .map(|p| FieldOption {
                            id: p.id.clone(),
                            label: p.label.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            _ => {
                warn!(field = %field.id, options_from = %source, "Invalid options_from reference");
                field.options.clone()
            }
        }
    }

    /// Validate the schema for internal consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.steps.is_empty() {
            errors.push("Schema must declare at least one step".to_string());
        }

        let mut field_ids = HashSet::new();
        for field in &self.fields {
            if !field_ids.insert(field.id.as_str()) {
                errors.push(format!("Duplicate field id '{}'", field.id));
            }
        }

        for field in &self.fields {
            if let Some(dep) = &field.depends_on {
                if !field_ids.contains(dep.field.as_str()) {
                    errors.push(format!(
                        "Field '{}' depends on unknown field '{}'",
                        field.id, dep.field
                    ));
                }
            }
            for validator in &field.validators {
                if self.validator(validator).is_none() {
                    errors.push(format!(
                        "Field '{}' references unknown validator '{}'",
                        field.id, validator
                    ));
                }
            }
        }

        let mut step_ids = HashSet::new();
        for step in &self.steps {
            if !step_ids.insert(step.id.as_str()) {
                errors.push(format!("Duplicate step id '{}'", step.id));
            }

            for id in &step.fields {
                if !field_ids.contains(id.as_str()) {
                    errors.push(format!("Step '{}' lists unknown field '{}'", step.id, id));
                }
            }

            for link in &step.links {
                if !self.links.contains_key(&link.link_ref) {
                    errors.push(format!(
                        "Step '{}' references unknown link '{}'",
                        step.id, link.link_ref
                    ));
                }
            }

            for action in &step.actions {
                if let Some(input) = &action.input_field {
                    if !field_ids.contains(input.as_str()) {
                        errors.push(format!(
                            "Action '{}' in step '{}' uses unknown input field '{}'",
                            action.id, step.id, input
                        ));
                    }
                }
            }

            if let Some(summary) = &step.summary {
                for id in &summary.show_fields {
                    if !field_ids.contains(id.as_str()) {
                        errors.push(format!(
                            "Step '{}' summarizes unknown field '{}'",
                            step.id, id
                        ));
                    }
                }
            }

            match &step.completion {
                Completion::ValidatorSuccess { validator } => match validator {
                    Some(v) if step.action(v).is_some() => {}
                    Some(v) => errors.push(format!(
                        "Step '{}' completion references unknown action '{}'",
                        step.id, v
                    )),
                    None => errors.push(format!(
                        "Step '{}' validator_success completion names no action",
                        step.id
                    )),
                },
                Completion::FieldsPresent {
                    required_fields: ids,
                }
                | Completion::OptionalAnyOf { any_of: ids, .. } => {
                    for id in ids {
                        if !field_ids.contains(id.as_str()) {
                            errors.push(format!(
                                "Step '{}' completion references unknown field '{}'",
                                step.id, id
                            ));
                        }
                    }
                }
                Completion::Unknown => errors.push(format!(
                    "Step '{}' has an unknown completion type",
                    step.id
                )),
                Completion::Always | Completion::ManualConfirm { .. } => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
