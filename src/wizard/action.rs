//! Action vocabulary accepted by the wizard reducer

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::state::{FieldValue, ValidationResult, WizardState};

/// State transition request
///
/// The JSON wire form is tagged by `type` in SCREAMING_SNAKE_CASE with camelCase
/// payload keys, e.g. `{"type":"SET_FIELD","fieldId":"base_url","value":"https://x"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardAction {
    #[serde(rename_all = "camelCase")]
    SetField { field_id: String, value: FieldValue },
    #[serde(rename_all = "camelCase")]
    StartValidation { field_id: String },
    #[serde(rename_all = "camelCase")]
    SetValidationResult {
        field_id: String,
        result: ValidationResult,
    },
    #[serde(rename_all = "camelCase")]
    ConfirmStep { step_id: String },
    #[serde(rename_all = "camelCase")]
    UnconfirmStep { step_id: String },
    NextStep,
    PrevStep,
    GoToStep { index: usize },
    RestoreState { state: WizardState },
}

impl WizardAction {
    pub fn set_field(field_id: &str, value: impl Into<FieldValue>) -> Self {
        WizardAction::SetField {
            field_id: field_id.to_string(),
            value: value.into(),
        }
    }

    pub fn start_validation(field_id: &str) -> Self {
        WizardAction::StartValidation {
            field_id: field_id.to_string(),
        }
    }

    pub fn validation_result(field_id: &str, result: ValidationResult) -> Self {
        WizardAction::SetValidationResult {
            field_id: field_id.to_string(),
            result,
        }
    }

    pub fn confirm(step_id: &str) -> Self {
        WizardAction::ConfirmStep {
            step_id: step_id.to_string(),
        }
    }

    pub fn unconfirm(step_id: &str) -> Self {
        WizardAction::UnconfirmStep {
            step_id: step_id.to_string(),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            WizardAction::SetField { .. } => "SET_FIELD",
            WizardAction::StartValidation { .. } => "START_VALIDATION",
            WizardAction::SetValidationResult { .. } => "SET_VALIDATION_RESULT",
            WizardAction::ConfirmStep { .. } => "CONFIRM_STEP",
            WizardAction::UnconfirmStep { .. } => "UNCONFIRM_STEP",
            WizardAction::NextStep => "NEXT_STEP",
            WizardAction::PrevStep => "PREV_STEP",
            WizardAction::GoToStep { .. } => "GO_TO_STEP",
            WizardAction::RestoreState { .. } => "RESTORE_STATE",
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
