//! Wizard state held for one onboarding session
//!
//! The serialized form is the persistence contract: camelCase keys
//! (`currentStepIndex`, `fields`, `stepConfirmations`, `validationResult`) and field
//! values that are either a string or a list of strings.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{FieldDef, OnboardingSchema};

/// Value held by a field: scalar for url/secret/select, list for multiselect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Empty value for a field definition
    pub fn empty_for(field: &FieldDef) -> Self {
        if field.is_multiselect() {
            FieldValue::List(Vec::new())
        } else {
            FieldValue::Text(String::new())
        }
    }

    /// Non-empty string or non-empty list
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::List(items) => !items.is_empty(),
        }
    }

    /// Whether the value has the shape a field expects: a list for multiselect, a
    /// string for everything else
    pub fn fits(&self, field: &FieldDef) -> bool {
        matches!(self, FieldValue::List(_)) == field.is_multiselect()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// Outcome of an external validation of a field's value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP status reported by the validating service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Opaque details returned by the validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Per-field state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub value: FieldValue,
    #[serde(default)]
    pub touched: bool,
    #[serde(default)]
    pub validating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_result: Option<ValidationResult>,
}

/// Canonical wizard state for a session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub current_step_index: usize,
    pub fields: BTreeMap<String, FieldState>,
    #[serde(default)]
    pub step_confirmations: BTreeMap<String, bool>,
}

impl WizardState {
    /// Fresh state: every schema field empty and untouched, first step, no confirmations
    pub fn initial(schema: &OnboardingSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                (
                    field.id.clone(),
                    FieldState {
                        value: FieldValue::empty_for(field),
                        ..FieldState::default()
                    },
                )
            })
            .collect();

        Self {
            current_step_index: 0,
            fields,
            step_confirmations: BTreeMap::new(),
        }
    }

    /// Whether a persisted snapshot covers every field the schema declares, each with
    /// a value of the right shape
    ///
    /// Extra keys in the snapshot are tolerated.
    pub fn is_compatible_with(&self, schema: &OnboardingSchema) -> bool {
        schema.fields.iter().all(|f| {
            self.fields
                .get(&f.id)
                .is_some_and(|entry| entry.value.fits(f))
        })
    }

    pub fn field(&self, id: &str) -> Option<&FieldState> {
        self.fields.get(id)
    }

    /// Value of a field, `None` when the id is unknown
    pub fn value(&self, id: &str) -> Option<&FieldValue> {
        self.fields.get(id).map(|f| &f.value)
    }

    /// Whether a field holds a non-empty value; unknown ids count as empty
    pub fn has_value(&self, id: &str) -> bool {
        self.value(id).is_some_and(FieldValue::is_present)
    }

    pub fn is_confirmed(&self, step_id: &str) -> bool {
        self.step_confirmations
            .get(step_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
