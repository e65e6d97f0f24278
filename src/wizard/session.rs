//! Wizard session: schema, state, navigation gating and persistence

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schema::{FieldDef, OnboardingSchema, StepDef};
use crate::store::{StateStore, StoreError};

use super::action::WizardAction;
use super::completion::{check_step_completion, CompletionResult};
use super::reducer::reduce;
use super::state::WizardState;

/// Default slot key the session persists under
pub const DEFAULT_STORAGE_KEY: &str = "moltworker-wizard-state";

/// Actions refused by the session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("step '{step_id}' is not complete")]
    StepIncomplete { step_id: String },

    #[error("already at the last step")]
    AtLastStep,

    #[error("cannot jump forward from step {current} to step {requested}")]
    ForwardJump { current: usize, requested: usize },

    #[error("value for field '{field_id}' has the wrong shape")]
    ValueKind { field_id: String },

    #[error("restored state does not match the schema")]
    IncompatibleState,
}

/// Display status of a step in the navigation list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Complete,
    Current,
    Pending,
}

/// One onboarding session over a fixed schema
pub struct WizardSession<S: StateStore> {
    schema: Arc<OnboardingSchema>,
    state: WizardState,
    store: S,
    storage_key: String,
}

impl<S: StateStore> WizardSession<S> {
    /// Start a session, restoring a compatible snapshot from the store if one exists
    pub fn new(schema: Arc<OnboardingSchema>, store: S) -> Self {
        Self::with_storage_key(schema, store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_storage_key(schema: Arc<OnboardingSchema>, store: S, storage_key: &str) -> Self {
        let state = WizardState::initial(&schema);
        let mut session = Self {
            schema,
            state,
            store,
            storage_key: storage_key.to_string(),
        };

        if let Some(snapshot) = session.read_snapshot() {
            session.state = reduce(
                &session.state,
                WizardAction::RestoreState { state: snapshot },
            );
            info!(
                step = session.state.current_step_index,
                "Restored wizard state from '{}'", session.storage_key
            );
        }
        session.persist();
        session
    }

    /// Read the persisted snapshot, discarding anything unreadable or incompatible
    fn read_snapshot(&self) -> Option<WizardState> {
        let raw = match self.store.load(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read wizard state: {}", e);
                return None;
            }
        };

        let snapshot = match WizardState::from_json(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to restore wizard state: {}", e);
                return None;
            }
        };

        if !snapshot.is_compatible_with(&self.schema) {
            debug!("Persisted wizard state is missing schema fields, starting fresh");
            return None;
        }

        Some(snapshot)
    }

    /// Write the current state to the store; failures are logged only
    fn persist(&self) {
        let result = self
            .state
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .save(&self.storage_key, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            warn!("Failed to save wizard state: {}", e);
        }
    }

    pub fn schema(&self) -> &OnboardingSchema {
        &self.schema
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get field definition by id
    pub fn field_def(&self, field_id: &str) -> Option<&FieldDef> {
        self.schema.field(field_id)
    }

    /// The step at the current index
    pub fn current_step(&self) -> Option<&StepDef> {
        self.schema.steps.get(self.state.current_step_index)
    }

    /// Full completion result for a step; out-of-range indexes are incomplete
    pub fn check_step(&self, step_index: usize) -> CompletionResult {
        match self.schema.steps.get(step_index) {
            Some(step) => check_step_completion(step, &self.state, &self.schema.fields),
            None => CompletionResult::default(),
        }
    }

    pub fn is_step_complete(&self, step_index: usize) -> bool {
        self.check_step(step_index).completed
    }

    /// Whether the current step's completion clause is satisfied
    pub fn can_proceed(&self) -> bool {
        self.is_step_complete(self.state.current_step_index)
    }

    /// Direct navigation is allowed only to the current or an earlier step
    pub fn can_navigate_to(&self, step_index: usize) -> bool {
        step_index <= self.state.current_step_index
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step_index.saturating_add(1) >= self.schema.steps.len()
    }

    /// Status of every step, in schema order
    pub fn step_statuses(&self) -> Vec<(&StepDef, StepStatus)> {
        self.schema
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let status = if self.is_step_complete(index) {
                    StepStatus::Complete
                } else if index == self.state.current_step_index {
                    StepStatus::Current
                } else {
                    StepStatus::Pending
                };
                (step, status)
            })
            .collect()
    }

    /// Apply an action after gating, then persist
    ///
    /// `NextStep` requires the current step to be complete and not last. `GoToStep`
    /// and `RestoreState` only move backward or stay put, and a restored state must be
    /// compatible with the schema. `SetField` on a declared field must match its shape.
    /// Refused actions change nothing.
    pub fn dispatch(&mut self, action: WizardAction) -> Result<(), NavigationError> {
        self.check_action(&action)?;

        let kind = action.kind();
        self.state = reduce(&self.state, action);
        debug!(action = kind, step = self.state.current_step_index, "Applied wizard action");

        self.persist();
        Ok(())
    }

    fn check_action(&self, action: &WizardAction) -> Result<(), NavigationError> {
        match action {
            WizardAction::SetField { field_id, value } => match self.field_def(field_id) {
                Some(def) if !value.fits(def) => Err(NavigationError::ValueKind {
                    field_id: field_id.clone(),
                }),
                _ => Ok(()),
            },
            WizardAction::NextStep => {
                if !self.can_proceed() {
                    let step_id = self
                        .current_step()
                        .map(|s| s.id.clone())
                        .unwrap_or_default();
                    return Err(NavigationError::StepIncomplete { step_id });
                }
                if self.is_last_step() {
                    return Err(NavigationError::AtLastStep);
                }
                Ok(())
            }
            WizardAction::GoToStep { index } if !self.can_navigate_to(*index) => {
                Err(NavigationError::ForwardJump {
                    current: self.state.current_step_index,
                    requested: *index,
                })
            }
            WizardAction::RestoreState { state } => {
                if !state.is_compatible_with(&self.schema) {
                    return Err(NavigationError::IncompatibleState);
                }
                if !self.can_navigate_to(state.current_step_index) {
                    return Err(NavigationError::ForwardJump {
                        current: self.state.current_step_index,
                        requested: state.current_step_index,
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Dispatch an action from its JSON wire form
    ///
    /// Unparseable or unknown actions are ignored and leave the state unchanged.
    pub fn dispatch_json(&mut self, raw: &str) -> Result<(), NavigationError> {
        match WizardAction::from_json(raw) {
            Ok(action) => self.dispatch(action),
            Err(e) => {
                warn!("Ignoring unrecognised wizard action: {}", e);
                Ok(())
            }
        }
    }

    /// Discard all progress and start over from a fresh state
    pub fn reset(&mut self) {
        self.state = WizardState::initial(&self.schema);
        info!("Wizard state reset");
        self.persist();
    }

    /// End the session and delete its persisted slot
    pub fn discard(self) -> Result<(), StoreError> {
        self.store.clear(&self.storage_key)?;
        info!("Cleared wizard state '{}'", self.storage_key);
        Ok(())
    }
}
