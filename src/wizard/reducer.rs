//! Pure state transition function for the wizard
//!
//! Navigation gating is not applied here: `NextStep` and `GoToStep` move the index
//! unconditionally and the session facade decides whether to dispatch them.

use super::action::WizardAction;
use super::state::{FieldState, WizardState};

/// Apply an action to a state, producing the next state
///
/// The previous state is never modified. Field actions naming an id absent from the
/// state create a default entry for it.
pub fn reduce(state: &WizardState, action: WizardAction) -> WizardState {
    let mut next = state.clone();

    match action {
        WizardAction::SetField { field_id, value } => {
            let field = field_entry(&mut next, field_id);
            field.value = value;
            field.touched = true;
        }
        WizardAction::StartValidation { field_id } => {
            field_entry(&mut next, field_id).validating = true;
        }
        WizardAction::SetValidationResult { field_id, result } => {
            let field = field_entry(&mut next, field_id);
            field.validating = false;
            field.validation_result = Some(result);
        }
        WizardAction::ConfirmStep { step_id } => {
            next.step_confirmations.insert(step_id, true);
        }
        WizardAction::UnconfirmStep { step_id } => {
            next.step_confirmations.insert(step_id, false);
        }
        WizardAction::NextStep => {
            next.current_step_index = next.current_step_index.saturating_add(1);
        }
        WizardAction::PrevStep => {
            next.current_step_index = next.current_step_index.saturating_sub(1);
        }
        WizardAction::GoToStep { index } => {
            next.current_step_index = index;
        }
        WizardAction::RestoreState { state } => {
            next = state;
        }
    }

    next
}

fn field_entry(state: &mut WizardState, field_id: String) -> &mut FieldState {
    state.fields.entry(field_id).or_default()
}
