//! Step completion checks

use crate::schema::{Completion, FieldDef, StepDef};

use super::depends_on::evaluate_depends_on;
use super::state::WizardState;

/// Result of checking a step's completion clause
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionResult {
    pub completed: bool,
    /// Set when the step passes only because an empty choice is allowed
    pub warning: Option<String>,
}

impl CompletionResult {
    fn done(completed: bool) -> Self {
        Self {
            completed,
            warning: None,
        }
    }
}

/// Check whether a step's completion clause is satisfied
///
/// `all_fields` is the schema's field catalog; it is consulted for `depends_on`
/// clauses so that hidden fields neither block nor satisfy a step.
pub fn check_step_completion(
    step: &StepDef,
    state: &WizardState,
    all_fields: &[FieldDef],
) -> CompletionResult {
    match &step.completion {
        Completion::Always => CompletionResult::done(true),

        Completion::ManualConfirm { .. } => CompletionResult::done(state.is_confirmed(&step.id)),

        Completion::ValidatorSuccess { validator } => {
            let input = validator
                .as_deref()
                .and_then(|id| step.action(id))
                .and_then(|action| action.input_field.as_deref());
            let Some(input) = input else {
                return CompletionResult::done(false);
            };
            let ok = state
                .field(input)
                .and_then(|f| f.validation_result.as_ref())
                .is_some_and(|r| r.ok);
            CompletionResult::done(ok)
        }

        Completion::FieldsPresent { required_fields } => {
            let all_present = required_fields
                .iter()
                .all(|id| is_hidden(id, state, all_fields) || state.has_value(id));
            CompletionResult::done(all_present)
        }

        Completion::OptionalAnyOf {
            any_of,
            allow_none,
            none_warning,
        } => {
            let has_any = any_of
                .iter()
                .any(|id| !is_hidden(id, state, all_fields) && state.has_value(id));

            if !has_any && *allow_none {
                return CompletionResult {
                    completed: true,
                    warning: none_warning.clone(),
                };
            }
            CompletionResult::done(has_any)
        }

        Completion::Unknown => CompletionResult::done(false),
    }
}

/// A field is hidden only when it has a `depends_on` clause that currently fails
fn is_hidden(field_id: &str, state: &WizardState, all_fields: &[FieldDef]) -> bool {
    all_fields
        .iter()
        .find(|f| f.id == field_id)
        .and_then(|f| f.depends_on.as_ref())
        .is_some_and(|dep| !evaluate_depends_on(Some(dep), state))
}

/// Human-readable description of what a step needs before it can be left
pub fn completion_hint(step: &StepDef) -> String {
    match &step.completion {
        Completion::Always => "This step is always complete.".to_string(),
        Completion::ManualConfirm { label } => label
            .clone()
            .unwrap_or_else(|| "Please confirm to continue.".to_string()),
        Completion::ValidatorSuccess { .. } => "Validation must pass to continue.".to_string(),
        Completion::FieldsPresent { .. } => "Fill in all required fields to continue.".to_string(),
        Completion::OptionalAnyOf { allow_none, .. } => {
            if *allow_none {
                "Optionally configure one or more options, or skip.".to_string()
            } else {
                "Configure at least one option to continue.".to_string()
            }
        }
        Completion::Unknown => "Complete this step to continue.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::onboarding;
    use crate::schema::{ActionType, DependsOn, FieldType, OnboardingSchema, StepAction};
    use crate::wizard::action::WizardAction;
    use crate::wizard::reducer::reduce;
    use crate::wizard::state::ValidationResult;

    fn step_with(completion: Completion) -> StepDef {
        StepDef {
            id: "test_step".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            fields: vec![],
            checklist: vec![],
            links: vec![],
            actions: vec![StepAction {
                id: "check_token".to_string(),
                action_type: ActionType::ValidateUrl,
                input_field: Some("token".to_string()),
                admin_path: None,
                url_template: None,
            }],
            deploy_button: None,
            summary: None,
            completion,
        }
    }

    fn field(id: &str, depends_on: Option<DependsOn>) -> FieldDef {
        FieldDef {
            id: id.to_string(),
            label: id.to_string(),
            field_type: FieldType::Secret,
            required: false,
            help: None,
            validators: vec![],
            depends_on,
            generate: None,
            options: vec![],
            options_from: None,
            dynamic_env_from: None,
            deprecated: false,
        }
    }

    fn test_fields() -> Vec<FieldDef> {
        vec![
            field("a", None),
            field("b", Some(DependsOn::equals("mode", "advanced"))),
            field("mode", None),
            field("token", None),
        ]
    }

    fn state_for(fields: &[FieldDef]) -> WizardState {
        let schema = OnboardingSchema {
            version: 1,
            metadata: Default::default(),
            links: Default::default(),
            providers: Default::default(),
            validators: vec![],
            fields: fields.to_vec(),
            steps: vec![],
        };
        WizardState::initial(&schema)
    }

    #[test]
    fn test_always_completes() {
        let fields = test_fields();
        let state = state_for(&fields);
        let result = check_step_completion(&step_with(Completion::Always), &state, &fields);
        assert_eq!(result, CompletionResult::done(true));
    }

    #[test]
    fn test_manual_confirm_follows_confirmation() {
        let fields = test_fields();
        let step = step_with(Completion::ManualConfirm { label: None });
        let state = state_for(&fields);
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(&state, WizardAction::confirm("test_step"));
        assert!(check_step_completion(&step, &state, &fields).completed);

        let state = reduce(&state, WizardAction::unconfirm("test_step"));
        assert!(!check_step_completion(&step, &state, &fields).completed);
    }

    #[test]
    fn test_validator_success_tracks_latest_result() {
        let fields = test_fields();
        let step = step_with(Completion::ValidatorSuccess {
            validator: Some("check_token".to_string()),
        });
        let state = state_for(&fields);
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(
            &state,
            WizardAction::validation_result("token", ValidationResult::success()),
        );
        assert!(check_step_completion(&step, &state, &fields).completed);

        let state = reduce(
            &state,
            WizardAction::validation_result("token", ValidationResult::failure("revoked")),
        );
        assert!(!check_step_completion(&step, &state, &fields).completed);
    }

    #[test]
    fn test_validator_success_missing_action_or_input() {
        let fields = test_fields();
        let state = reduce(
            &state_for(&fields),
            WizardAction::validation_result("token", ValidationResult::success()),
        );

        let unknown = step_with(Completion::ValidatorSuccess {
            validator: Some("nope".to_string()),
        });
        assert!(!check_step_completion(&unknown, &state, &fields).completed);

        let mut no_input = step_with(Completion::ValidatorSuccess {
            validator: Some("check_token".to_string()),
        });
        no_input.actions[0].input_field = None;
        assert!(!check_step_completion(&no_input, &state, &fields).completed);

        let unnamed = step_with(Completion::ValidatorSuccess { validator: None });
        assert!(!check_step_completion(&unnamed, &state, &fields).completed);
    }

    #[test]
    fn test_fields_present_ignores_hidden_fields() {
        let fields = test_fields();
        let step = step_with(Completion::FieldsPresent {
            required_fields: vec!["a".to_string(), "b".to_string()],
        });
        let state = state_for(&fields);
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(&state, WizardAction::set_field("a", "value"));
        assert!(check_step_completion(&step, &state, &fields).completed);

        // revealing b makes it required again
        let state = reduce(&state, WizardAction::set_field("mode", "advanced"));
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(&state, WizardAction::set_field("b", "value"));
        assert!(check_step_completion(&step, &state, &fields).completed);
    }

    #[test]
    fn test_fields_present_with_unknown_field_is_incomplete() {
        let fields = test_fields();
        let step = step_with(Completion::FieldsPresent {
            required_fields: vec!["ghost".to_string()],
        });
        assert!(!check_step_completion(&step, &state_for(&fields), &fields).completed);
    }

    #[test]
    fn test_fields_present_empty_list_is_incomplete() {
        let fields = vec![FieldDef {
            field_type: FieldType::Multiselect,
            ..field("channels", None)
        }];
        let step = step_with(Completion::FieldsPresent {
            required_fields: vec!["channels".to_string()],
        });
        let state = state_for(&fields);
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(
            &state,
            WizardAction::set_field("channels", vec!["slack".to_string()]),
        );
        assert!(check_step_completion(&step, &state, &fields).completed);
    }

    #[test]
    fn test_optional_any_of_allow_none_warns() {
        let fields = test_fields();
        let step = step_with(Completion::OptionalAnyOf {
            any_of: vec!["a".to_string(), "token".to_string()],
            allow_none: true,
            none_warning: Some("skip ok".to_string()),
        });
        let result = check_step_completion(&step, &state_for(&fields), &fields);
        assert_eq!(
            result,
            CompletionResult {
                completed: true,
                warning: Some("skip ok".to_string()),
            }
        );

        let state = reduce(&state_for(&fields), WizardAction::set_field("token", "t"));
        assert_eq!(
            check_step_completion(&step, &state, &fields),
            CompletionResult::done(true)
        );
    }

    #[test]
    fn test_optional_any_of_without_allow_none() {
        let fields = test_fields();
        let step = step_with(Completion::OptionalAnyOf {
            any_of: vec!["a".to_string()],
            allow_none: false,
            none_warning: Some("unused".to_string()),
        });
        let result = check_step_completion(&step, &state_for(&fields), &fields);
        assert_eq!(result, CompletionResult::done(false));
    }

    #[test]
    fn test_optional_any_of_hidden_value_does_not_count() {
        let fields = test_fields();
        let step = step_with(Completion::OptionalAnyOf {
            any_of: vec!["b".to_string()],
            allow_none: false,
            none_warning: None,
        });
        // b holds a value but its dependency is unmet
        let state = reduce(&state_for(&fields), WizardAction::set_field("b", "stale"));
        assert!(!check_step_completion(&step, &state, &fields).completed);

        let state = reduce(&state, WizardAction::set_field("mode", "advanced"));
        assert!(check_step_completion(&step, &state, &fields).completed);
    }

    #[test]
    fn test_unknown_completion_fails_closed() {
        let fields = test_fields();
        let state = state_for(&fields);
        let result = check_step_completion(&step_with(Completion::Unknown), &state, &fields);
        assert_eq!(result, CompletionResult::done(false));
    }

    #[test]
    fn test_bundled_llm_step_follows_auth_method() {
        let schema = onboarding();
        let step = schema.step("llm_provider").unwrap();
        let state = WizardState::initial(&schema);
        assert!(!check_step_completion(step, &state, &schema.fields).completed);

        let state = reduce(&state, WizardAction::set_field("anthropic_auth_method", "api_key"));
        assert!(!check_step_completion(step, &state, &schema.fields).completed);

        let state = reduce(&state, WizardAction::set_field("anthropic_api_key", "sk-ant-x"));
        assert!(check_step_completion(step, &state, &schema.fields).completed);
    }

    #[test]
    fn test_completion_hints() {
        let schema = onboarding();
        assert_eq!(
            completion_hint(schema.step("cloudflare_access").unwrap()),
            "I have enabled Cloudflare Access on the worker"
        );
        assert_eq!(
            completion_hint(schema.step("channels").unwrap()),
            "Optionally configure one or more options, or skip."
        );
        assert_eq!(
            completion_hint(&step_with(Completion::ManualConfirm { label: None })),
            "Please confirm to continue."
        );
        assert_eq!(
            completion_hint(&step_with(Completion::Unknown)),
            "Complete this step to continue."
        );
    }
}
