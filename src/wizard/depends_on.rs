//! Field visibility from `depends_on` clauses

use crate::schema::DependsOn;

use super::state::{FieldValue, WizardState};

/// Whether a field guarded by `depends_on` is currently visible
///
/// - no clause: visible
/// - `includes`: the referenced value must be a list containing the entry
/// - `equals`: the referenced value must be exactly that string
/// - neither: the referenced value must be a non-empty string or list
///
/// A missing referenced field behaves like an absent value.
pub fn evaluate_depends_on(depends_on: Option<&DependsOn>, state: &WizardState) -> bool {
    let Some(dep) = depends_on else {
        return true;
    };

    let value = state.value(&dep.field);

    if let Some(needle) = &dep.includes {
        return match value {
            Some(FieldValue::List(items)) => items.iter().any(|item| item == needle),
            _ => false,
        };
    }

    if let Some(expected) = &dep.equals {
        return matches!(value, Some(FieldValue::Text(s)) if s == expected);
    }

    value.is_some_and(FieldValue::is_present)
}
