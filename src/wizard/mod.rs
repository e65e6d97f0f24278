//! Wizard engine: state, transitions, visibility and step gating

pub mod action;
pub mod completion;
pub mod depends_on;
pub mod reducer;
pub mod session;
pub mod state;

pub use action::WizardAction;
pub use completion::{check_step_completion, completion_hint, CompletionResult};
pub use depends_on::evaluate_depends_on;
pub use reducer::reduce;
pub use session::{NavigationError, StepStatus, WizardSession, DEFAULT_STORAGE_KEY};
pub use state::{FieldState, FieldValue, ValidationResult, WizardState};
