//! molt-wizard - schema-driven onboarding wizard engine for Moltworker
//!
//! The engine turns a declarative step/field schema into persistent wizard state,
//! field visibility decisions and step completion gates. It performs no network I/O
//! and renders nothing; validation and deployment are left to the caller.

pub mod config;
pub mod deploy;
pub mod logging;
pub mod schema;
pub mod store;
pub mod wizard;

pub use schema::OnboardingSchema;
pub use store::{FileStateStore, MemoryStateStore, StateStore};
pub use wizard::{WizardAction, WizardSession, WizardState};
