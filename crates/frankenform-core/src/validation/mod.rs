#![forbid(unsafe_code)]

//! Validation sources and their orchestration.
//!
//! Three independent sources can report errors for a form:
//!
//! | Source | Shape | Module |
//! |--------|-------|--------|
//! | Field-level | one function per registered path | [`field`] |
//! | Schema | external collaborator over the whole tree | [`schema`] |
//! | Whole-form | one function over the whole tree | [`whole_form`] |
//!
//! [`ValidationOrchestrator`] runs them concurrently and deep-merges their
//! error trees in [`ValidationSource::PRECEDENCE`] order, so for a shared
//! path the whole-form message beats the schema message, which beats the
//! field-level one.

pub mod field;
pub mod orchestrator;
pub mod rules;
pub mod schema;
pub mod whole_form;

pub use field::{FieldRegistration, FieldRegistry, FieldValidator};
pub use orchestrator::ValidationOrchestrator;
pub use rules::{Email, FieldRule, MaxLength, MinLength, Range, Required, Rules};
pub use schema::{
    FORM_LEVEL_KEY, SchemaFailure, SchemaFuture, SchemaIssue, SchemaValidator, SchemaViolation,
    violation_to_errors,
};
pub use whole_form::FormValidator;

/// Where an error tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationSource {
    FieldLevel,
    Schema,
    WholeForm,
}

impl ValidationSource {
    /// Merge order: later sources overwrite earlier ones on colliding leaves.
    pub const PRECEDENCE: [Self; 3] = [Self::FieldLevel, Self::Schema, Self::WholeForm];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldLevel => "field_level",
            Self::Schema => "schema",
            Self::WholeForm => "whole_form",
        }
    }
}
