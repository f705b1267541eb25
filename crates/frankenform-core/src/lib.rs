#![forbid(unsafe_code)]

//! Form state and validation orchestration.
//!
//! A form holds a tree of user-entered values next to parallel trees of
//! validation errors and "touched" flags, and coordinates (possibly
//! asynchronous) validation from several sources before a submit is allowed.
//!
//! # How it fits together
//!
//! | Layer | Module | Role |
//! |-------|--------|------|
//! | Paths | [`path`] | Get and set inside nested trees with `a.b[0].c` paths |
//! | Trees | [`tree`] | Tree helpers: emptiness, touch-all, sanitizing, deep merge |
//! | State | [`store`] | The state container and its atomic mutations |
//! | Validation | [`validation`] | Field, schema and whole-form sources plus the orchestrator |
//! | Submission | [`submit`] | The submit/reset state machine |
//! | Queries | [`derived`] | `dirty`, `isValid`, per-field meta |
//! | Facade | [`form`] | [`Form`] and the [`FormHelpers`] handed to callbacks |
//!
//! Every state transition is recorded in a [`FormTrace`] so tests and
//! diagnostics can check ordering without a UI.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use frankenform_core::{Form, FormConfig, FormValidator, Outcome, json};
//!
//! let form = Form::new(
//!     FormConfig::new(json!({"email": ""}), Arc::new(|values, _| Outcome::ready(values)))
//!         .form_validator(FormValidator::sync(|values| {
//!             (values["email"] == json!("")).then(|| json!({"email": "required"}))
//!         })),
//! );
//!
//! let submitted = pollster::block_on(form.submit_form()).unwrap();
//! assert_eq!(submitted, None);
//! assert_eq!(form.errors(), json!({"email": "required"}));
//! assert_eq!(form.touched(), json!({"email": true}));
//! ```

pub mod config;
pub mod derived;
pub mod error;
pub mod form;
pub mod outcome;
pub mod path;
pub mod store;
pub mod submit;
pub mod trace;
pub mod tree;
pub mod validation;

pub use config::{FormConfig, FormOptions, InitialValidity, SubmitCountPolicy};
pub use derived::FieldMeta;
pub use error::{Fault, FormError};
pub use form::{FieldTarget, Form, FormHelpers};
pub use outcome::Outcome;
pub use store::{FormState, FormStore, InitialSnapshot, Liveness, SharedStore};
pub use submit::{ResetHandler, ResetState, SubmitHandler, SubmitPhase};
pub use trace::{FormEvent, FormTrace, PassKind, PassToken};
pub use tree::{ErrorTree, TouchedTree, ValueTree};
pub use validation::{
    FieldRegistration, FieldRule, FieldValidator, FormValidator, SchemaFailure, SchemaFuture,
    SchemaIssue, SchemaValidator, SchemaViolation, ValidationOrchestrator, ValidationSource,
};

pub use serde_json::{Value, json};
