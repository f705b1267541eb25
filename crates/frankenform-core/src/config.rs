#![forbid(unsafe_code)]

//! Form construction parameters.
//!
//! [`FormOptions`] holds the plain behavior flags and can be loaded from any
//! serde format. [`FormConfig`] carries everything else a form needs: the
//! initial snapshot, validation sources and callbacks.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use frankenform_core::{Form, FormConfig, Outcome, json};
//!
//! let form = Form::new(
//!     FormConfig::new(json!({"email": ""}), Arc::new(|values, _| Outcome::ready(values)))
//!         .validate_on_blur(false),
//! );
//! assert!(!form.options().validate_on_blur);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::InitialSnapshot;
use crate::submit::{ResetHandler, SubmitHandler};
use crate::tree::{ErrorTree, TouchedTree, ValueTree};
use crate::validation::{FormValidator, SchemaValidator};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What happens to `submitCount` on a reset that does not set it explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitCountPolicy {
    /// Zero the counter.
    #[default]
    Reset,
    /// Carry the counter forward.
    Preserve,
}

/// Behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Validate after value writes that do not say otherwise (default: true).
    pub validate_on_change: bool,
    /// Validate after touched writes that do not say otherwise (default: true).
    pub validate_on_blur: bool,
    /// Validate the initial values on mount and reinitialization
    /// (default: false).
    pub validate_on_mount: bool,
    /// Accept new initial values through `reinitialize` (default: false).
    pub enable_reinitialize: bool,
    /// Counter policy for resets (default: [`SubmitCountPolicy::Reset`]).
    pub submit_count_on_reset: SubmitCountPolicy,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            validate_on_mount: false,
            enable_reinitialize: false,
            submit_count_on_reset: SubmitCountPolicy::Reset,
        }
    }
}

// ---------------------------------------------------------------------------
// InitialValidity
// ---------------------------------------------------------------------------

/// Override for `isValid` while the form is not dirty.
#[derive(Clone)]
pub enum InitialValidity {
    Fixed(bool),
    Computed(Arc<dyn Fn(&InitialSnapshot) -> bool + Send + Sync>),
}

impl InitialValidity {
    /// A computed override.
    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn(&InitialSnapshot) -> bool + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(compute))
    }

    /// Resolve the override against the current initial snapshot.
    #[must_use]
    pub fn resolve(&self, initial: &InitialSnapshot) -> bool {
        match self {
            Self::Fixed(valid) => *valid,
            Self::Computed(compute) => compute(initial),
        }
    }
}

impl fmt::Debug for InitialValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(valid) => f.debug_tuple("Fixed").field(valid).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<bool> for InitialValidity {
    fn from(valid: bool) -> Self {
        Self::Fixed(valid)
    }
}

// ---------------------------------------------------------------------------
// FormConfig
// ---------------------------------------------------------------------------

/// Everything needed to build a [`Form`](crate::form::Form).
#[derive(Clone)]
pub struct FormConfig {
    pub(crate) initial: InitialSnapshot,
    pub(crate) options: FormOptions,
    pub(crate) initial_validity: Option<InitialValidity>,
    pub(crate) schema: Option<Arc<dyn SchemaValidator>>,
    pub(crate) form_validator: Option<FormValidator>,
    pub(crate) on_submit: SubmitHandler,
    pub(crate) on_reset: Option<ResetHandler>,
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("initial", &self.initial)
            .field("options", &self.options)
            .field("initial_validity", &self.initial_validity)
            .field("schema", &self.schema.is_some())
            .field("form_validator", &self.form_validator.is_some())
            .field("on_reset", &self.on_reset.is_some())
            .finish_non_exhaustive()
    }
}

impl FormConfig {
    /// A config with the given initial values and submit handler; all other
    /// settings at their defaults.
    #[must_use]
    pub fn new(initial_values: ValueTree, on_submit: SubmitHandler) -> Self {
        Self {
            initial: InitialSnapshot::with_values(initial_values),
            options: FormOptions::default(),
            initial_validity: None,
            schema: None,
            form_validator: None,
            on_submit,
            on_reset: None,
        }
    }

    #[must_use]
    pub fn initial_errors(mut self, errors: ErrorTree) -> Self {
        self.initial.errors = errors;
        self
    }

    #[must_use]
    pub fn initial_touched(mut self, touched: TouchedTree) -> Self {
        self.initial.touched = touched;
        self
    }

    #[must_use]
    pub fn initial_status(mut self, status: Value) -> Self {
        self.initial.status = status;
        self
    }

    /// Attach a schema collaborator.
    #[must_use]
    pub fn schema(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Attach a whole-form validator.
    #[must_use]
    pub fn form_validator(mut self, validator: FormValidator) -> Self {
        self.form_validator = Some(validator);
        self
    }

    /// Handler run before every reset.
    #[must_use]
    pub fn on_reset(mut self, on_reset: ResetHandler) -> Self {
        self.on_reset = Some(on_reset);
        self
    }

    /// Override `isValid` for the pristine form.
    #[must_use]
    pub fn initial_validity(mut self, validity: impl Into<InitialValidity>) -> Self {
        self.initial_validity = Some(validity.into());
        self
    }

    /// Replace all behavior flags at once.
    #[must_use]
    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn validate_on_change(mut self, enabled: bool) -> Self {
        self.options.validate_on_change = enabled;
        self
    }

    #[must_use]
    pub fn validate_on_blur(mut self, enabled: bool) -> Self {
        self.options.validate_on_blur = enabled;
        self
    }

    #[must_use]
    pub fn validate_on_mount(mut self, enabled: bool) -> Self {
        self.options.validate_on_mount = enabled;
        self
    }

    #[must_use]
    pub fn enable_reinitialize(mut self, enabled: bool) -> Self {
        self.options.enable_reinitialize = enabled;
        self
    }

    #[must_use]
    pub fn submit_count_on_reset(mut self, policy: SubmitCountPolicy) -> Self {
        self.options.submit_count_on_reset = policy;
        self
    }

    /// Current initial snapshot.
    #[must_use]
    pub fn initial(&self) -> &InitialSnapshot {
        &self.initial
    }

    /// Current behavior flags.
    #[must_use]
    pub fn current_options(&self) -> &FormOptions {
        &self.options
    }
}
