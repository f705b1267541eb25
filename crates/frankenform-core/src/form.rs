#![forbid(unsafe_code)]

//! The form handle.
//!
//! [`Form`] wires a [`SharedStore`], a [`ValidationOrchestrator`] and a
//! [`SubmissionController`] together from a [`FormConfig`]. It is cheap to
//! clone; clones share the same state.
//!
//! Writes that can trigger validation are `async`: they mutate immediately
//! and then, when validation applies, await a full-form pass and return its
//! error tree. Whether validation applies is decided by the explicit
//! `should_validate` argument, or by the matching option when it is `None`:
//!
//! | Write | Option consulted |
//! |-------|------------------|
//! | `set_values`, `set_values_with`, `set_field_value`, `handle_change` | `validate_on_change` |
//! | `set_touched`, `set_field_touched`, `handle_blur` | `validate_on_blur` |

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{FormConfig, FormOptions, InitialValidity};
use crate::derived::{self, FieldMeta};
use crate::error::FormError;
use crate::path;
use crate::store::{FormState, FormStore, InitialSnapshot, Liveness, SharedStore};
use crate::submit::{ResetState, SubmissionController, SubmitPhase};
use crate::trace::FormTrace;
use crate::tree::{ErrorTree, TouchedTree, ValueTree};
use crate::validation::{FieldRegistration, ValidationOrchestrator};

/// Identifies the field behind a change or blur event.
///
/// The path is resolved from `path`, else `name`, else `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTarget {
    pub path: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
}

impl FieldTarget {
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The first non-empty of path, name and id.
    #[must_use]
    pub fn resolve(&self) -> Option<&str> {
        [&self.path, &self.name, &self.id]
            .into_iter()
            .filter_map(Option::as_deref)
            .find(|candidate| !path::segments(candidate).is_empty())
    }
}

#[derive(Debug)]
struct FormInner {
    store: SharedStore,
    liveness: Liveness,
    orchestrator: Arc<ValidationOrchestrator>,
    submission: SubmissionController,
    options: FormOptions,
    initial_validity: Option<InitialValidity>,
}

/// A form instance.
#[derive(Debug, Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    /// Build a live form from `config`. Validation does not run until
    /// [`mount`](Self::mount) or a write asks for it.
    #[must_use]
    pub fn new(config: FormConfig) -> Self {
        let FormConfig {
            initial,
            options,
            initial_validity,
            schema,
            form_validator,
            on_submit,
            on_reset,
        } = config;

        let store = SharedStore::new(FormStore::new(initial));
        let liveness = Liveness::new();

        let mut orchestrator = ValidationOrchestrator::new(store.clone(), liveness.clone());
        if let Some(schema) = schema {
            orchestrator = orchestrator.with_schema(schema);
        }
        if let Some(validator) = form_validator {
            orchestrator = orchestrator.with_form_validator(validator);
        }
        let orchestrator = Arc::new(orchestrator);

        let mut submission = SubmissionController::new(
            store.clone(),
            Arc::clone(&orchestrator),
            liveness.clone(),
            on_submit,
        )
        .with_submit_count_policy(options.submit_count_on_reset);
        if let Some(on_reset) = on_reset {
            submission = submission.with_reset_handler(on_reset);
        }

        Self {
            inner: Arc::new(FormInner {
                store,
                liveness,
                orchestrator,
                submission,
                options,
                initial_validity,
            }),
        }
    }

    /// The imperative helper bundle handed to submit and reset handlers.
    #[must_use]
    pub fn helpers(&self) -> FormHelpers {
        FormHelpers { form: self.clone() }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Clone of the current state.
    #[must_use]
    pub fn state(&self) -> FormState {
        self.inner.store.snapshot()
    }

    #[must_use]
    pub fn values(&self) -> ValueTree {
        self.inner.store.values()
    }

    #[must_use]
    pub fn errors(&self) -> ErrorTree {
        self.inner.store.read(|store| store.state().errors.clone())
    }

    #[must_use]
    pub fn touched(&self) -> TouchedTree {
        self.inner.store.read(|store| store.state().touched.clone())
    }

    #[must_use]
    pub fn status(&self) -> Value {
        self.inner.store.read(|store| store.state().status.clone())
    }

    /// Clone of the initial snapshot.
    #[must_use]
    pub fn initial(&self) -> InitialSnapshot {
        self.inner.store.initial()
    }

    #[must_use]
    pub fn options(&self) -> FormOptions {
        self.inner.options
    }

    /// Values differ from the initial snapshot.
    #[must_use]
    pub fn dirty(&self) -> bool {
        self.inner
            .store
            .read(|store| derived::is_dirty(store.initial(), store.state()))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.store.read(|store| {
            derived::is_valid(
                store.initial(),
                store.state(),
                self.inner.initial_validity.as_ref(),
            )
        })
    }

    #[must_use]
    pub fn field_meta(&self, path: &str) -> FieldMeta {
        self.inner
            .store
            .read(|store| derived::field_meta(store.initial(), store.state(), path))
    }

    #[must_use]
    pub fn submit_phase(&self) -> SubmitPhase {
        self.inner.submission.phase()
    }

    /// The terminal phase of the most recent submit attempt.
    #[must_use]
    pub fn last_submit_phase(&self) -> Option<SubmitPhase> {
        self.inner.submission.last_settled()
    }

    /// Clone of the event trace.
    #[must_use]
    pub fn trace(&self) -> FormTrace {
        self.inner.store.read(|store| store.trace().clone())
    }

    /// Drop all recorded events.
    pub fn clear_trace(&self) {
        self.inner.store.update(|store| store.trace_mut().clear());
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.liveness.is_live()
    }

    /// The shared store, for callers that need several reads under one lock.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Mark the form live and, with `validate_on_mount`, validate the
    /// initial values.
    pub async fn mount(&self) -> Result<Option<ErrorTree>, FormError> {
        self.inner.liveness.revive();
        self.inner.store.update(FormStore::sync_validating);
        if !self.inner.options.validate_on_mount {
            return Ok(None);
        }
        let initial = self.initial().values;
        self.validate_form(Some(initial)).await.map(Some)
    }

    /// Mark the form torn down. Passes and handlers still in flight finish,
    /// but their state writes are dropped.
    pub fn teardown(&self) {
        debug!("form torn down");
        self.inner.liveness.teardown();
    }

    /// Accept a new upstream initial snapshot.
    ///
    /// Only with `enable_reinitialize` and while live. New initial values
    /// reset the form (and revalidate with `validate_on_mount`); new initial
    /// errors, touched flags or status are written through directly.
    pub async fn reinitialize(&self, next: InitialSnapshot) -> Result<(), FormError> {
        if !self.inner.options.enable_reinitialize || !self.is_live() {
            return Ok(());
        }
        let current = self.initial();

        if current.values != next.values {
            let values = next.values.clone();
            self.inner
                .store
                .update(|store| store.update_initial(|initial| initial.values = values));
            self.reset_form(None).await?;
            if self.inner.options.validate_on_mount {
                self.validate_form(Some(next.values.clone())).await?;
            }
        }
        if current.errors != next.errors {
            self.inner.store.update(|store| {
                store.update_initial(|initial| initial.errors = next.errors.clone());
                store.set_errors(next.errors.clone());
            });
        }
        if current.touched != next.touched {
            self.inner.store.update(|store| {
                store.update_initial(|initial| initial.touched = next.touched.clone());
                store.set_touched(next.touched.clone());
            });
        }
        if current.status != next.status {
            self.inner.store.update(|store| {
                store.update_initial(|initial| initial.status = next.status.clone());
                store.set_status(next.status.clone());
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Field registry
    // -----------------------------------------------------------------------

    pub fn register_field(&self, path: impl Into<String>, registration: FieldRegistration) {
        self.inner.orchestrator.register_field(path, registration);
    }

    pub fn unregister_field(&self, path: &str) {
        self.inner.orchestrator.unregister_field(path);
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    async fn validate_if(
        &self,
        enabled: bool,
        values: Option<Value>,
    ) -> Result<Option<ErrorTree>, FormError> {
        if !enabled {
            return Ok(None);
        }
        self.validate_form(values).await.map(Some)
    }

    fn on_change(&self, should_validate: Option<bool>) -> bool {
        should_validate.unwrap_or(self.inner.options.validate_on_change)
    }

    fn on_blur(&self, should_validate: Option<bool>) -> bool {
        should_validate.unwrap_or(self.inner.options.validate_on_blur)
    }

    /// Replace all values.
    pub async fn set_values(
        &self,
        values: ValueTree,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.inner
            .store
            .update(|store| store.set_values(values.clone()));
        self.validate_if(self.on_change(should_validate), Some(values))
            .await
    }

    /// Replace all values with a function of the current ones.
    pub async fn set_values_with<F>(
        &self,
        update: F,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError>
    where
        F: FnOnce(&ValueTree) -> ValueTree,
    {
        let values = self.inner.store.update(|store| {
            let next = update(&store.state().values);
            store.set_values(next.clone());
            next
        });
        self.validate_if(self.on_change(should_validate), Some(values))
            .await
    }

    /// Replace the touched tree.
    pub async fn set_touched(
        &self,
        touched: TouchedTree,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.inner.store.update(|store| store.set_touched(touched));
        self.validate_if(self.on_blur(should_validate), None).await
    }

    /// Write one value.
    pub async fn set_field_value(
        &self,
        path: &str,
        value: Value,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        if !accepts_path(path, "set_field_value") {
            return Ok(None);
        }
        self.inner
            .store
            .update(|store| store.set_field_value(path, value));
        self.validate_if(self.on_change(should_validate), None).await
    }

    /// Write one touched flag.
    pub async fn set_field_touched(
        &self,
        path: &str,
        touched: bool,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        if !accepts_path(path, "set_field_touched") {
            return Ok(None);
        }
        self.inner
            .store
            .update(|store| store.set_field_touched(path, touched));
        self.validate_if(self.on_blur(should_validate), None).await
    }

    /// A control's value changed.
    pub async fn handle_change(
        &self,
        target: &FieldTarget,
        value: Value,
    ) -> Result<Option<ErrorTree>, FormError> {
        let Some(path) = target.resolve() else {
            warn!(?target, "change event without a resolvable field path dropped");
            return Ok(None);
        };
        self.set_field_value(path, value, None).await
    }

    /// A control lost focus.
    pub async fn handle_blur(&self, target: &FieldTarget) -> Result<Option<ErrorTree>, FormError> {
        let Some(path) = target.resolve() else {
            warn!(?target, "blur event without a resolvable field path dropped");
            return Ok(None);
        };
        self.set_field_touched(path, true, None).await
    }

    /// Replace the errors tree. Structurally equal trees are ignored.
    pub fn set_errors(&self, errors: ErrorTree) {
        self.inner.store.update(|store| store.set_errors(errors));
    }

    /// Write or clear (`None`) one error.
    pub fn set_field_error(&self, path: &str, error: Option<Value>) {
        self.inner
            .store
            .update(|store| store.set_field_error(path, error));
    }

    pub fn set_status(&self, status: Value) {
        self.inner.store.update(|store| store.set_status(status));
    }

    pub fn set_submitting(&self, is_submitting: bool) {
        self.inner
            .store
            .update(|store| store.set_submitting(is_submitting));
    }

    pub fn set_validating(&self, is_validating: bool) {
        self.inner
            .store
            .update(|store| store.set_validating(is_validating));
    }

    /// Apply an arbitrary transformation to the whole state atomically.
    pub fn set_form_state<F>(&self, transform: F)
    where
        F: FnOnce(&mut FormState),
    {
        self.inner.store.update(|store| store.apply(transform));
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Full-form pass against `values`, or the current values when `None`.
    pub async fn validate_form(&self, values: Option<Value>) -> Result<ErrorTree, FormError> {
        self.inner
            .orchestrator
            .validate_form_with_high_priority(values)
            .await
    }

    /// Validate one field and write its error.
    pub async fn validate_field(&self, path: &str) -> Result<Option<String>, FormError> {
        self.inner.orchestrator.validate_field(path).await
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Run a submit attempt. See [`SubmissionController::submit_form`].
    pub async fn submit_form(&self) -> Result<Option<Value>, FormError> {
        self.inner.submission.submit_form(self.helpers()).await
    }

    /// Submit and log a failure instead of returning it.
    pub async fn handle_submit(&self) {
        if let Err(error) = self.submit_form().await {
            warn!(origin = error.origin(), error = %error, "unhandled submit failure");
        }
    }

    /// Reset to `next`, falling back to the initial snapshot.
    pub async fn reset_form(&self, next: Option<ResetState>) -> Result<(), FormError> {
        self.inner
            .submission
            .reset_form(next, self.helpers())
            .await
    }

    /// Reset to the initial snapshot and log a failure instead of
    /// returning it.
    pub async fn handle_reset(&self) {
        if let Err(error) = self.reset_form(None).await {
            warn!(origin = error.origin(), error = %error, "unhandled reset failure");
        }
    }
}

fn accepts_path(path: &str, operation: &'static str) -> bool {
    if path::segments(path).is_empty() {
        warn!(operation, path, "field write without a resolvable path dropped");
        return false;
    }
    true
}

/// The imperative operations handed to submit and reset handlers.
#[derive(Debug, Clone)]
pub struct FormHelpers {
    form: Form,
}

impl FormHelpers {
    /// The form these helpers act on.
    #[must_use]
    pub fn form(&self) -> &Form {
        &self.form
    }

    pub async fn reset_form(&self, next: Option<ResetState>) -> Result<(), FormError> {
        self.form.reset_form(next).await
    }

    pub async fn validate_form(&self, values: Option<Value>) -> Result<ErrorTree, FormError> {
        self.form.validate_form(values).await
    }

    pub async fn validate_field(&self, path: &str) -> Result<Option<String>, FormError> {
        self.form.validate_field(path).await
    }

    pub fn set_errors(&self, errors: ErrorTree) {
        self.form.set_errors(errors);
    }

    pub fn set_field_error(&self, path: &str, error: Option<Value>) {
        self.form.set_field_error(path, error);
    }

    pub async fn set_field_touched(
        &self,
        path: &str,
        touched: bool,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.form
            .set_field_touched(path, touched, should_validate)
            .await
    }

    pub async fn set_field_value(
        &self,
        path: &str,
        value: Value,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.form
            .set_field_value(path, value, should_validate)
            .await
    }

    pub fn set_status(&self, status: Value) {
        self.form.set_status(status);
    }

    pub fn set_submitting(&self, is_submitting: bool) {
        self.form.set_submitting(is_submitting);
    }

    pub async fn set_touched(
        &self,
        touched: TouchedTree,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.form.set_touched(touched, should_validate).await
    }

    pub async fn set_values(
        &self,
        values: ValueTree,
        should_validate: Option<bool>,
    ) -> Result<Option<ErrorTree>, FormError> {
        self.form.set_values(values, should_validate).await
    }

    pub fn set_form_state<F>(&self, transform: F)
    where
        F: FnOnce(&mut FormState),
    {
        self.form.set_form_state(transform);
    }

    pub async fn submit_form(&self) -> Result<Option<Value>, FormError> {
        self.form.submit_form().await
    }
}
