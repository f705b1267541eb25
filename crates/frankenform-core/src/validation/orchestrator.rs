#![forbid(unsafe_code)]

//! Runs the validation sources and writes their merged result.
//!
//! # Passes
//!
//! A *full-form pass* ([`ValidationOrchestrator::validate_form_with_high_priority`])
//! raises `isValidating`, runs every configured source concurrently, merges
//! their trees and replaces `errors` with the result. A *field pass*
//! ([`ValidationOrchestrator::validate_field`]) validates one path and writes
//! only that path's error.
//!
//! # Busy Flag
//!
//! `isValidating` stays raised while any full-form pass, any asynchronous
//! field validator, or any schema-backed field pass is in flight. A
//! synchronous field validator writes its result immediately and never
//! touches the flag.
//!
//! # Ordering
//!
//! Passes are not fenced: whichever pass completes last writes last. Every
//! completion checks [`Liveness`] first; after teardown the write is dropped
//! and the pass is recorded as discarded.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Field validator fault | Sibling results are collected, then the first fault in path order fails the pass |
//! | Schema fault (not a violation) | Pass fails with [`FormError::Schema`] |
//! | Whole-form validator fault | Pass fails with [`FormError::FormValidator`] |
//! | Any pass failure | Logged with `warn!`, busy flag released, error returned to the caller |

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use serde_json::Value;
use tracing::{Instrument, debug, warn};

use crate::error::FormError;
use crate::outcome::Outcome;
use crate::path::{get_in, get_present, set_in};
use crate::store::{Liveness, SharedStore};
use crate::trace::{FormEvent, PassKind, PassToken};
use crate::tree::{ErrorTree, empty_tree, leaf_count, merge_all, sanitize_for_validation};
use crate::validation::ValidationSource;
use crate::validation::field::{FieldRegistration, FieldRegistry};
use crate::validation::schema::{SchemaFailure, SchemaValidator, errors_at, violation_to_errors};
use crate::validation::whole_form::FormValidator;

/// Coordinates field-level, schema and whole-form validation for one form.
pub struct ValidationOrchestrator {
    registry: Mutex<FieldRegistry>,
    schema: Option<Arc<dyn SchemaValidator>>,
    form_validator: Option<FormValidator>,
    store: SharedStore,
    liveness: Liveness,
}

impl std::fmt::Debug for ValidationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationOrchestrator")
            .field("fields", &self.registry().len())
            .field("schema", &self.schema.is_some())
            .field("form_validator", &self.form_validator.is_some())
            .finish_non_exhaustive()
    }
}

impl ValidationOrchestrator {
    /// An orchestrator with no sources configured.
    #[must_use]
    pub fn new(store: SharedStore, liveness: Liveness) -> Self {
        Self {
            registry: Mutex::new(FieldRegistry::new()),
            schema: None,
            form_validator: None,
            store,
            liveness,
        }
    }

    /// Configure the schema collaborator.
    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Configure the whole-form validator.
    #[must_use]
    pub fn with_form_validator(mut self, validator: FormValidator) -> Self {
        self.form_validator = Some(validator);
        self
    }

    #[must_use]
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    #[must_use]
    pub fn has_form_validator(&self) -> bool {
        self.form_validator.is_some()
    }

    fn registry(&self) -> MutexGuard<'_, FieldRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- registry --

    /// Attach a field. Does not trigger validation.
    pub fn register_field(&self, path: impl Into<String>, registration: FieldRegistration) {
        let path = path.into();
        tracing::trace!(path = %path, "field registered");
        self.registry().register(path, registration);
    }

    /// Detach a field. Does not trigger validation.
    pub fn unregister_field(&self, path: &str) {
        if self.registry().unregister(path).is_some() {
            tracing::trace!(path, "field unregistered");
        }
    }

    /// Returns `true` if a field is attached at `path`.
    #[must_use]
    pub fn is_registered(&self, path: &str) -> bool {
        self.registry().contains(path)
    }

    // -- sources --

    /// Run every registered field validator against its current value in
    /// `values` and collect the non-empty messages into one tree.
    ///
    /// All validators run to completion. If any failed, the first failure
    /// in path order is returned instead of the tree.
    pub async fn run_field_level(&self, values: &Value) -> Result<ErrorTree, FormError> {
        let validators = self.registry().validators();
        if validators.is_empty() {
            return Ok(empty_tree());
        }

        let checks = validators.into_iter().map(|(path, validator)| {
            let value = get_in(values, &path).cloned().unwrap_or(Value::Null);
            let outcome = validator.check(&value);
            async move { (path, outcome.resolve().await) }
        });

        let mut errors = empty_tree();
        let mut first_fault = None;
        for (path, result) in join_all(checks).await {
            match result {
                Ok(Some(message)) if !message.is_empty() => {
                    set_in(&mut errors, &path, Value::String(message));
                }
                Ok(_) => {}
                Err(fault) => {
                    if first_fault.is_none() {
                        first_fault = Some(FormError::FieldValidator { path, fault });
                    }
                }
            }
        }

        match first_fault {
            Some(error) => Err(error),
            None => Ok(errors),
        }
    }

    /// Validate sanitized `values` with the schema collaborator.
    ///
    /// With `field`, only that path is validated (through
    /// [`SchemaValidator::validate_at`] when the schema supports it) and
    /// only that path's error is kept.
    pub async fn run_schema_level(
        &self,
        values: &Value,
        field: Option<&str>,
    ) -> Result<ErrorTree, FormError> {
        let Some(schema) = &self.schema else {
            return Ok(empty_tree());
        };
        let sanitized = sanitize_for_validation(values);
        let check = match field {
            Some(path) => schema
                .validate_at(path, &sanitized)
                .unwrap_or_else(|| schema.validate(&sanitized)),
            None => schema.validate(&sanitized),
        };

        let errors = match check.await {
            Ok(()) => empty_tree(),
            Err(SchemaFailure::Invalid(violation)) => violation_to_errors(&violation),
            Err(SchemaFailure::Fault(fault)) => return Err(FormError::Schema { fault }),
        };

        Ok(match field {
            Some(path) => errors_at(&errors, path),
            None => errors,
        })
    }

    /// Run the whole-form validator. No validator, or no result, is an
    /// empty tree.
    pub async fn run_whole_form(&self, values: &Value) -> Result<ErrorTree, FormError> {
        let Some(validator) = &self.form_validator else {
            return Ok(empty_tree());
        };
        match validator.check(values).resolve().await {
            Ok(errors) => Ok(errors.filter(|tree| !tree.is_null()).unwrap_or_else(empty_tree)),
            Err(fault) => Err(FormError::FormValidator { fault }),
        }
    }

    /// Run all three sources concurrently and deep-merge their trees in
    /// [`ValidationSource::PRECEDENCE`] order.
    ///
    /// If more than one source fails, the earliest in precedence order is
    /// reported.
    pub async fn run_all(&self, values: &Value) -> Result<ErrorTree, FormError> {
        let (field_level, schema, whole_form) = futures::join!(
            self.run_field_level(values),
            self.run_schema_level(values, None),
            self.run_whole_form(values),
        );

        let mut trees = Vec::with_capacity(ValidationSource::PRECEDENCE.len());
        for (source, result) in ValidationSource::PRECEDENCE
            .into_iter()
            .zip([field_level, schema, whole_form])
        {
            let tree = result?;
            debug!(source = source.as_str(), errors = leaf_count(&tree), "source finished");
            trees.push(tree);
        }
        Ok(merge_all(&trees))
    }

    // -- passes --

    /// Full-form pass against `values` (or the current values when `None`).
    ///
    /// Raises `isValidating` for the duration, writes the merged tree with
    /// `setErrors` and returns it. A failed pass returns the fault instead
    /// of a tree, so callers can tell the two apart.
    pub async fn validate_form_with_high_priority(
        &self,
        values: Option<Value>,
    ) -> Result<ErrorTree, FormError> {
        let values = values.unwrap_or_else(|| self.store.values());
        let token = self.store.update(|store| {
            let token = store.begin_pass(PassKind::Form);
            store.enter_validation();
            token
        });
        let span = tracing::debug_span!("validate_form", pass = %token);
        let result = self.run_all(&values).instrument(span).await;

        if !self.discard_if_torn_down(token) {
            return result;
        }
        match result {
            Ok(errors) => {
                let error_count = leaf_count(&errors);
                self.store.update(|store| {
                    store.set_errors(errors.clone());
                    store.leave_validation();
                    store.record(FormEvent::PassApplied { token, error_count });
                });
                debug!(pass = %token, error_count, "form pass applied");
                Ok(errors)
            }
            Err(error) => {
                self.fail_pass(token, &error);
                Err(error)
            }
        }
    }

    /// Validate a single field and write its error.
    ///
    /// Resolution order: the field's registered validator, then the schema
    /// (partial validation), then nothing. Returns the field's message; an
    /// empty message counts as none.
    pub async fn validate_field(&self, path: &str) -> Result<Option<String>, FormError> {
        let validator = self.registry().validator(path);
        if let Some(validator) = validator {
            let value = self
                .store
                .read(|store| get_in(&store.state().values, path).cloned())
                .unwrap_or(Value::Null);
            return match validator.check(&value) {
                Outcome::Ready(result) => {
                    let message = result
                        .map_err(|fault| FormError::FieldValidator {
                            path: path.to_owned(),
                            fault,
                        })?
                        .filter(|message| !message.is_empty());
                    self.store.update(|store| {
                        store.set_field_error(path, message.clone().map(Value::String));
                    });
                    Ok(message)
                }
                Outcome::Pending(check) => {
                    let token = self.begin_field_pass();
                    let result = check.await.map_err(|fault| FormError::FieldValidator {
                        path: path.to_owned(),
                        fault,
                    });
                    let error = result.map(|message| {
                        message
                            .filter(|message| !message.is_empty())
                            .map(Value::String)
                    });
                    self.finish_field_pass(token, path, error)
                }
            };
        }

        if self.schema.is_some() {
            let values = self.store.values();
            let token = self.begin_field_pass();
            let error = self
                .run_schema_level(&values, Some(path))
                .await
                .map(|errors| get_present(&errors, path).cloned());
            return self.finish_field_pass(token, path, error);
        }

        Ok(None)
    }

    fn begin_field_pass(&self) -> PassToken {
        self.store.update(|store| {
            let token = store.begin_pass(PassKind::Field);
            store.enter_validation();
            token
        })
    }

    fn finish_field_pass(
        &self,
        token: PassToken,
        path: &str,
        result: Result<Option<Value>, FormError>,
    ) -> Result<Option<String>, FormError> {
        if !self.discard_if_torn_down(token) {
            return result.map(|error| error.map(render_message));
        }
        match result {
            Ok(error) => {
                let error_count = usize::from(error.is_some());
                self.store.update(|store| {
                    store.set_field_error(path, error.clone());
                    store.leave_validation();
                    store.record(FormEvent::PassApplied { token, error_count });
                });
                debug!(pass = %token, path, error_count, "field pass applied");
                Ok(error.map(render_message))
            }
            Err(error) => {
                self.fail_pass(token, &error);
                Err(error)
            }
        }
    }

    /// Returns `true` if the form is live. Otherwise records the pass as
    /// discarded, stops counting it as in flight and returns `false`.
    fn discard_if_torn_down(&self, token: PassToken) -> bool {
        if self.liveness.is_live() {
            return true;
        }
        self.store.update(|store| {
            store.abandon_validation();
            store.record(FormEvent::PassDiscarded { token });
        });
        debug!(pass = %token, "pass completed after teardown; write dropped");
        false
    }

    fn fail_pass(&self, token: PassToken, error: &FormError) {
        warn!(
            pass = %token,
            origin = error.origin(),
            error = %error,
            "validation pass failed"
        );
        self.store.update(|store| {
            store.leave_validation();
            store.record(FormEvent::PassFailed { token });
        });
    }
}

fn render_message(error: Value) -> String {
    match error {
        Value::String(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::store::{FormStore, InitialSnapshot};
    use crate::validation::field::FieldValidator;
    use crate::validation::schema::{SchemaFuture, SchemaIssue, SchemaViolation};
    use futures::FutureExt;
    use futures::channel::oneshot;
    use serde_json::json;

    fn setup(values: Value) -> (ValidationOrchestrator, SharedStore, Liveness) {
        let store = SharedStore::new(FormStore::new(InitialSnapshot::with_values(values)));
        let liveness = Liveness::new();
        let orchestrator = ValidationOrchestrator::new(store.clone(), liveness.clone());
        (orchestrator, store, liveness)
    }

    fn message_validator(message: &'static str) -> FieldRegistration {
        FieldRegistration::with_validator(FieldValidator::sync(move |_| Some(message.into())))
    }

    fn schema_with(issues: Vec<SchemaIssue>) -> Arc<dyn SchemaValidator> {
        Arc::new(move |_: &Value| -> SchemaFuture {
            let issues = issues.clone();
            async move {
                if issues.is_empty() {
                    Ok(())
                } else {
                    Err(SchemaViolation::from_issues(issues).into())
                }
            }
            .boxed()
        })
    }

    /// A whole-form validator gated on a oneshot, plus its sender.
    fn gated_form_validator(errors: Value) -> (FormValidator, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(rx)));
        let validator = FormValidator::asynchronous(move |_| {
            let gate = gate.lock().unwrap().take();
            let errors = errors.clone();
            async move {
                if let Some(rx) = gate {
                    rx.await.map_err(|_| Fault::new("gate dropped"))?;
                }
                Ok::<_, Fault>(Some(errors))
            }
        });
        (validator, tx)
    }

    #[test]
    fn field_level_reads_current_values() {
        let (orchestrator, _, _) = setup(json!({}));
        orchestrator.register_field(
            "user.name",
            FieldRegistration::with_validator(FieldValidator::sync(|value| {
                (value.as_str().unwrap_or_default().len() < 3).then(|| "short".to_string())
            })),
        );
        let errors = pollster::block_on(
            orchestrator.run_field_level(&json!({"user": {"name": "al"}})),
        )
        .unwrap();
        assert_eq!(errors, json!({"user": {"name": "short"}}));

        let errors = pollster::block_on(
            orchestrator.run_field_level(&json!({"user": {"name": "alice"}})),
        )
        .unwrap();
        assert_eq!(errors, json!({}));
    }

    #[test]
    fn field_level_skips_empty_messages_and_bare_registrations() {
        let (orchestrator, _, _) = setup(json!({}));
        orchestrator.register_field("a", message_validator(""));
        orchestrator.register_field("b", FieldRegistration::default());
        let errors = pollster::block_on(orchestrator.run_field_level(&json!({}))).unwrap();
        assert_eq!(errors, json!({}));
    }

    #[test]
    fn field_level_fault_fails_whole_pass() {
        let (orchestrator, _, _) = setup(json!({}));
        orchestrator.register_field("a", message_validator("bad"));
        orchestrator.register_field(
            "b",
            FieldRegistration::with_validator(FieldValidator::new(|_| Outcome::fail("boom"))),
        );
        orchestrator.register_field(
            "c",
            FieldRegistration::with_validator(FieldValidator::new(|_| Outcome::fail("later"))),
        );
        let error = pollster::block_on(orchestrator.run_field_level(&json!({}))).unwrap_err();
        assert_eq!(
            error,
            FormError::FieldValidator {
                path: "b".into(),
                fault: Fault::new("boom"),
            }
        );
    }

    #[test]
    fn schema_level_sanitizes_empty_strings() {
        let seen = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let (orchestrator, _, _) = setup(json!({}));
        let orchestrator = orchestrator.with_schema(Arc::new(move |values: &Value| -> SchemaFuture {
            *captured.lock().unwrap() = Some(values.clone());
            async { Ok(()) }.boxed()
        }));
        pollster::block_on(orchestrator.run_schema_level(&json!({"a": "", "b": ["", "x"]}), None))
            .unwrap();
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(json!({"a": null, "b": [null, "x"]}))
        );
    }

    #[test]
    fn schema_level_normalizes_violations() {
        let (orchestrator, _, _) = setup(json!({}));
        let orchestrator = orchestrator.with_schema(schema_with(vec![
            SchemaIssue::new("email", "required"),
            SchemaIssue::new("email", "invalid"),
            SchemaIssue::new("name", "too short"),
        ]));
        let all = pollster::block_on(orchestrator.run_schema_level(&json!({}), None)).unwrap();
        assert_eq!(all, json!({"email": "required", "name": "too short"}));

        let one =
            pollster::block_on(orchestrator.run_schema_level(&json!({}), Some("name"))).unwrap();
        assert_eq!(one, json!({"name": "too short"}));
    }

    #[test]
    fn schema_fault_is_not_a_violation() {
        let (orchestrator, _, _) = setup(json!({}));
        let orchestrator = orchestrator.with_schema(Arc::new(|_: &Value| -> SchemaFuture {
            async { Err(Fault::new("schema exploded").into()) }.boxed()
        }));
        let error = pollster::block_on(orchestrator.run_schema_level(&json!({}), None)).unwrap_err();
        assert_eq!(error.origin(), "schema");
    }

    #[test]
    fn whole_form_none_is_empty() {
        let (orchestrator, _, _) = setup(json!({}));
        let orchestrator = orchestrator.with_form_validator(FormValidator::sync(|_| None));
        assert_eq!(
            pollster::block_on(orchestrator.run_whole_form(&json!({}))).unwrap(),
            json!({})
        );
    }

    #[test]
    fn run_all_merges_in_precedence_order() {
        let (orchestrator, _, _) = setup(json!({}));
        orchestrator.register_field("a", message_validator("f"));
        let orchestrator = orchestrator
            .with_schema(schema_with(vec![
                SchemaIssue::new("a", "s"),
                SchemaIssue::new("b", "s2"),
            ]))
            .with_form_validator(FormValidator::sync(|_| Some(json!({"a": "w"}))));
        let merged = pollster::block_on(orchestrator.run_all(&json!({}))).unwrap();
        assert_eq!(merged, json!({"a": "w", "b": "s2"}));
    }

    #[test]
    fn form_pass_writes_errors_and_clears_flag() {
        let (orchestrator, store, _) = setup(json!({"a": ""}));
        let orchestrator = orchestrator
            .with_form_validator(FormValidator::sync(|_| Some(json!({"a": "required"}))));
        let errors =
            pollster::block_on(orchestrator.validate_form_with_high_priority(None)).unwrap();
        assert_eq!(errors, json!({"a": "required"}));
        let state = store.snapshot();
        assert_eq!(state.errors, json!({"a": "required"}));
        assert!(!state.is_validating);
        store.read(|store| {
            assert_eq!(store.trace().count("pass_applied"), 1);
            assert!(store.trace().verify_invariants().is_empty());
        });
    }

    #[test]
    fn flag_is_raised_while_form_pass_in_flight() {
        let (orchestrator, store, _) = setup(json!({}));
        let (validator, tx) = gated_form_validator(json!({}));
        let orchestrator = orchestrator.with_form_validator(validator);

        let (result, ()) = pollster::block_on(async {
            futures::join!(orchestrator.validate_form_with_high_priority(None), async {
                assert!(store.snapshot().is_validating);
                tx.send(()).unwrap();
            })
        });
        assert!(result.is_ok());
        assert!(!store.snapshot().is_validating);
    }

    #[test]
    fn failed_form_pass_propagates_and_releases_flag() {
        let (orchestrator, store, _) = setup(json!({}));
        store.update(|store| store.set_errors(json!({"keep": "me"})));
        let orchestrator =
            orchestrator.with_form_validator(FormValidator::new(|_| Outcome::fail("nope")));
        let error =
            pollster::block_on(orchestrator.validate_form_with_high_priority(None)).unwrap_err();
        assert_eq!(error, FormError::FormValidator { fault: Fault::new("nope") });
        let state = store.snapshot();
        assert!(!state.is_validating);
        assert_eq!(state.errors, json!({"keep": "me"}));
        store.read(|store| assert_eq!(store.trace().count("pass_failed"), 1));
    }

    #[test]
    fn torn_down_form_pass_writes_nothing() {
        let (orchestrator, store, liveness) = setup(json!({}));
        let (validator, tx) = gated_form_validator(json!({"a": "late"}));
        let orchestrator = orchestrator.with_form_validator(validator);

        let (result, ()) = pollster::block_on(async {
            futures::join!(orchestrator.validate_form_with_high_priority(None), async {
                liveness.teardown();
                tx.send(()).unwrap();
            })
        });
        assert_eq!(result.unwrap(), json!({"a": "late"}));
        assert_eq!(store.snapshot().errors, json!({}));
        store.read(|store| {
            assert_eq!(store.trace().count("pass_discarded"), 1);
            assert!(!store.trace().contains_event_type("errors_changed"));
        });
    }

    #[test]
    fn discarded_pass_stops_counting_as_in_flight() {
        let (orchestrator, store, liveness) = setup(json!({}));
        let (validator, tx) = gated_form_validator(json!({}));
        let orchestrator = orchestrator.with_form_validator(validator);

        let (result, ()) = pollster::block_on(async {
            futures::join!(orchestrator.validate_form_with_high_priority(None), async {
                liveness.teardown();
                tx.send(()).unwrap();
            })
        });
        assert!(result.is_ok());
        store.read(|store| assert_eq!(store.passes_in_flight(), 0));

        liveness.revive();
        store.update(FormStore::sync_validating);
        assert!(!store.snapshot().is_validating);

        // The gate is spent, so the next pass resolves immediately.
        pollster::block_on(orchestrator.validate_form_with_high_priority(None)).unwrap();
        store.read(|store| assert_eq!(store.passes_in_flight(), 0));
        assert!(!store.snapshot().is_validating);
    }

    #[test]
    fn sync_field_validator_never_raises_flag() {
        let (orchestrator, store, _) = setup(json!({"a": 1}));
        orchestrator.register_field("a", message_validator("bad"));
        let (first, second) = pollster::block_on(async {
            futures::join!(orchestrator.validate_field("a"), orchestrator.validate_field("a"))
        });
        assert_eq!(first.unwrap(), Some("bad".into()));
        assert_eq!(second.unwrap(), Some("bad".into()));
        assert_eq!(store.snapshot().errors, json!({"a": "bad"}));
        store.read(|store| {
            assert!(!store.trace().contains_event_type("validating_changed"));
            assert_eq!(store.trace().count("field_error_set"), 1);
        });
    }

    #[test]
    fn async_field_validator_raises_flag() {
        let (orchestrator, store, _) = setup(json!({"name": "x"}));
        let (tx, rx) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(rx)));
        orchestrator.register_field(
            "name",
            FieldRegistration::with_validator(FieldValidator::asynchronous(move |value: Value| {
                let gate = gate.lock().unwrap().take();
                async move {
                    if let Some(rx) = gate {
                        let _ = rx.await;
                    }
                    Ok((value == json!("x")).then(|| "taken".to_string()))
                }
            })),
        );

        let (result, ()) = pollster::block_on(async {
            futures::join!(orchestrator.validate_field("name"), async {
                assert!(store.snapshot().is_validating);
                tx.send(()).unwrap();
            })
        });
        assert_eq!(result.unwrap(), Some("taken".into()));
        let state = store.snapshot();
        assert!(!state.is_validating);
        assert_eq!(state.errors, json!({"name": "taken"}));
    }

    #[test]
    fn empty_message_clears_field_error() {
        let (orchestrator, store, _) = setup(json!({"a": 1}));
        store.update(|store| store.set_errors(json!({"a": "old", "b": "other"})));
        orchestrator.register_field("a", message_validator(""));
        let message = pollster::block_on(orchestrator.validate_field("a")).unwrap();
        assert_eq!(message, None);
        assert_eq!(store.snapshot().errors, json!({"b": "other"}));
    }

    #[test]
    fn field_falls_back_to_schema() {
        let (orchestrator, store, _) = setup(json!({"email": "", "name": ""}));
        let orchestrator = orchestrator.with_schema(schema_with(vec![
            SchemaIssue::new("email", "required"),
            SchemaIssue::new("name", "required"),
        ]));
        let message = pollster::block_on(orchestrator.validate_field("email")).unwrap();
        assert_eq!(message, Some("required".into()));
        let state = store.snapshot();
        assert_eq!(state.errors, json!({"email": "required"}));
        assert!(!state.is_validating);
        store.read(|store| assert_eq!(store.trace().count("validating_changed"), 2));
    }

    #[test]
    fn field_without_any_source_is_noop() {
        let (orchestrator, store, _) = setup(json!({"a": 1}));
        assert_eq!(pollster::block_on(orchestrator.validate_field("a")).unwrap(), None);
        store.read(|store| assert!(store.trace().is_empty()));
    }

    #[test]
    fn registry_changes_do_not_validate() {
        let (orchestrator, store, _) = setup(json!({"a": 1}));
        orchestrator.register_field("a", message_validator("bad"));
        assert!(orchestrator.is_registered("a"));
        orchestrator.unregister_field("a");
        assert!(!orchestrator.is_registered("a"));
        store.read(|store| assert!(store.trace().is_empty()));
    }
}
