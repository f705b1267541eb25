#![forbid(unsafe_code)]

//! The submission state machine.
//!
//! ```text
//! Idle ─▶ Validating ─┬─▶ Submitting ─┬─▶ Succeeded ─▶ Idle
//!                     │               └─▶ Failed    ─▶ Idle
//!                     └─▶ Invalid ─▶ Idle
//! ```
//!
//! Every attempt bumps `submitCount` and marks all fields touched before
//! validating. Invalid data (a non-empty error tree) ends the attempt
//! quietly; a *fault* from a validator ends it with an error so callers do
//! not mistake it for invalid data.
//!
//! A submit handler that answers synchronously leaves `isSubmitting` raised:
//! the caller owns clearing it (through [`FormHelpers::set_submitting`]).
//! An asynchronous handler clears it when its future settles.
//!
//! [`FormHelpers::set_submitting`]: crate::form::FormHelpers::set_submitting

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Instrument, debug, warn};

use crate::config::SubmitCountPolicy;
use crate::error::{Fault, FormError};
use crate::form::FormHelpers;
use crate::outcome::Outcome;
use crate::store::{FormState, InitialSnapshot, Liveness, SharedStore};
use crate::trace::FormEvent;
use crate::tree::{ErrorTree, TouchedTree, ValueTree, has_errors};
use crate::validation::ValidationOrchestrator;

/// Called with the validated values once a submit attempt passes
/// validation. The resolved value is handed back to the submitter.
pub type SubmitHandler = Arc<dyn Fn(Value, FormHelpers) -> Outcome<Value> + Send + Sync>;

/// Called with the pre-reset values before a reset is applied.
pub type ResetHandler = Arc<dyn Fn(Value, FormHelpers) -> Outcome<()> + Send + Sync>;

/// Where the submission state machine is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
    Invalid,
}

impl SubmitPhase {
    /// Terminal phases settle back to `Idle`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Invalid)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
        }
    }
}

/// Overrides for a reset. Unset trees fall back to the initial snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetState {
    pub values: Option<ValueTree>,
    pub errors: Option<ErrorTree>,
    pub touched: Option<TouchedTree>,
    pub status: Option<Value>,
    pub is_submitting: bool,
    pub is_validating: bool,
    /// Wins over the configured [`SubmitCountPolicy`] when set.
    pub submit_count: Option<u32>,
}

impl ResetState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_values(mut self, values: ValueTree) -> Self {
        self.values = Some(values);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: ErrorTree) -> Self {
        self.errors = Some(errors);
        self
    }

    #[must_use]
    pub fn with_touched(mut self, touched: TouchedTree) -> Self {
        self.touched = Some(touched);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Value) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_submit_count(mut self, submit_count: u32) -> Self {
        self.submit_count = Some(submit_count);
        self
    }
}

#[derive(Debug, Default)]
struct PhaseState {
    current: SubmitPhase,
    last_settled: Option<SubmitPhase>,
}

/// Sequences submit attempts and resets for one form.
pub struct SubmissionController {
    store: SharedStore,
    orchestrator: Arc<ValidationOrchestrator>,
    liveness: Liveness,
    on_submit: SubmitHandler,
    on_reset: Option<ResetHandler>,
    submit_count_policy: SubmitCountPolicy,
    phase: Mutex<PhaseState>,
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("phase", &self.phase())
            .field("on_reset", &self.on_reset.is_some())
            .field("submit_count_policy", &self.submit_count_policy)
            .finish_non_exhaustive()
    }
}

impl SubmissionController {
    #[must_use]
    pub fn new(
        store: SharedStore,
        orchestrator: Arc<ValidationOrchestrator>,
        liveness: Liveness,
        on_submit: SubmitHandler,
    ) -> Self {
        Self {
            store,
            orchestrator,
            liveness,
            on_submit,
            on_reset: None,
            submit_count_policy: SubmitCountPolicy::default(),
            phase: Mutex::new(PhaseState::default()),
        }
    }

    #[must_use]
    pub fn with_reset_handler(mut self, on_reset: ResetHandler) -> Self {
        self.on_reset = Some(on_reset);
        self
    }

    #[must_use]
    pub fn with_submit_count_policy(mut self, policy: SubmitCountPolicy) -> Self {
        self.submit_count_policy = policy;
        self
    }

    fn phase_state(&self) -> MutexGuard<'_, PhaseState> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SubmitPhase {
        self.phase_state().current
    }

    /// The terminal phase the most recent attempt settled in.
    #[must_use]
    pub fn last_settled(&self) -> Option<SubmitPhase> {
        self.phase_state().last_settled
    }

    fn transition(&self, phase: SubmitPhase) {
        {
            let mut state = self.phase_state();
            if state.current == phase {
                return;
            }
            state.current = phase;
            if phase.is_terminal() {
                state.last_settled = Some(phase);
            }
        }
        self.store
            .update(|store| store.record(FormEvent::PhaseChanged { phase }));
    }

    fn settle(&self, terminal: SubmitPhase) {
        self.transition(terminal);
        self.transition(SubmitPhase::Idle);
    }

    /// Run one submit attempt.
    ///
    /// Returns `Ok(None)` when validation found errors, `Ok(Some(value))`
    /// with the handler's resolved value on success, and `Err` when a
    /// validator or the handler failed.
    pub async fn submit_form(&self, helpers: FormHelpers) -> Result<Option<Value>, FormError> {
        let span = tracing::debug_span!("submit");
        self.run_submit(helpers).instrument(span).await
    }

    async fn run_submit(&self, helpers: FormHelpers) -> Result<Option<Value>, FormError> {
        self.store.update(|store| store.submit_attempt());
        self.transition(SubmitPhase::Validating);

        let errors = match self.orchestrator.validate_form_with_high_priority(None).await {
            Ok(errors) => errors,
            Err(error) => {
                if self.liveness.is_live() {
                    self.store.update(|store| store.submit_failure());
                }
                self.settle(SubmitPhase::Invalid);
                return Err(error);
            }
        };

        if has_errors(&errors) {
            if self.liveness.is_live() {
                self.store.update(|store| store.submit_failure());
            }
            debug!("submit aborted: form has errors");
            self.settle(SubmitPhase::Invalid);
            return Ok(None);
        }

        self.transition(SubmitPhase::Submitting);
        let values = self.store.values();
        match (self.on_submit)(values, helpers) {
            Outcome::Ready(Ok(value)) => {
                self.settle(SubmitPhase::Succeeded);
                Ok(Some(value))
            }
            Outcome::Ready(Err(fault)) => {
                let error = FormError::Submit { fault };
                warn!(error = %error, "submit handler failed");
                self.settle(SubmitPhase::Failed);
                Err(error)
            }
            Outcome::Pending(pending) => match pending.await {
                Ok(value) => {
                    if self.liveness.is_live() {
                        self.store.update(|store| store.submit_success());
                    }
                    self.settle(SubmitPhase::Succeeded);
                    Ok(Some(value))
                }
                Err(fault) => {
                    let error = FormError::Submit { fault };
                    if self.liveness.is_live() {
                        self.store.update(|store| store.submit_failure());
                    } else {
                        warn!(error = %error, "submit handler failed after teardown");
                    }
                    self.settle(SubmitPhase::Failed);
                    Err(error)
                }
            },
        }
    }

    /// Reset to `next` (or the initial snapshot where `next` leaves a tree
    /// unset) and make the result the new initial snapshot.
    ///
    /// A configured reset handler runs first with the pre-reset values; the
    /// state is reset only once it succeeds.
    pub async fn reset_form(
        &self,
        next: Option<ResetState>,
        helpers: FormHelpers,
    ) -> Result<(), FormError> {
        let next = next.unwrap_or_default();
        let (previous_values, initial, submit_count) = self.store.read(|store| {
            let initial = store.initial();
            let state = store.state();
            let effective = InitialSnapshot {
                values: next.values.clone().unwrap_or_else(|| initial.values.clone()),
                errors: next.errors.clone().unwrap_or_else(|| initial.errors.clone()),
                touched: next.touched.clone().unwrap_or_else(|| initial.touched.clone()),
                status: next.status.clone().unwrap_or_else(|| initial.status.clone()),
            };
            let submit_count = next.submit_count.unwrap_or(match self.submit_count_policy {
                SubmitCountPolicy::Reset => 0,
                SubmitCountPolicy::Preserve => state.submit_count,
            });
            (state.values.clone(), effective, submit_count)
        });

        self.store
            .update(|store| store.replace_initial(initial.clone()));

        let reset_to = FormState {
            values: initial.values,
            errors: initial.errors,
            touched: initial.touched,
            status: initial.status,
            is_submitting: next.is_submitting,
            is_validating: next.is_validating,
            submit_count,
        };

        if let Some(on_reset) = &self.on_reset {
            match on_reset(previous_values, helpers) {
                Outcome::Ready(Ok(())) => {}
                Outcome::Ready(Err(fault)) => return Err(self.reset_failed(fault)),
                Outcome::Pending(pending) => {
                    if let Err(fault) = pending.await {
                        return Err(self.reset_failed(fault));
                    }
                    if !self.liveness.is_live() {
                        debug!("reset handler finished after teardown; reset dropped");
                        return Ok(());
                    }
                }
            }
        }

        self.store.update(|store| store.reset(reset_to));
        debug!(submit_count, "form reset");
        Ok(())
    }

    fn reset_failed(&self, fault: Fault) -> FormError {
        let error = FormError::Reset { fault };
        warn!(error = %error, "reset handler failed; state left unchanged");
        error
    }
}
