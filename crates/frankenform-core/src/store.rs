#![forbid(unsafe_code)]

//! The form state container.
//!
//! [`FormStore`] owns the value, error and touched trees, the status value,
//! the submit/validate flags, the submit counter, and the initial snapshot.
//! It exposes one mutation per concern; each replaces exactly the stated
//! part of the state and records a [`FormEvent`] only when something
//! actually changed.
//!
//! [`SharedStore`] is the handle the orchestrator and submission controller
//! share. All access goes through short closures under a lock, so a
//! mutation is atomic with respect to every other mutation and no lock is
//! ever held across an `await`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::{self, set_in, unset_in};
use crate::trace::{FormEvent, FormTrace, PassKind, PassToken};
use crate::tree::{ErrorTree, TouchedTree, ValueTree, empty_tree, mirror_with};

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// A complete snapshot of form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub values: ValueTree,
    pub errors: ErrorTree,
    pub touched: TouchedTree,
    pub status: Value,
    pub is_submitting: bool,
    pub is_validating: bool,
    pub submit_count: u32,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: empty_tree(),
            errors: empty_tree(),
            touched: empty_tree(),
            status: Value::Null,
            is_submitting: false,
            is_validating: false,
            submit_count: 0,
        }
    }
}

/// The baseline a form was initialized or last reset with.
///
/// Dirtiness is measured against `values`; a reset without explicit
/// overrides returns to this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialSnapshot {
    pub values: ValueTree,
    pub errors: ErrorTree,
    pub touched: TouchedTree,
    pub status: Value,
}

impl Default for InitialSnapshot {
    fn default() -> Self {
        Self {
            values: empty_tree(),
            errors: empty_tree(),
            touched: empty_tree(),
            status: Value::Null,
        }
    }
}

impl InitialSnapshot {
    /// A snapshot with the given values and empty errors/touched.
    #[must_use]
    pub fn with_values(values: ValueTree) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// FormStore
// ---------------------------------------------------------------------------

/// Owner of all per-form state.
#[derive(Debug, Clone)]
pub struct FormStore {
    state: FormState,
    initial: InitialSnapshot,
    trace: FormTrace,
    last_token: PassToken,
    passes_in_flight: usize,
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new(InitialSnapshot::default())
    }
}

impl FormStore {
    /// Create a store whose state starts at `initial`.
    #[must_use]
    pub fn new(initial: InitialSnapshot) -> Self {
        let state = FormState {
            values: initial.values.clone(),
            errors: initial.errors.clone(),
            touched: initial.touched.clone(),
            status: initial.status.clone(),
            ..FormState::default()
        };
        Self {
            state,
            initial,
            trace: FormTrace::new(),
            last_token: PassToken::NONE,
            passes_in_flight: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Current initial snapshot.
    #[must_use]
    pub fn initial(&self) -> &InitialSnapshot {
        &self.initial
    }

    /// Recorded events.
    #[must_use]
    pub fn trace(&self) -> &FormTrace {
        &self.trace
    }

    /// Mutable access to the trace (to clear it between test phases).
    pub fn trace_mut(&mut self) -> &mut FormTrace {
        &mut self.trace
    }

    /// Record an event that is not a state mutation (pass lifecycle, phase).
    pub fn record(&mut self, event: FormEvent) {
        self.emit(event);
    }

    fn emit(&mut self, event: FormEvent) {
        tracing::trace!(event = event.event_type(), "form event");
        self.trace.push(event);
    }

    // -- whole-tree setters --

    /// Replace the values tree.
    pub fn set_values(&mut self, values: ValueTree) {
        if self.state.values != values {
            self.state.values = values;
            self.emit(FormEvent::ValuesChanged);
        }
    }

    /// Replace the errors tree.
    ///
    /// No-op when `errors` is structurally equal to the current tree, so
    /// repeated identical validation results produce a single transition.
    pub fn set_errors(&mut self, errors: ErrorTree) {
        if self.state.errors != errors {
            self.state.errors = errors;
            self.emit(FormEvent::ErrorsChanged);
        }
    }

    /// Replace the touched tree.
    pub fn set_touched(&mut self, touched: TouchedTree) {
        if self.state.touched != touched {
            self.state.touched = touched;
            self.emit(FormEvent::TouchedChanged);
        }
    }

    /// Replace the status value.
    pub fn set_status(&mut self, status: Value) {
        if self.state.status != status {
            self.state.status = status;
            self.emit(FormEvent::StatusChanged);
        }
    }

    // -- field setters --

    /// Write one value. Returns `true` if the tree changed.
    pub fn set_field_value(&mut self, path: &str, value: Value) -> bool {
        if !accepts_path(path, "set_field_value") {
            return false;
        }
        let changed = set_in(&mut self.state.values, path, value);
        if changed {
            self.emit(FormEvent::FieldValueSet { path: path.into() });
        }
        changed
    }

    /// Write one touched flag. Returns `true` if the tree changed.
    pub fn set_field_touched(&mut self, path: &str, touched: bool) -> bool {
        if !accepts_path(path, "set_field_touched") {
            return false;
        }
        let changed = set_in(&mut self.state.touched, path, Value::Bool(touched));
        if changed {
            self.emit(FormEvent::FieldTouchedSet { path: path.into() });
        }
        changed
    }

    /// Write or clear one error. `None` clears the slot without creating
    /// containers. Returns `true` if the tree changed.
    pub fn set_field_error(&mut self, path: &str, error: Option<Value>) -> bool {
        if !accepts_path(path, "set_field_error") {
            return false;
        }
        let changed = match error {
            Some(error) if !error.is_null() => set_in(&mut self.state.errors, path, error),
            _ => unset_in(&mut self.state.errors, path),
        };
        if changed {
            self.emit(FormEvent::FieldErrorSet { path: path.into() });
        }
        changed
    }

    // -- flags --

    /// Set `isSubmitting`.
    pub fn set_submitting(&mut self, is_submitting: bool) {
        if self.state.is_submitting != is_submitting {
            self.state.is_submitting = is_submitting;
            self.emit(FormEvent::SubmittingChanged { is_submitting });
        }
    }

    /// Set `isValidating` directly.
    ///
    /// Validation passes use [`enter_validation`](Self::enter_validation)
    /// and [`leave_validation`](Self::leave_validation) instead, which keep
    /// the flag raised while any pass is still in flight.
    pub fn set_validating(&mut self, is_validating: bool) {
        if self.state.is_validating != is_validating {
            self.state.is_validating = is_validating;
            self.emit(FormEvent::ValidatingChanged { is_validating });
        }
    }

    /// A validation pass that owns the busy flag has started.
    pub fn enter_validation(&mut self) {
        self.passes_in_flight += 1;
        self.set_validating(true);
    }

    /// A validation pass that owns the busy flag has finished.
    pub fn leave_validation(&mut self) {
        self.passes_in_flight = self.passes_in_flight.saturating_sub(1);
        if self.passes_in_flight == 0 {
            self.set_validating(false);
        }
    }

    /// A pass finished after teardown. Its flag write is suppressed but it
    /// no longer counts as in flight.
    pub fn abandon_validation(&mut self) {
        self.passes_in_flight = self.passes_in_flight.saturating_sub(1);
    }

    /// Bring the busy flag back in line with the passes in flight. Used on
    /// re-mount, after writes were suppressed while torn down.
    pub fn sync_validating(&mut self) {
        self.set_validating(self.passes_in_flight > 0);
    }

    /// Number of busy-flag-owning passes currently in flight.
    #[must_use]
    pub fn passes_in_flight(&self) -> usize {
        self.passes_in_flight
    }

    /// Issue the next pass token and record the start.
    pub fn begin_pass(&mut self, kind: PassKind) -> PassToken {
        self.last_token = self.last_token.next();
        let token = self.last_token;
        self.emit(FormEvent::PassStarted { token, kind });
        token
    }

    // -- lifecycle --

    /// Replace values, errors, touched, status and both flags in one step.
    ///
    /// `submit_count` is taken from `next` as given: whether it carries the
    /// old count forward or zeroes it is the caller's policy.
    pub fn reset(&mut self, next: FormState) {
        if self.state != next {
            self.state = next;
            self.emit(FormEvent::FormReset);
        }
    }

    /// Mark every leaf of the current values touched, raise
    /// `isSubmitting`, and bump the submit counter.
    pub fn submit_attempt(&mut self) {
        let touched = mirror_with(&self.state.values, true);
        self.set_touched(touched);
        self.set_submitting(true);
        self.state.submit_count = self.state.submit_count.saturating_add(1);
        self.emit(FormEvent::SubmitAttempted {
            submit_count: self.state.submit_count,
        });
    }

    /// The submit callback finished successfully.
    pub fn submit_success(&mut self) {
        self.set_submitting(false);
    }

    /// The attempt was aborted or the submit callback failed. Errors stay
    /// as already written.
    pub fn submit_failure(&mut self) {
        self.set_submitting(false);
    }

    /// Apply an arbitrary transformation to the whole state.
    pub fn apply<F>(&mut self, transform: F)
    where
        F: FnOnce(&mut FormState),
    {
        let before = self.state.clone();
        transform(&mut self.state);
        if self.state != before {
            self.emit(FormEvent::StateReplaced);
        }
    }

    /// Replace the initial snapshot.
    pub fn replace_initial(&mut self, initial: InitialSnapshot) {
        if self.initial != initial {
            self.initial = initial;
            self.emit(FormEvent::InitialReplaced);
        }
    }

    /// Mutable access to the initial snapshot, recording a change if any.
    pub fn update_initial<F>(&mut self, update: F)
    where
        F: FnOnce(&mut InitialSnapshot),
    {
        let mut next = self.initial.clone();
        update(&mut next);
        self.replace_initial(next);
    }
}

fn accepts_path(path: &str, operation: &'static str) -> bool {
    if path::segments(path).is_empty() {
        tracing::warn!(operation, path, "field write with no resolvable path dropped");
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// SharedStore / Liveness
// ---------------------------------------------------------------------------

/// A cloneable, lock-protected handle to a [`FormStore`].
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<FormStore>>,
}

impl SharedStore {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: FormStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read under the lock.
    pub fn read<R>(&self, read: impl FnOnce(&FormStore) -> R) -> R {
        read(&self.lock())
    }

    /// Mutate under the lock. The closure runs to completion before any
    /// other access.
    pub fn update<R>(&self, update: impl FnOnce(&mut FormStore) -> R) -> R {
        update(&mut self.lock())
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FormState {
        self.read(|store| store.state().clone())
    }

    /// Clone of the current values.
    #[must_use]
    pub fn values(&self) -> ValueTree {
        self.read(|store| store.state().values.clone())
    }

    /// Clone of the current initial snapshot.
    #[must_use]
    pub fn initial(&self) -> InitialSnapshot {
        self.read(|store| store.initial().clone())
    }
}

/// Whether the owning form instance is still live.
///
/// Asynchronous continuations check this before writing state; once a form
/// is torn down their results are dropped.
#[derive(Debug, Clone)]
pub struct Liveness {
    live: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    /// A live flag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns `true` until [`teardown`](Self::teardown).
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Mark the owner live again (re-mount).
    pub fn revive(&self) {
        self.live.store(true, Ordering::Release);
    }

    /// Mark the owner torn down.
    pub fn teardown(&self) {
        self.live.store(false, Ordering::Release);
    }
}
