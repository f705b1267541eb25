#![forbid(unsafe_code)]

//! Event trace of form state transitions and validation passes.
//!
//! Every observable change to a form is recorded as a [`FormEvent`]. A
//! mutation that leaves state unchanged records nothing, which makes the
//! trace the ground truth for "how many times did subscribers see a change".
//!
//! # Design Principles
//!
//! 1. **Pass tokens**: each validation pass gets a monotonically increasing
//!    [`PassToken`]. Tokens label passes in the trace; they never fence
//!    writes. When passes overlap, the last one to finish wins.
//! 2. **Bounded**: the trace keeps the most recent events only, so a
//!    long-lived form does not grow without limit.
//! 3. **Checksummed**: traces hash deterministically for golden comparison
//!    in tests.
//!
//! # Invariants
//!
//! [`FormTrace::verify_invariants`] checks, over the retained window:
//! - `PassStarted` tokens strictly increase;
//! - `SubmitAttempted` counts strictly increase;
//! - no pass terminates (`PassApplied`, `PassDiscarded`, `PassFailed`) twice.

use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::submit::SubmitPhase;

/// Default number of events retained by a [`FormTrace`].
pub const DEFAULT_TRACE_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// PassToken
// ---------------------------------------------------------------------------

/// Identifies one validation pass.
///
/// Token 0 is reserved for "no pass". Tokens are issued in strictly
/// increasing order per form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PassToken(u64);

impl PassToken {
    /// The null token.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` for the null token.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for PassToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pass({})", self.0)
    }
}

/// What a validation pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Field-level, schema and whole-form validators over the whole tree.
    Form,
    /// A single field, through its own validator or the schema.
    Field,
}

// ---------------------------------------------------------------------------
// FormEvent
// ---------------------------------------------------------------------------

/// One observable transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormEvent {
    /// The values tree was replaced.
    ValuesChanged,
    /// The errors tree was replaced.
    ErrorsChanged,
    /// The touched tree was replaced.
    TouchedChanged,
    /// The status value was replaced.
    StatusChanged,
    /// A single value was written.
    FieldValueSet { path: String },
    /// A single touched flag was written.
    FieldTouchedSet { path: String },
    /// A single error was written or cleared.
    FieldErrorSet { path: String },
    /// `isSubmitting` flipped.
    SubmittingChanged { is_submitting: bool },
    /// `isValidating` flipped.
    ValidatingChanged { is_validating: bool },
    /// A submit attempt started; carries the new submit count.
    SubmitAttempted { submit_count: u32 },
    /// The form was reset to a new baseline.
    FormReset,
    /// An arbitrary whole-state transformation was applied.
    StateReplaced,
    /// The initial snapshot was replaced.
    InitialReplaced,
    /// A validation pass started.
    PassStarted { token: PassToken, kind: PassKind },
    /// A pass finished and its result was written.
    PassApplied { token: PassToken, error_count: usize },
    /// A pass finished after teardown; its write was suppressed.
    PassDiscarded { token: PassToken },
    /// A pass failed with a fault.
    PassFailed { token: PassToken },
    /// The submission state machine moved.
    PhaseChanged { phase: SubmitPhase },
}

impl FormEvent {
    /// The pass token this event refers to, if any.
    #[must_use]
    pub fn token(&self) -> Option<PassToken> {
        match self {
            Self::PassStarted { token, .. }
            | Self::PassApplied { token, .. }
            | Self::PassDiscarded { token }
            | Self::PassFailed { token } => Some(*token),
            _ => None,
        }
    }

    /// Stable event name for logging and lookup.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ValuesChanged => "values_changed",
            Self::ErrorsChanged => "errors_changed",
            Self::TouchedChanged => "touched_changed",
            Self::StatusChanged => "status_changed",
            Self::FieldValueSet { .. } => "field_value_set",
            Self::FieldTouchedSet { .. } => "field_touched_set",
            Self::FieldErrorSet { .. } => "field_error_set",
            Self::SubmittingChanged { .. } => "submitting_changed",
            Self::ValidatingChanged { .. } => "validating_changed",
            Self::SubmitAttempted { .. } => "submit_attempted",
            Self::FormReset => "form_reset",
            Self::StateReplaced => "state_replaced",
            Self::InitialReplaced => "initial_replaced",
            Self::PassStarted { .. } => "pass_started",
            Self::PassApplied { .. } => "pass_applied",
            Self::PassDiscarded { .. } => "pass_discarded",
            Self::PassFailed { .. } => "pass_failed",
            Self::PhaseChanged { .. } => "phase_changed",
        }
    }

    fn terminates_pass(&self) -> bool {
        matches!(
            self,
            Self::PassApplied { .. } | Self::PassDiscarded { .. } | Self::PassFailed { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// FormTrace
// ---------------------------------------------------------------------------

/// A bounded log of [`FormEvent`]s.
#[derive(Debug, Clone)]
pub struct FormTrace {
    events: Vec<FormEvent>,
    capacity: usize,
}

impl Default for FormTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl FormTrace {
    /// Create an empty trace with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }

    /// Create an empty trace retaining at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity: capacity.max(2),
        }
    }

    /// Append an event, dropping the oldest half when full.
    pub fn push(&mut self, event: FormEvent) {
        if self.events.len() >= self.capacity {
            self.events.drain(..self.capacity / 2);
        }
        self.events.push(event);
    }

    /// All retained events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[FormEvent] {
        &self.events
    }

    /// Returns `true` if any retained event has the given type.
    #[must_use]
    pub fn contains_event_type(&self, event_type: &str) -> bool {
        self.events.iter().any(|e| e.event_type() == event_type)
    }

    /// Number of retained events of the given type.
    #[must_use]
    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// All retained events for one pass.
    #[must_use]
    pub fn events_for_pass(&self, token: PassToken) -> Vec<&FormEvent> {
        self.events
            .iter()
            .filter(|e| e.token() == Some(token))
            .collect()
    }

    /// Deterministic checksum over event data and order.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Check trace invariants; returns one message per violation.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let mut last_started = PassToken::NONE;
        let mut last_submit_count: Option<u32> = None;
        let mut started = HashSet::new();
        let mut terminated = HashSet::new();

        for event in &self.events {
            match event {
                FormEvent::PassStarted { token, .. } => {
                    if *token <= last_started {
                        violations.push(format!(
                            "Non-monotonic pass token: {token} after {last_started}"
                        ));
                    }
                    last_started = *token;
                    started.insert(*token);
                }
                FormEvent::SubmitAttempted { submit_count } => {
                    if let Some(previous) = last_submit_count
                        && previous.checked_add(1) != Some(*submit_count)
                    {
                        violations.push(format!(
                            "Submit count {submit_count} does not follow {previous}"
                        ));
                    }
                    last_submit_count = Some(*submit_count);
                }
                // The counter may be rebased by a reset or a whole-state
                // transformation.
                FormEvent::FormReset | FormEvent::StateReplaced => last_submit_count = None,
                _ => {}
            }

            if event.terminates_pass()
                && let Some(token) = event.token()
            {
                if !started.contains(&token) {
                    violations.push(format!("{token} terminated without starting"));
                }
                if !terminated.insert(token) {
                    violations.push(format!("{token} terminated more than once"));
                }
            }
        }

        violations
    }
}
