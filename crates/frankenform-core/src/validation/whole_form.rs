#![forbid(unsafe_code)]

//! The whole-form validator: `(values) -> ErrorTree | future<ErrorTree> | none`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Fault;
use crate::outcome::Outcome;
use crate::tree::ErrorTree;

type CheckFn = dyn Fn(&Value) -> Outcome<Option<ErrorTree>> + Send + Sync;

/// A single function that validates the complete value tree.
#[derive(Clone)]
pub struct FormValidator {
    check: Arc<CheckFn>,
}

impl FormValidator {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Outcome<Option<ErrorTree>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }

    /// A validator that answers immediately.
    pub fn sync<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Option<ErrorTree> + Send + Sync + 'static,
    {
        Self::new(move |values| Outcome::ready(check(values)))
    }

    /// A validator that answers through a future over an owned copy of the
    /// values.
    pub fn asynchronous<F, Fut>(check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<ErrorTree>, Fault>> + Send + 'static,
    {
        Self::new(move |values| Outcome::pending(check(values.clone())))
    }

    #[must_use]
    pub fn check(&self, values: &Value) -> Outcome<Option<ErrorTree>> {
        (self.check)(values)
    }
}

impl fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormValidator").finish_non_exhaustive()
    }
}
