#![forbid(unsafe_code)]

//! Field-level validators and the registry that holds them.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Fault;
use crate::outcome::Outcome;
use crate::validation::rules::FieldRule;

type CheckFn = dyn Fn(&Value) -> Outcome<Option<String>> + Send + Sync;

/// A per-field validate function: `(value) -> message | future<message> | none`.
///
/// Synchronous validators return [`Outcome::Ready`]; the orchestrator relies
/// on that distinction to decide whether the busy flag is raised.
#[derive(Clone)]
pub struct FieldValidator {
    check: Arc<CheckFn>,
}

impl FieldValidator {
    /// Wrap a function that already returns an [`Outcome`].
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Outcome<Option<String>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
        }
    }

    /// A validator that always answers immediately.
    pub fn sync<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(move |value| Outcome::ready(check(value)))
    }

    /// A validator that always answers through a future.
    ///
    /// The closure receives an owned copy of the field value so the future
    /// does not borrow from the value tree.
    pub fn asynchronous<F, Fut>(check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<String>, Fault>> + Send + 'static,
    {
        Self::new(move |value| Outcome::pending(check(value.clone())))
    }

    /// A synchronous validator backed by a [`FieldRule`].
    pub fn rule<R>(rule: R) -> Self
    where
        R: FieldRule + 'static,
    {
        Self::sync(move |value| rule.check(value))
    }

    /// Run the validator against `value`.
    #[must_use]
    pub fn check(&self, value: &Value) -> Outcome<Option<String>> {
        (self.check)(value)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator").finish_non_exhaustive()
    }
}

/// What a field supplies when it attaches.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistration {
    pub validate: Option<FieldValidator>,
}

impl FieldRegistration {
    /// A registration with a validator.
    #[must_use]
    pub fn with_validator(validate: FieldValidator) -> Self {
        Self {
            validate: Some(validate),
        }
    }
}

/// Field path to registration.
///
/// Iteration order is path order, which makes fault selection in a
/// field-level pass deterministic.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, FieldRegistration>,
}

impl FieldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the registration at `path`.
    pub fn register(&mut self, path: impl Into<String>, registration: FieldRegistration) {
        self.fields.insert(path.into(), registration);
    }

    /// Remove the registration at `path`, returning it if present.
    pub fn unregister(&mut self, path: &str) -> Option<FieldRegistration> {
        self.fields.remove(path)
    }

    /// The validator registered at `path`, if any.
    #[must_use]
    pub fn validator(&self, path: &str) -> Option<FieldValidator> {
        self.fields
            .get(path)
            .and_then(|registration| registration.validate.clone())
    }

    /// Every registered validator, in path order.
    #[must_use]
    pub fn validators(&self) -> Vec<(String, FieldValidator)> {
        self.fields
            .iter()
            .filter_map(|(path, registration)| {
                registration
                    .validate
                    .clone()
                    .map(|validate| (path.clone(), validate))
            })
            .collect()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn not_empty() -> FieldValidator {
        FieldValidator::sync(|value| {
            (value.as_str() == Some("")).then(|| "empty".to_string())
        })
    }

    #[test]
    fn sync_validator_is_ready() {
        let validator = not_empty();
        let outcome = validator.check(&json!(""));
        assert!(!outcome.is_pending());
        assert_eq!(pollster::block_on(outcome.resolve()), Ok(Some("empty".into())));
    }

    #[test]
    fn async_validator_is_pending() {
        let validator = FieldValidator::asynchronous(|value: Value| async move {
            Ok(value.is_null().then(|| "missing".to_string()))
        });
        let outcome = validator.check(&Value::Null);
        assert!(outcome.is_pending());
        assert_eq!(
            pollster::block_on(outcome.resolve()),
            Ok(Some("missing".into()))
        );
    }

    #[test]
    fn registry_membership() {
        let mut registry = FieldRegistry::new();
        registry.register("a", FieldRegistration::with_validator(not_empty()));
        registry.register("b", FieldRegistration::default());
        assert_eq!(registry.len(), 2);
        assert!(registry.validator("a").is_some());
        assert!(registry.validator("b").is_none());
        assert!(registry.validator("c").is_none());

        let paths: Vec<String> = registry.validators().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a".to_string()]);

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(!registry.contains("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn validators_are_path_ordered() {
        let mut registry = FieldRegistry::new();
        for path in ["z", "a", "m"] {
            registry.register(path, FieldRegistration::with_validator(not_empty()));
        }
        let paths: Vec<String> = registry.validators().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a", "m", "z"]);
    }
}
