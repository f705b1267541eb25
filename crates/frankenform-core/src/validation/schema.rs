#![forbid(unsafe_code)]

//! The schema collaborator contract.
//!
//! A schema validator checks a whole value tree (or one path of it) and
//! either accepts it or fails with a [`SchemaViolation`]: an ordered list of
//! path/message issues. Any other failure is a [`Fault`] and fails the pass.
//!
//! [`violation_to_errors`] normalizes a violation into an [`ErrorTree`],
//! keeping the first message reported for each path.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Fault;
use crate::path::{get_present, segments, set_in};
use crate::tree::{ErrorTree, empty_tree};

/// Key under which a violation that names no path is recorded.
pub const FORM_LEVEL_KEY: &str = "$form";

/// One path/message pair reported by a schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A structured validation failure.
///
/// `inner` lists the individual issues in reporting order. When it is empty
/// the violation itself is the single issue, at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub path: Option<String>,
    pub message: String,
    #[serde(default)]
    pub inner: Vec<SchemaIssue>,
}

impl SchemaViolation {
    /// A violation made of the given issues.
    #[must_use]
    pub fn from_issues(issues: Vec<SchemaIssue>) -> Self {
        let message = match issues.len() {
            1 => "1 error occurred".to_string(),
            n => format!("{n} errors occurred"),
        };
        Self {
            path: None,
            message,
            inner: issues,
        }
    }

    /// A violation with a single issue and no inner list.
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            message: message.into(),
            inner: Vec::new(),
        }
    }
}

/// Why a schema check did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaFailure {
    /// The values are invalid; this is an expected validation result.
    Invalid(SchemaViolation),
    /// The collaborator itself failed.
    Fault(Fault),
}

impl From<SchemaViolation> for SchemaFailure {
    fn from(violation: SchemaViolation) -> Self {
        Self::Invalid(violation)
    }
}

impl From<Fault> for SchemaFailure {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// The future a schema check returns.
pub type SchemaFuture = BoxFuture<'static, Result<(), SchemaFailure>>;

/// Adapter contract for an external schema validation library.
pub trait SchemaValidator: Send + Sync {
    /// Validate the whole (sanitized) value tree.
    fn validate(&self, values: &Value) -> SchemaFuture;

    /// Validate only the value at `path`, if the schema supports partial
    /// validation. The default answers `None`, which makes callers fall back
    /// to [`validate`](Self::validate) and keep only the errors at `path`.
    fn validate_at(&self, path: &str, values: &Value) -> Option<SchemaFuture> {
        let _ = (path, values);
        None
    }
}

impl<F> SchemaValidator for F
where
    F: Fn(&Value) -> SchemaFuture + Send + Sync,
{
    fn validate(&self, values: &Value) -> SchemaFuture {
        self(values)
    }
}

/// Normalize a violation into an error tree. The first message for a path
/// wins; later issues at the same path are ignored.
#[must_use]
pub fn violation_to_errors(violation: &SchemaViolation) -> ErrorTree {
    let mut errors = empty_tree();
    if violation.inner.is_empty() {
        let path = violation.path.as_deref().unwrap_or_default();
        write_first(&mut errors, path, &violation.message);
        return errors;
    }
    for issue in &violation.inner {
        write_first(&mut errors, &issue.path, &issue.message);
    }
    errors
}

fn write_first(errors: &mut ErrorTree, path: &str, message: &str) {
    let path = if segments(path).is_empty() {
        FORM_LEVEL_KEY
    } else {
        path
    };
    if get_present(errors, path).is_none() {
        set_in(errors, path, Value::String(message.to_owned()));
    }
}

/// Keep only the error at `path`, in an otherwise empty tree.
#[must_use]
pub fn errors_at(errors: &ErrorTree, path: &str) -> ErrorTree {
    let mut isolated = empty_tree();
    if let Some(error) = get_present(errors, path) {
        set_in(&mut isolated, path, error.clone());
    }
    isolated
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;

    #[test]
    fn first_error_per_path_wins() {
        let violation = SchemaViolation::from_issues(vec![
            SchemaIssue::new("email", "required"),
            SchemaIssue::new("email", "invalid"),
            SchemaIssue::new("friends[1].name", "too short"),
        ]);
        assert_eq!(violation.message, "3 errors occurred");
        assert_eq!(
            violation_to_errors(&violation),
            json!({"email": "required", "friends": [null, {"name": "too short"}]})
        );
    }

    #[test]
    fn violation_without_inner_uses_its_own_path() {
        let violation = SchemaViolation::single("age", "must be positive");
        assert_eq!(violation_to_errors(&violation), json!({"age": "must be positive"}));
    }

    #[test]
    fn pathless_violation_lands_on_form_key() {
        let violation = SchemaViolation {
            path: None,
            message: "passwords differ".into(),
            inner: Vec::new(),
        };
        assert_eq!(
            violation_to_errors(&violation),
            json!({"$form": "passwords differ"})
        );
    }

    #[test]
    fn errors_at_isolates_one_path() {
        let errors = json!({"a": "x", "b": {"c": "y"}});
        assert_eq!(errors_at(&errors, "b.c"), json!({"b": {"c": "y"}}));
        assert_eq!(errors_at(&errors, "missing"), json!({}));
    }

    #[test]
    fn closures_are_schema_validators() {
        let schema = |values: &Value| -> SchemaFuture {
            let ok = values.get("email").is_some_and(|v| !v.is_null());
            async move {
                if ok {
                    Ok(())
                } else {
                    Err(SchemaViolation::single("email", "required").into())
                }
            }
            .boxed()
        };
        assert!(schema.validate_at("email", &json!({})).is_none());
        let result = pollster::block_on(schema.validate(&json!({"email": null})));
        assert!(matches!(result, Err(SchemaFailure::Invalid(_))));
        assert_eq!(
            pollster::block_on(schema.validate(&json!({"email": "a@b.co"}))),
            Ok(())
        );
    }
}
