#![forbid(unsafe_code)]

//! Fault types.
//!
//! Validation *failures* are not errors: they are ordinary [`ErrorTree`]s
//! surfaced through form state. The types here describe *faults*, where a
//! user-supplied validator or callback itself failed.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `FormError::FieldValidator` | A field-level validator returned a fault | Pass fails, propagated to the awaiting caller |
//! | `FormError::Schema` | Schema collaborator failed for a reason other than invalid data | Pass fails, propagated |
//! | `FormError::FormValidator` | Whole-form validator returned a fault | Pass fails, propagated |
//! | `FormError::Submit` | Submit callback failed | `isSubmitting` cleared (async case), propagated |
//! | `FormError::Reset` | Reset callback failed | State reset skipped, propagated |
//!
//! [`ErrorTree`]: crate::tree::ErrorTree

use thiserror::Error;

/// A failure reported by a user-supplied callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    /// Create a fault with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture any error as a fault, keeping only its rendered message.
    #[must_use]
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::new(error.to_string())
    }

    /// The fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A fault attributed to the collaborator that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A registered field-level validator failed.
    #[error("field validator for `{path}` failed: {fault}")]
    FieldValidator {
        path: String,
        #[source]
        fault: Fault,
    },
    /// The schema collaborator failed with something other than a
    /// validation result.
    #[error("schema validator failed: {fault}")]
    Schema {
        #[source]
        fault: Fault,
    },
    /// The whole-form validator failed.
    #[error("form validator failed: {fault}")]
    FormValidator {
        #[source]
        fault: Fault,
    },
    /// The submit callback failed.
    #[error("submit handler failed: {fault}")]
    Submit {
        #[source]
        fault: Fault,
    },
    /// The reset callback failed.
    #[error("reset handler failed: {fault}")]
    Reset {
        #[source]
        fault: Fault,
    },
}

impl FormError {
    /// The underlying fault.
    #[must_use]
    pub fn fault(&self) -> &Fault {
        match self {
            Self::FieldValidator { fault, .. }
            | Self::Schema { fault }
            | Self::FormValidator { fault }
            | Self::Submit { fault }
            | Self::Reset { fault } => fault,
        }
    }

    /// Short name of the collaborator that failed, for logging.
    #[must_use]
    pub fn origin(&self) -> &'static str {
        match self {
            Self::FieldValidator { .. } => "field_validator",
            Self::Schema { .. } => "schema",
            Self::FormValidator { .. } => "form_validator",
            Self::Submit { .. } => "submit",
            Self::Reset { .. } => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn fault_display_is_message() {
        let fault = Fault::new("network unreachable");
        assert_eq!(fault.to_string(), "network unreachable");
        assert_eq!(fault.message(), "network unreachable");
    }

    #[test]
    fn fault_from_error() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert_eq!(Fault::from_error(&io).message(), "timed out");
    }

    #[test]
    fn form_error_display_includes_origin() {
        let err = FormError::FieldValidator {
            path: "user.email".into(),
            fault: "lookup failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "field validator for `user.email` failed: lookup failed"
        );
        assert_eq!(err.origin(), "field_validator");
        assert_eq!(err.fault().message(), "lookup failed");
    }

    #[test]
    fn form_error_exposes_source() {
        let err = FormError::Submit {
            fault: Fault::new("rejected"),
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("rejected"));
    }
}
