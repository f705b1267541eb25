#![forbid(unsafe_code)]

//! Ready-made field rules.
//!
//! Each rule inspects one field value and answers with an error message or
//! `None`. Rules are synchronous; wrap one with
//! [`FieldValidator::rule`](super::FieldValidator::rule) to register it for
//! a field.
//!
//! Absent values (`null`) pass every rule except [`Required`], so optional
//! fields can carry format rules without failing while empty.

use std::fmt;

use serde_json::Value;

/// A synchronous check on a single field value.
pub trait FieldRule: Send + Sync {
    /// Returns the error message if `value` fails the rule.
    fn check(&self, value: &Value) -> Option<String>;
}

impl<F> FieldRule for F
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn check(&self, value: &Value) -> Option<String> {
        self(value)
    }
}

/// The override if one was set, else the rule's default message.
fn message_or(custom: Option<&String>, default: impl FnOnce() -> String) -> String {
    custom.cloned().unwrap_or_else(default)
}

fn text_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Required
// ---------------------------------------------------------------------------

/// Fails on `null`, empty or whitespace-only strings, and empty sequences.
#[derive(Debug, Clone)]
pub struct Required {
    pub allow_whitespace: bool,
    pub message: String,
}

impl Default for Required {
    fn default() -> Self {
        Self {
            allow_whitespace: false,
            message: "This field is required".into(),
        }
    }
}

impl Required {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept whitespace-only strings.
    #[must_use]
    pub fn allow_whitespace(mut self) -> Self {
        self.allow_whitespace = true;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl FieldRule for Required {
    fn check(&self, value: &Value) -> Option<String> {
        let missing = match value {
            Value::Null => true,
            Value::String(text) if self.allow_whitespace => text.is_empty(),
            Value::String(text) => text.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        missing.then(|| self.message.clone())
    }
}

// ---------------------------------------------------------------------------
// Length
// ---------------------------------------------------------------------------

/// Strings need at least `min` characters; sequences at least `min` items.
#[derive(Debug, Clone)]
pub struct MinLength {
    pub min: usize,
    pub message: Option<String>,
}

impl MinLength {
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min, message: None }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl FieldRule for MinLength {
    fn check(&self, value: &Value) -> Option<String> {
        let len = text_len(value)?;
        (len < self.min).then(|| {
            message_or(self.message.as_ref(), || {
                format!("Must be at least {} characters", self.min)
            })
        })
    }
}

/// Strings may have at most `max` characters; sequences at most `max` items.
#[derive(Debug, Clone)]
pub struct MaxLength {
    pub max: usize,
    pub message: Option<String>,
}

impl MaxLength {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max, message: None }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl FieldRule for MaxLength {
    fn check(&self, value: &Value) -> Option<String> {
        let len = text_len(value)?;
        (len > self.max).then(|| {
            message_or(self.message.as_ref(), || {
                format!("Must be at most {} characters", self.max)
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// Numbers (or numeric strings) must lie in `min..=max`.
///
/// A custom message replaces the out-of-range message only; non-numeric
/// input still reports "Must be a number".
#[derive(Debug, Clone)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub message: Option<String>,
}

impl Range {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl FieldRule for Range {
    fn check(&self, value: &Value) -> Option<String> {
        let number = match value {
            Value::Null => return None,
            Value::Number(number) => number.as_f64(),
            Value::String(text) if text.trim().is_empty() => return None,
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n >= self.min && n <= self.max => None,
            Some(_) => Some(message_or(self.message.as_ref(), || {
                format!("Must be between {} and {}", self.min, self.max)
            })),
            None => Some("Must be a number".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Heuristic address check: `local@domain.tld` with non-empty labels and a
/// top-level label of at least two characters. Empty input passes.
#[derive(Debug, Clone, Default)]
pub struct Email {
    pub message: Option<String>,
}

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn accepts(address: &str) -> bool {
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() > 1
            && labels.iter().all(|label| !label.is_empty())
            && labels.last().is_some_and(|tld| tld.len() >= 2)
    }
}

impl FieldRule for Email {
    fn check(&self, value: &Value) -> Option<String> {
        let address = value.as_str()?.trim();
        if address.is_empty() || Self::accepts(address) {
            None
        } else {
            Some(message_or(self.message.as_ref(), || {
                "Invalid email address".into()
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A sequence of rules; the first failure wins.
#[derive(Default)]
pub struct Rules {
    rules: Vec<Box<dyn FieldRule>>,
}

impl Rules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    #[must_use]
    pub fn with(mut self, rule: impl FieldRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn required(self) -> Self {
        self.with(Required::new())
    }

    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.with(MinLength::new(min))
    }

    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.with(MaxLength::new(max))
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.with(Email::new())
    }

    #[must_use]
    pub fn range(self, min: f64, max: f64) -> Self {
        self.with(Range::new(min, max))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FieldRule for Rules {
    fn check(&self, value: &Value) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.check(value))
    }
}

impl fmt::Debug for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rules")
            .field("count", &self.rules.len())
            .finish()
    }
}
