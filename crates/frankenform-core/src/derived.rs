#![forbid(unsafe_code)]

//! Pure queries over form state.
//!
//! Nothing here is cached; every query is recomputed from the store on
//! demand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::InitialValidity;
use crate::path::get_in;
use crate::store::{FormState, InitialSnapshot};
use crate::tree::has_errors;

/// Values differ structurally from the initial snapshot.
#[must_use]
pub fn is_dirty(initial: &InitialSnapshot, state: &FormState) -> bool {
    initial.values != state.values
}

/// Whether the form counts as valid.
///
/// Without an override this is "no errors". With one, a pristine form takes
/// the override's answer and a dirty form falls back to "no errors".
#[must_use]
pub fn is_valid(
    initial: &InitialSnapshot,
    state: &FormState,
    initial_validity: Option<&InitialValidity>,
) -> bool {
    match initial_validity {
        Some(validity) if !is_dirty(initial, state) => validity.resolve(initial),
        _ => !has_errors(&state.errors),
    }
}

/// Everything known about one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub value: Option<Value>,
    pub error: Option<Value>,
    pub touched: bool,
    pub initial_value: Option<Value>,
    pub initial_touched: bool,
    pub initial_error: Option<Value>,
}

/// Collect [`FieldMeta`] for `path`.
#[must_use]
pub fn field_meta(initial: &InitialSnapshot, state: &FormState, path: &str) -> FieldMeta {
    let lookup = |tree: &Value| get_in(tree, path).filter(|v| !v.is_null()).cloned();
    FieldMeta {
        value: lookup(&state.values),
        error: lookup(&state.errors),
        touched: truthy(get_in(&state.touched, path)),
        initial_value: lookup(&initial.values),
        initial_touched: truthy(get_in(&initial.touched, path)),
        initial_error: lookup(&initial.errors),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}
