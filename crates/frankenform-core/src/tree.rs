#![forbid(unsafe_code)]

//! Whole-tree operations over values, errors and touched flags.
//!
//! All three trees share one representation, [`serde_json::Value`]. The
//! aliases below only document intent at API boundaries.

use serde_json::{Map, Value};

/// User-entered values: arbitrarily nested mappings and sequences.
pub type ValueTree = Value;

/// Validation messages shaped like a subset of the value tree.
pub type ErrorTree = Value;

/// Interaction flags shaped like a subset of the value tree.
pub type TouchedTree = Value;

/// An empty mapping, the canonical "nothing here" tree.
#[must_use]
pub fn empty_tree() -> Value {
    Value::Object(Map::new())
}

/// Returns `true` if the tree holds at least one non-null leaf.
///
/// Empty containers and `null` slots do not count, so an error tree whose
/// messages have all been cleared is error-free.
#[must_use]
pub fn has_errors(tree: &Value) -> bool {
    match tree {
        Value::Null => false,
        Value::Object(map) => map.values().any(has_errors),
        Value::Array(items) => items.iter().any(has_errors),
        _ => true,
    }
}

/// Count the non-null leaves of a tree.
#[must_use]
pub fn leaf_count(tree: &Value) -> usize {
    match tree {
        Value::Null => 0,
        Value::Object(map) => map.values().map(leaf_count).sum(),
        Value::Array(items) => items.iter().map(leaf_count).sum(),
        _ => 1,
    }
}

/// Build a tree with the same container shape as `values` where every leaf
/// is replaced by `flag`.
///
/// Used to mark every field touched on a submit attempt. A scalar root has
/// no addressable fields and yields an empty mapping.
#[must_use]
pub fn mirror_with(values: &Value, flag: bool) -> Value {
    match values {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), mirror_leaf(value, flag)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| mirror_leaf(v, flag)).collect()),
        _ => empty_tree(),
    }
}

fn mirror_leaf(value: &Value, flag: bool) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => mirror_with(value, flag),
        _ => Value::Bool(flag),
    }
}

/// Prepare values for a schema validator: every empty-string leaf becomes
/// `null`, recursing through mappings and sequences.
///
/// Schema "required" checks would otherwise accept `""` as present.
#[must_use]
pub fn sanitize_for_validation(values: &Value) -> Value {
    match values {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), sanitize_for_validation(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_for_validation).collect()),
        Value::String(text) if text.is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn is_mergeable(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Deep structural merge of `source` over `target`.
///
/// - Mapping keys are unioned; a colliding key merges recursively when the
///   source side is a container, otherwise the source value wins.
/// - Two sequences merge element-by-element (see [`merge_sequences`]).
/// - Any other pairing (container kinds differ, scalar involved) yields a
///   copy of `source`.
#[must_use]
pub fn deep_merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Array(target), Value::Array(source)) => {
            Value::Array(merge_sequences(target, source))
        }
        (Value::Object(target), Value::Object(source)) => {
            let mut merged = target.clone();
            for (key, value) in source {
                let next = match target.get(key) {
                    Some(existing) if is_mergeable(value) => deep_merge(existing, value),
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => source.clone(),
    }
}

/// Index-wise merge of two sequences.
///
/// For each non-null source element at index `i`:
/// - if slot `i` is vacant (past the end, or `null`), the element fills it;
/// - if the element is a container, slot `i` becomes the deep merge of the
///   existing element with it;
/// - otherwise the element is appended unless the target already contains
///   an equal value.
///
/// `null` source elements are holes and never displace anything.
#[must_use]
pub fn merge_sequences(target: &[Value], source: &[Value]) -> Vec<Value> {
    let mut merged = target.to_vec();
    for (i, item) in source.iter().enumerate() {
        if item.is_null() {
            continue;
        }
        if merged.get(i).is_none_or(Value::is_null) {
            if i >= merged.len() {
                merged.resize(i + 1, Value::Null);
            }
            merged[i] = item.clone();
        } else if is_mergeable(item) {
            merged[i] = deep_merge(&merged[i], item);
        } else if !target.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// Fold a sequence of trees with [`deep_merge`], later trees taking
/// precedence over earlier ones.
#[must_use]
pub fn merge_all<'a, I>(trees: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    trees
        .into_iter()
        .fold(empty_tree(), |merged, tree| deep_merge(&merged, tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn has_errors_ignores_empty_containers_and_nulls() {
        assert!(!has_errors(&json!({})));
        assert!(!has_errors(&json!({"a": {}, "b": [], "c": null})));
        assert!(!has_errors(&json!({"list": [null, {"x": null}]})));
        assert!(has_errors(&json!({"a": {"b": "required"}})));
        assert!(has_errors(&json!({"list": [null, "bad"]})));
    }

    #[test]
    fn leaf_count_counts_messages() {
        assert_eq!(leaf_count(&json!({})), 0);
        assert_eq!(leaf_count(&json!({"a": "x", "b": {"c": "y", "d": null}})), 2);
        assert_eq!(leaf_count(&json!({"l": ["x", null, {"z": "w"}]})), 2);
    }

    #[test]
    fn mirror_marks_every_leaf() {
        let values = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(mirror_with(&values, true), json!({"a": true, "b": {"c": true}}));
    }

    #[test]
    fn mirror_walks_sequences_and_nulls() {
        let values = json!({"friends": [{"name": "ada"}, "bob"], "note": null});
        assert_eq!(
            mirror_with(&values, true),
            json!({"friends": [{"name": true}, true], "note": true})
        );
    }

    #[test]
    fn mirror_of_scalar_root_is_empty() {
        assert_eq!(mirror_with(&json!(7), true), json!({}));
    }

    #[test]
    fn sanitize_replaces_empty_strings_recursively() {
        let values = json!({
            "name": "",
            "age": 0,
            "tags": ["", "x", {"k": ""}],
            "nested": {"deep": {"v": ""}, "keep": " "}
        });
        assert_eq!(
            sanitize_for_validation(&values),
            json!({
                "name": null,
                "age": 0,
                "tags": [null, "x", {"k": null}],
                "nested": {"deep": {"v": null}, "keep": " "}
            })
        );
    }

    #[test]
    fn merge_later_scalar_wins() {
        let merged = merge_all([&json!({"a": "f"}), &json!({"a": "s", "b": "s2"}), &json!({"a": "w"})]);
        assert_eq!(merged, json!({"a": "w", "b": "s2"}));
    }

    #[test]
    fn merge_unions_nested_mappings() {
        let merged = deep_merge(
            &json!({"user": {"name": "short"}}),
            &json!({"user": {"email": "invalid"}}),
        );
        assert_eq!(merged, json!({"user": {"name": "short", "email": "invalid"}}));
    }

    #[test]
    fn merge_container_kind_mismatch_takes_source() {
        assert_eq!(
            deep_merge(&json!({"a": {"x": 1}}), &json!({"a": ["y"]})),
            json!({"a": ["y"]})
        );
        assert_eq!(deep_merge(&json!({"a": "msg"}), &json!({"a": {"b": "c"}})), json!({"a": {"b": "c"}}));
    }

    #[test]
    fn merge_sequences_by_index() {
        let merged = deep_merge(
            &json!({"friends": [{"name": "required"}, null]}),
            &json!({"friends": [{"email": "bad"}, {"name": "too long"}, {"age": "low"}]}),
        );
        assert_eq!(
            merged,
            json!({"friends": [
                {"name": "required", "email": "bad"},
                {"name": "too long"},
                {"age": "low"}
            ]})
        );
    }

    #[test]
    fn merge_sequences_appends_unseen_scalars() {
        let merged = merge_sequences(&[json!("a"), json!("b")], &[json!("c"), json!("a")]);
        assert_eq!(merged, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn merge_sequences_fills_holes_in_place() {
        let merged = deep_merge(
            &json!({"friends": [null, "field"]}),
            &json!({"friends": ["schema", null]}),
        );
        assert_eq!(merged, json!({"friends": ["schema", "field"]}));
    }

    #[test]
    fn merge_all_of_nothing_is_empty() {
        assert_eq!(merge_all(std::iter::empty::<&Value>()), json!({}));
    }
}
