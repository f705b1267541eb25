#![forbid(unsafe_code)]

//! Path-addressed access into nested value trees.
//!
//! A path expression names a location in a tree of mappings and sequences:
//! `user.name`, `friends[0]`, `friends[0].email`. Segments are separated by
//! `.`, `[` or `]`; empty segments are dropped, so `a[0].b`, `a.0.b` and
//! `.a[0]b.` all address the same location.
//!
//! [`get_in`] never fails on a missing intermediate segment. [`set_in`]
//! materializes missing intermediates, choosing a sequence when the *next*
//! segment is numeric and a mapping otherwise.

use serde_json::{Map, Value};

/// Split a path expression into its non-empty segments.
#[must_use]
pub fn segments(path: &str) -> Vec<&str> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Returns `true` if the segment addresses a sequence slot.
#[must_use]
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn empty_container_for(segment: &str) -> Value {
    if is_index(segment) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Look up the value at `path`.
///
/// Returns `None` when any segment along the way is missing or when a
/// segment cannot address the node it meets (a key on a scalar, a
/// non-numeric segment on a sequence). The empty path yields the root.
#[must_use]
pub fn get_in<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path)
        .into_iter()
        .try_fold(tree, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Returns the value at `path`, treating `null` the same as a missing slot.
#[must_use]
pub fn get_present<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    get_in(tree, path).filter(|value| !value.is_null())
}

/// Resolve the slot for `segment` inside `node`, reshaping `node` into a
/// container that can hold it if necessary.
fn slot_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = segment.parse::<usize>().ok().filter(|_| is_index(segment));
    let fits = matches!(
        (&*node, index),
        (Value::Object(_), _) | (Value::Array(_), Some(_))
    );
    if !fits {
        if !node.is_null() {
            tracing::trace!(segment, "replacing non-container node along write path");
        }
        *node = empty_container_for(segment);
    }

    match (node, index) {
        (Value::Array(items), Some(index)) => {
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.to_owned()).or_insert(Value::Null),
        // Reshaped above; every other combination is unreachable.
        (node, _) => node,
    }
}

/// Write `value` at `path`, creating intermediate containers on demand.
///
/// Returns `true` if the tree changed. Writing a value equal to the one
/// already present is a no-op, as is writing to a path with no segments.
pub fn set_in(tree: &mut Value, path: &str, value: Value) -> bool {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    if get_in(tree, path) == Some(&value) {
        return false;
    }

    let mut node = tree;
    for segment in parents {
        node = slot_mut(node, segment);
    }
    *slot_mut(node, last) = value;
    true
}

/// Clear the value at `path` without materializing anything.
///
/// Mapping entries are removed; sequence slots are set to `null` so sibling
/// indices keep their positions. Returns `true` if the tree changed.
pub fn unset_in(tree: &mut Value, path: &str) -> bool {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut node = tree;
    for segment in parents {
        let next = match node {
            Value::Object(map) => map.get_mut(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        };
        match next {
            Some(child) => node = child,
            None => return false,
        }
    }

    match node {
        Value::Object(map) => map.remove(*last).is_some(),
        Value::Array(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(slot) if !slot.is_null() => {
                *slot = Value::Null;
                true
            }
            _ => false,
        },
        _ => false,
    }
}
