//! # Structural Equality
//!
//! Decides whether a live object already carries everything a desired object
//! declares, over generic JSON trees.
//!
//! The desired value is the *mold*: it defines the floor, not the ceiling.
//!
//! | mold \ candidate | rule |
//! |---|---|
//! | scalar / scalar | `==` |
//! | object / object | every non-null mold key present in the candidate with a matching value |
//! | array / array | equal length; all-scalar arrays compared as multisets, otherwise positionally |
//! | anything else | no match |
//!
//! Array element kinds are inspected in full before picking a strategy, so a
//! mixed array never short-circuits on its first element.

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// `true` when `candidate` contains everything `mold` declares
#[must_use]
pub fn matches(mold: &Value, candidate: &Value) -> bool {
    match (mold, candidate) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Object(mold), Value::Object(candidate)) => object_matches(mold, candidate),
        (Value::Array(mold), Value::Array(candidate)) => array_matches(mold, candidate),
        _ => false,
    }
}

fn object_matches(mold: &Map<String, Value>, candidate: &Map<String, Value>) -> bool {
    mold.iter()
        .filter(|(_, value)| !value.is_null())
        .all(|(key, value)| candidate.get(key).is_some_and(|c| matches(value, c)))
}

fn array_matches(mold: &[Value], candidate: &[Value]) -> bool {
    if mold.len() != candidate.len() {
        return false;
    }
    if all_scalars(mold) && all_scalars(candidate) {
        return sorted_scalars(mold) == sorted_scalars(candidate);
    }
    mold.iter().zip(candidate).all(|(m, c)| matches(m, c))
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn all_scalars(values: &[Value]) -> bool {
    !values.is_empty() && values.iter().all(is_scalar)
}

/// Scalars in a canonical total order; kind first so `1` and `"1"` never meet
fn sorted_scalars(values: &[Value]) -> Vec<&Value> {
    let mut sorted: Vec<&Value> = values.iter().collect();
    sorted.sort_by(|a, b| scalar_order(a, b));
    sorted
}

fn scalar_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        _ => 2,
    }
}

fn scalar_order(a: &Value, b: &Value) -> Ordering {
    scalar_rank(a)
        .cmp(&scalar_rank(b))
        .then_with(|| match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => x.to_string().cmp(&y.to_string()),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => Ordering::Equal,
        })
}

/// Recursively merge `patch` into `target`
///
/// Objects are merged key by key, null patch values are skipped and every
/// other value (arrays included) replaces the target's. Fields the patch does
/// not mention keep their live values.
pub fn merge_into(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    continue;
                }
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_into(existing, value);
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => {
            if !patch.is_null() {
                *target = patch.clone();
            }
        }
    }
}

/// A desired value that declares nothing: null or an empty object
#[must_use]
pub fn declares_nothing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
