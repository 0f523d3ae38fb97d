//! # Flag Flattening
//!
//! Turns a flag map into `--key=value` process arguments.

use serde_json::Value;
use std::collections::BTreeMap;

/// A flag that could not be expressed as a process argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFlag {
    pub name: String,
    pub reason: String,
}

/// Flatten flags into arguments, returning unflattenable flags separately
///
/// Output order follows flag name order, so the result is deterministic.
#[must_use]
pub fn flatten_flags(flags: &BTreeMap<String, Value>) -> (Vec<String>, Vec<RejectedFlag>) {
    let mut args = Vec::with_capacity(flags.len());
    let mut rejected = Vec::new();

    for (name, value) in flags {
        match render(value) {
            Ok(rendered) => args.push(format!("--{name}={rendered}")),
            Err(reason) => rejected.push(RejectedFlag {
                name: name.clone(),
                reason,
            }),
        }
    }

    (args, rejected)
}

fn render(value: &Value) -> Result<String, String> {
    match value {
        Value::Array(items) => render_list(items),
        other => render_scalar(other)
            .ok_or_else(|| format!("unsupported {} value", super::json_kind(other))),
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Every element is inspected; a list is only accepted when all of its
// elements are scalars of the same JSON type.
fn render_list(items: &[Value]) -> Result<String, String> {
    let Some(first) = items.first() else {
        return Ok(String::new());
    };
    let kind = super::json_kind(first);

    let mut rendered = Vec::with_capacity(items.len());
    for item in items {
        if super::json_kind(item) != kind {
            return Err(format!(
                "mixed list ({kind} and {})",
                super::json_kind(item)
            ));
        }
        let Some(s) = render_scalar(item) else {
            return Err(format!("list of {kind} values"));
        };
        rendered.push(s);
    }
    Ok(rendered.join(","))
}
