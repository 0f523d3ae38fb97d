//! # Container Argument Merge
//!
//! Reconciles a component's versioned default flags with a user-supplied,
//! partially specified override document, then flattens the result into a
//! process argument list.
//!
//! ## Merge rules
//!
//! - The override is decoded into [`ComponentConfig`]; unknown top-level keys
//!   are dropped on decode.
//! - A closed [`ConfigSchema`] prunes flags it does not declare.
//! - Override flags win over defaults. An override flag set to `null`
//!   removes the default.
//! - A structurally malformed override is ignored and the defaults are used.
//!
//! ## Flattening
//!
//! - scalar (string, bool, number) → `--key=value`
//! - array of one scalar type → `--key=v1,v2,...`
//! - anything else is rejected and reported in [`MergedArgs::rejected`]

mod flatten;

pub use flatten::{flatten_flags, RejectedFlag};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Typed configuration document for one component
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ComponentConfig {
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
}

impl ComponentConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_flag(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.flags.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn without_flag(mut self, name: &str) -> Self {
        self.flags.remove(name);
        self
    }

    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    /// Layer `other` over `self`; `other` wins and `null` deletes
    #[must_use]
    pub fn overlay(&self, other: &ComponentConfig) -> ComponentConfig {
        let mut flags = self.flags.clone();
        for (name, value) in &other.flags {
            if value.is_null() {
                flags.remove(name);
            } else {
                flags.insert(name.clone(), value.clone());
            }
        }
        ComponentConfig { flags }
    }
}

/// Which flags an override may set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchema {
    /// Any flag is accepted
    Open,
    /// Only the listed flags are accepted
    Closed(BTreeSet<String>),
}

impl ConfigSchema {
    #[must_use]
    pub fn closed<'a>(flags: impl IntoIterator<Item = &'a str>) -> Self {
        ConfigSchema::Closed(flags.into_iter().map(str::to_string).collect())
    }

    fn accepts(&self, flag: &str) -> bool {
        match self {
            ConfigSchema::Open => true,
            ConfigSchema::Closed(known) => known.contains(flag),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("override document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("override document does not match the configuration shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Result of a merge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedArgs {
    /// Flattened `--key=value` arguments, sorted by flag name
    pub args: Vec<String>,
    /// Flags whose values could not be flattened
    pub rejected: Vec<RejectedFlag>,
    /// Override flags dropped because the schema does not declare them
    pub pruned: Vec<String>,
    /// Set when the override was malformed and the defaults were used
    pub fallback_reason: Option<String>,
}

/// Decode a raw override document against a schema
///
/// Returns the pruned configuration and the names of pruned flags.
pub fn decode_override(
    schema: &ConfigSchema,
    doc: &Value,
) -> Result<(ComponentConfig, Vec<String>), OverrideError> {
    if doc.is_null() {
        return Ok((ComponentConfig::default(), Vec::new()));
    }
    if !doc.is_object() {
        return Err(OverrideError::NotAnObject(json_kind(doc)));
    }

    let mut config: ComponentConfig = serde_json::from_value(doc.clone())?;
    let pruned: Vec<String> = config
        .flags
        .keys()
        .filter(|name| !schema.accepts(name))
        .cloned()
        .collect();
    for name in &pruned {
        config.flags.remove(name);
    }
    Ok((config, pruned))
}

/// Merge `override_doc` over `defaults` and flatten to arguments
#[must_use]
pub fn merge_args(schema: &ConfigSchema, defaults: &ComponentConfig, override_doc: &Value) -> MergedArgs {
    let (merged, pruned, fallback_reason) = match decode_override(schema, override_doc) {
        Ok((overrides, pruned)) => (defaults.overlay(&overrides), pruned, None),
        Err(e) => (defaults.clone(), Vec::new(), Some(e.to_string())),
    };

    let (args, rejected) = flatten_flags(&merged.flags);
    MergedArgs {
        args,
        rejected,
        pruned,
        fallback_reason,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
