//! # Labels
//!
//! Immutable label sets. Merging always produces a new value so label sets
//! handed to one reconciliation pass can never be changed by another.

use std::collections::BTreeMap;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const APP_LABEL: &str = "app";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels carried by every object the operator manages
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(MANAGED_BY_LABEL, crate::constants::OPERATOR_NAME)
            .with(PART_OF_LABEL, crate::constants::BASE_NAME)
    }

    /// Label keyed by the owning CR's name
    #[must_use]
    pub fn instance(cr_name: &str) -> Self {
        Self::new().with(INSTANCE_LABEL, cr_name)
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Union of two label sets; `other` wins on conflicting keys
    #[must_use]
    pub fn merged(&self, other: &Labels) -> Labels {
        let mut out = self.0.clone();
        out.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Labels(out)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a Kubernetes label selector string (`k=v,k2=v2`)
    #[must_use]
    pub fn to_selector(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    /// Whether every label in `self` is present with the same value in `map`
    #[must_use]
    pub fn is_subset_of(&self, map: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| map.get(k) == Some(v))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Labels {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Labels(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_does_not_touch_inputs() {
        let base = Labels::standard();
        let extra = Labels::instance("cluster");
        let merged = base.merged(&extra);

        assert_eq!(merged.get(INSTANCE_LABEL), Some("cluster"));
        assert!(base.get(INSTANCE_LABEL).is_none());
        assert_eq!(extra.get(MANAGED_BY_LABEL), None);
    }

    #[test]
    fn test_merged_other_wins() {
        let a = Labels::new().with("k", "a");
        let b = Labels::new().with("k", "b");
        assert_eq!(a.merged(&b).get("k"), Some("b"));
    }

    #[test]
    fn test_to_selector_is_sorted() {
        let labels: Labels = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(labels.to_selector(), "a=1,b=2");
    }
}
