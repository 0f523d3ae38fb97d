//! # Versions
//!
//! Version resolution and the per-version patch table.
//!
//! Components are always built from the latest baseline. Older versions are
//! expressed as an ordered list of named patches applied afterwards, so a
//! new version is a new table row rather than a branch in every constructor.

use super::{Component, ComponentName};
use crate::constants::{DEFAULT_VERSION, SUPPORTED_VERSIONS};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported cert-manager version '{0}' (supported: {supported})", supported = SUPPORTED_VERSIONS.join(", "))]
pub struct UnsupportedVersion(pub String);

/// A version string known to be in the supported set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupportedVersion(&'static str);

impl SupportedVersion {
    /// Resolve an optional requested version
    ///
    /// `None` resolves to the default version.
    pub fn resolve(requested: Option<&str>) -> Result<Self, UnsupportedVersion> {
        let wanted = requested.unwrap_or(DEFAULT_VERSION);
        SUPPORTED_VERSIONS
            .iter()
            .copied()
            .find(|v| *v == wanted)
            .map(SupportedVersion)
            .ok_or_else(|| UnsupportedVersion(wanted.to_string()))
    }

    #[must_use]
    pub fn default_version() -> Self {
        SupportedVersion(DEFAULT_VERSION)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A named transformation from the latest baseline towards an older version
#[derive(Clone, Copy)]
pub struct VersionPatch {
    pub name: &'static str,
    pub apply: fn(Component) -> Component,
}

impl fmt::Debug for VersionPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionPatch")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Versions that need patches on top of the baseline, with their patches in order
const PATCH_TABLE: &[(&str, &[VersionPatch])] = &[
    (
        "v1.4.4",
        &[
            VersionPatch {
                name: "leader-election-configmaps",
                apply: leader_election_configmaps,
            },
            VersionPatch {
                name: "no-csr-signing",
                apply: no_csr_signing,
            },
        ],
    ),
    (
        "v1.5.5",
        &[VersionPatch {
            name: "no-challenge-concurrency-flag",
            apply: no_challenge_concurrency_flag,
        }],
    ),
];

/// Patches to apply for a version, in order
#[must_use]
pub fn patches_for(version: &SupportedVersion) -> &'static [VersionPatch] {
    PATCH_TABLE
        .iter()
        .find(|(v, _)| *v == version.as_str())
        .map_or(&[], |(_, patches)| patches)
}

/// Apply every patch registered for `version`
pub(crate) fn apply_patches(component: Component, version: &SupportedVersion) -> Component {
    patches_for(version)
        .iter()
        .fold(component, |component, patch| (patch.apply)(component))
}

fn no_challenge_concurrency_flag(mut component: Component) -> Component {
    component.default_config = component
        .default_config
        .without_flag("max-concurrent-challenges");
    component
}

fn leader_election_configmaps(mut component: Component) -> Component {
    for role in component
        .roles
        .iter_mut()
        .filter(|r| r.name.ends_with(":leaderelection"))
    {
        role.rules.push(super::rule(
            &[""],
            &["configmaps"],
            &["get", "create", "update", "patch"],
        ));
    }
    component
}

fn no_csr_signing(mut component: Component) -> Component {
    if component.name == ComponentName::Controller {
        component
            .cluster_roles
            .retain(|r| !r.name.ends_with(":certificatesigningrequests"));
    }
    component
}
